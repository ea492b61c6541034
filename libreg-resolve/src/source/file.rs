use std::path::PathBuf;

use async_trait::async_trait;
use libreg_core::{parse_descriptions_str, DocumentFormat};
use tracing::debug;

use super::{
    retain_audience, retain_matching, AccountProviderSource, SearchQuery, SourceError,
    SourceResult,
};

/// Descriptions read from a static JSON or YAML document on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    name: String,
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: format!("file:{}", path.display()),
            path,
        }
    }
}

#[async_trait]
impl AccountProviderSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self, include_testing: bool) -> SourceResult {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        let parsed = parse_descriptions_str(&content, DocumentFormat::Auto)?;
        let mut descriptions = parsed.descriptions;
        retain_audience(&mut descriptions, include_testing);
        debug!(
            source = %self.name,
            format = ?parsed.format,
            count = descriptions.len(),
            "loaded description document"
        );
        Ok(descriptions)
    }

    async fn query(&self, query: &SearchQuery) -> SourceResult {
        let mut descriptions = self.load(query.include_testing).await?;
        retain_matching(&mut descriptions, query);
        Ok(descriptions)
    }
}
