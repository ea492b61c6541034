//! Pluggable provider sources.

mod feed;
mod file;

pub use feed::RegistryFeedSource;
pub use file::FileSource;

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use libreg_core::{
    AccountProvider, AccountProviderDescription, ErrorCode, PanicError, TaskRecorder, TaskResult,
};
use url::Url;

use crate::http::HttpError;

/// Progress callback: `(provider id, message)`, invoked before each step begins.
pub type Progress<'a> = &'a (dyn Fn(&Url, &str) + Send + Sync);

pub type SourceResult = Result<BTreeMap<Url, AccountProviderDescription>, SourceError>;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to fetch {url}: {source}")]
    Http {
        url: Url,
        #[source]
        source: HttpError,
    },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] libreg_core::ParseError),
    #[error("invalid catalog feed {url}: {message}")]
    Feed { url: Url, message: String },
    #[error(transparent)]
    Panicked(#[from] PanicError),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    pub text: String,
    pub include_testing: bool,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            include_testing: false,
        }
    }
}

/// A unit that can list provider descriptions and, optionally, resolve them.
///
/// Implementations report failures as values; they never panic by contract, although the
/// registry still contains a panic that escapes one.
#[async_trait]
pub trait AccountProviderSource: Send + Sync {
    /// Stable identifier used in logs and `SourceFailed` events.
    fn name(&self) -> &str;

    async fn load(&self, include_testing: bool) -> SourceResult;

    async fn query(&self, _query: &SearchQuery) -> SourceResult {
        Ok(BTreeMap::new())
    }

    /// Local predicate; must not perform I/O.
    fn can_resolve(&self, _description: &AccountProviderDescription) -> bool {
        false
    }

    async fn resolve(
        &self,
        progress: Progress<'_>,
        description: &AccountProviderDescription,
    ) -> TaskResult<AccountProvider> {
        let message = format!("{} cannot resolve descriptions", self.name());
        progress(&description.id, &message);
        let mut recorder = TaskRecorder::new();
        recorder.begin_new_step(message.clone());
        recorder.current_step_failed(message, ErrorCode::NoApplicableSource, None);
        recorder.finish_failure()
    }

    async fn clear(&self) {}
}

/// Keeps descriptions visible for the requested audience.
pub(crate) fn retain_audience(
    descriptions: &mut BTreeMap<Url, AccountProviderDescription>,
    include_testing: bool,
) {
    if !include_testing {
        descriptions.retain(|_, d| d.is_production);
    }
}

pub(crate) fn retain_matching(
    descriptions: &mut BTreeMap<Url, AccountProviderDescription>,
    query: &SearchQuery,
) {
    descriptions.retain(|_, d| d.matches_text(&query.text));
}
