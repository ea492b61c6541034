use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libreg_core::{AccountProviderDescription, Link};
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use super::{
    retain_audience, retain_matching, AccountProviderSource, SearchQuery, SourceError,
    SourceResult,
};
use crate::http::HttpClient;

/// Descriptions published by a library registry as an OPDS 2 catalog feed.
///
/// The production feed is always fetched. When testing libraries are requested and a QA feed is
/// configured, entries that only appear in the QA feed are added as non-production. Fetched
/// feeds are cached until [`AccountProviderSource::clear`].
pub struct RegistryFeedSource {
    http: Arc<dyn HttpClient>,
    production_feed: Url,
    qa_feed: Option<Url>,
    cache: Mutex<Option<CachedFeed>>,
}

struct CachedFeed {
    includes_testing: bool,
    descriptions: BTreeMap<Url, AccountProviderDescription>,
}

impl RegistryFeedSource {
    pub fn new(http: Arc<dyn HttpClient>, production_feed: Url, qa_feed: Option<Url>) -> Self {
        Self {
            http,
            production_feed,
            qa_feed,
            cache: Mutex::new(None),
        }
    }

    async fn fetch_feed(
        &self,
        url: &Url,
        is_production: bool,
    ) -> Result<BTreeMap<Url, AccountProviderDescription>, SourceError> {
        let resp = self
            .http
            .get(url)
            .await
            .map_err(|source| SourceError::Http {
                url: url.clone(),
                source,
            })?;
        let feed: RawFeed = serde_json::from_slice(&resp.body).map_err(|e| SourceError::Feed {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let mut out = BTreeMap::new();
        for catalog in feed.catalogs {
            let description = catalog.into_description(is_production);
            out.insert(description.id.clone(), description);
        }
        info!(feed = %url, count = out.len(), "fetched registry feed");
        Ok(out)
    }

    async fn fetch_all(
        &self,
        include_testing: bool,
    ) -> Result<BTreeMap<Url, AccountProviderDescription>, SourceError> {
        let mut descriptions = self.fetch_feed(&self.production_feed, true).await?;
        if include_testing {
            if let Some(qa_feed) = &self.qa_feed {
                for (id, description) in self.fetch_feed(qa_feed, false).await? {
                    descriptions.entry(id).or_insert(description);
                }
            }
        }
        Ok(descriptions)
    }
}

#[async_trait]
impl AccountProviderSource for RegistryFeedSource {
    fn name(&self) -> &str {
        self.production_feed.as_str()
    }

    async fn load(&self, include_testing: bool) -> SourceResult {
        let mut cache = self.cache.lock().await;
        let cached = cache
            .as_ref()
            .filter(|c| c.includes_testing || !include_testing)
            .map(|c| c.descriptions.clone());

        let mut descriptions = match cached {
            Some(descriptions) => {
                debug!(source = %self.name(), "using cached registry feed");
                descriptions
            }
            None => {
                let fetched = self.fetch_all(include_testing).await?;
                *cache = Some(CachedFeed {
                    includes_testing: include_testing,
                    descriptions: fetched.clone(),
                });
                fetched
            }
        };
        retain_audience(&mut descriptions, include_testing);
        Ok(descriptions)
    }

    async fn query(&self, query: &SearchQuery) -> SourceResult {
        let mut descriptions = self.load(query.include_testing).await?;
        retain_matching(&mut descriptions, query);
        Ok(descriptions)
    }

    async fn clear(&self) {
        *self.cache.lock().await = None;
    }
}

#[derive(serde::Deserialize)]
struct RawFeed {
    #[serde(default)]
    catalogs: Vec<RawCatalog>,
}

#[derive(serde::Deserialize)]
struct RawCatalog {
    metadata: RawMetadata,
    #[serde(default)]
    links: Vec<Link>,
    #[serde(default)]
    images: Vec<Link>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetadata {
    id: Url,
    title: String,
    #[serde(default)]
    description: Option<String>,
    updated: DateTime<Utc>,
    #[serde(default)]
    is_automatic: bool,
}

impl RawCatalog {
    fn into_description(self, is_production: bool) -> AccountProviderDescription {
        AccountProviderDescription {
            id: self.metadata.id,
            title: self.metadata.title,
            description: self.metadata.description,
            updated: self.metadata.updated,
            links: self.links,
            images: self.images,
            is_automatic: self.metadata.is_automatic,
            is_production,
        }
    }
}
