use chrono::{DateTime, Utc};
use url::Url;

use crate::types::link::{find_href, rel};
use crate::types::{Link, Timestamped};

/// Cheaply obtained summary of a provider.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProviderDescription {
    pub id: Url,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub images: Vec<Link>,
    #[serde(default)]
    pub is_automatic: bool,
    #[serde(default = "default_true")]
    pub is_production: bool,
}

fn default_true() -> bool {
    true
}

impl AccountProviderDescription {
    pub fn authentication_document_link(&self) -> Option<&Link> {
        self.links
            .iter()
            .find(|l| l.has_rel(rel::AUTHENTICATION_DOCUMENT))
    }

    pub fn catalog_link(&self) -> Option<&Link> {
        self.links.iter().find(|l| l.has_rel(rel::CATALOG))
    }

    pub fn catalog_uri(&self) -> Option<&Url> {
        self.catalog_link().and_then(Link::href)
    }

    pub fn logo_uri(&self) -> Option<&Url> {
        find_href(&self.images, rel::THUMBNAIL)
    }

    /// Case-insensitive match against the title and description.
    pub fn matches_text(&self, text: &str) -> bool {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

impl Timestamped for AccountProviderDescription {
    fn id(&self) -> &Url {
        &self.id
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}
