use chrono::{DateTime, Utc};
use url::Url;

use crate::types::link::rel;
use crate::types::{AccountProviderAuthentication, AccountProviderDescription, Link, Timestamped};

/// A fully resolved provider.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProvider {
    pub id: Url,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<Url>,
    pub authentication: AccountProviderAuthentication,
    #[serde(default)]
    pub authentication_alternatives: Vec<AccountProviderAuthentication>,
    #[serde(default)]
    pub supports_reservations: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loans_uri: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_creator_uri: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_document_uri: Option<Url>,
    pub catalog_uri: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eula: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_policy: Option<Url>,
    pub main_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patron_settings_uri: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations_uri: Option<Url>,
    #[serde(default)]
    pub is_production: bool,
    #[serde(default)]
    pub add_automatically: bool,
    pub updated: DateTime<Utc>,
}

impl AccountProvider {
    pub fn supports_card_creator(&self) -> bool {
        self.card_creator_uri.is_some()
    }

    pub fn to_description(&self) -> AccountProviderDescription {
        let mut links = vec![Link::basic(self.catalog_uri.clone(), rel::CATALOG)];
        if let Some(uri) = &self.authentication_document_uri {
            links.push(Link::basic(uri.clone(), rel::AUTHENTICATION_DOCUMENT));
        }
        let images = self
            .logo
            .iter()
            .map(|uri| Link::basic(uri.clone(), rel::THUMBNAIL))
            .collect();

        AccountProviderDescription {
            id: self.id.clone(),
            title: self.display_name.clone(),
            description: self.subtitle.clone(),
            updated: self.updated,
            links,
            images,
            is_automatic: self.add_automatically,
            is_production: self.is_production,
        }
    }
}

impl Timestamped for AccountProvider {
    fn id(&self) -> &Url {
        &self.id
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}
