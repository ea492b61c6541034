//! Authentication documents: the remote description of how to authenticate against a catalog.

mod parser;

pub use parser::{
    AuthDocumentParser, JsonAuthDocumentParser, ParseErrorEntry, ParseResult, ParseWarning,
};

use std::collections::{BTreeMap, BTreeSet};

use libreg_core::types::{find_href, rel};
use libreg_core::{KeyboardInput, Link};
use url::Url;

pub const AUTH_TYPE_BASIC: &str = "http://opds-spec.org/auth/basic";
pub const AUTH_TYPE_COPPA: &str = "http://librarysimplified.org/terms/authentication/gate/coppa";
pub const AUTH_TYPE_ANONYMOUS: &str = "http://librarysimplified.org/rel/auth/anonymous";

/// Link to follow when the patron is 13 or older.
pub const REL_COPPA_RESTRICTION_MET: &str =
    "http://librarysimplified.org/terms/rel/authentication/restriction-met";
/// Link to follow when the patron is under 13.
pub const REL_COPPA_RESTRICTION_NOT_MET: &str =
    "http://librarysimplified.org/terms/rel/authentication/restriction-not-met";

pub const FEATURE_RESERVATIONS: &str = "https://librarysimplified.org/rel/policy/reservations";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Features {
    pub enabled: BTreeSet<String>,
    pub disabled: BTreeSet<String>,
}

impl Features {
    pub fn is_enabled(&self, feature: &str) -> bool {
        self.enabled.contains(feature) && !self.disabled.contains(feature)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputDescription {
    pub keyboard: KeyboardInput,
    /// Zero means unbounded.
    pub maximum_length: u32,
    pub barcode_format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationObject {
    pub type_uri: String,
    pub description: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub inputs: BTreeMap<String, InputDescription>,
    pub links: Vec<Link>,
}

impl AuthenticationObject {
    pub fn link(&self, relation: &str) -> Option<&Url> {
        find_href(&self.links, relation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationDocument {
    pub id: Url,
    pub title: String,
    pub description: Option<String>,
    pub authentication: Vec<AuthenticationObject>,
    pub links: Vec<Link>,
    pub features: Features,
    pub main_color: Option<String>,
}

impl AuthenticationDocument {
    pub fn link(&self, relation: &str) -> Option<&Url> {
        find_href(&self.links, relation)
    }

    pub fn start_uri(&self) -> Option<&Url> {
        self.link(rel::START)
    }

    pub fn logo_uri(&self) -> Option<&Url> {
        self.link(rel::LOGO)
    }

    pub fn eula_uri(&self) -> Option<&Url> {
        self.link(rel::TERMS_OF_SERVICE)
    }

    pub fn license_uri(&self) -> Option<&Url> {
        self.link(rel::LICENSE)
    }

    pub fn privacy_policy_uri(&self) -> Option<&Url> {
        self.link(rel::PRIVACY_POLICY)
    }

    pub fn support_uri(&self) -> Option<&Url> {
        self.link(rel::HELP)
    }

    pub fn card_creator_uri(&self) -> Option<&Url> {
        self.link(rel::REGISTER)
    }

    pub fn loans_uri(&self) -> Option<&Url> {
        self.link(rel::SHELF)
    }

    pub fn patron_settings_uri(&self) -> Option<&Url> {
        self.link(rel::USER_PROFILE)
    }

    /// The address of the first `mailto:` help link.
    pub fn support_email(&self) -> Option<String> {
        self.links
            .iter()
            .filter(|l| l.has_rel(rel::HELP))
            .filter_map(Link::href)
            .find(|u| u.scheme() == "mailto")
            .map(|u| u.path().to_string())
    }
}
