use std::collections::BTreeMap;

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum KeyboardInput {
    #[default]
    #[serde(rename = "Default")]
    Default,
    #[serde(rename = "Email address")]
    EmailAddress,
    #[serde(rename = "Number pad")]
    NumberPad,
    #[serde(rename = "No input")]
    NoInput,
}

impl KeyboardInput {
    /// Parses the keyboard names used by authentication documents, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" => Some(KeyboardInput::Default),
            "email address" => Some(KeyboardInput::EmailAddress),
            "number pad" => Some(KeyboardInput::NumberPad),
            "no input" => Some(KeyboardInput::NoInput),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicAuthentication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode_format: Option<String>,
    #[serde(default)]
    pub keyboard: KeyboardInput,
    #[serde(default)]
    pub password_keyboard: KeyboardInput,
    /// Zero means unbounded.
    #[serde(default)]
    pub password_maximum_length: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<Url>,
}

/// How a patron authenticates against a provider.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AccountProviderAuthentication {
    Basic(BasicAuthentication),
    #[serde(rename_all = "camelCase")]
    CoppaAgeGate {
        greater_equal_13: Url,
        under_13: Url,
    },
    Anonymous,
}

impl AccountProviderAuthentication {
    pub fn requires_credentials(&self) -> bool {
        matches!(self, AccountProviderAuthentication::Basic(_))
    }
}
