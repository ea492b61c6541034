use libreg_core::types::rel;
use libreg_core::{AccountProviderAuthentication, BasicAuthentication};
use tracing::warn;

use crate::auth_document::{
    AuthenticationObject, AUTH_TYPE_ANONYMOUS, AUTH_TYPE_BASIC, AUTH_TYPE_COPPA,
    REL_COPPA_RESTRICTION_MET, REL_COPPA_RESTRICTION_NOT_MET,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AuthenticationError {
    /// No entry of a type this client understands.
    NoUsableMethod { offered: Vec<String> },
    /// A COPPA age gate without both of its redirect links.
    MalformedCoppa { missing: &'static str },
}

impl AuthenticationError {
    pub(crate) fn message(&self) -> String {
        match self {
            AuthenticationError::NoUsableMethod { offered } if offered.is_empty() => {
                "The authentication document lists no authentication methods".to_string()
            }
            AuthenticationError::NoUsableMethod { offered } => format!(
                "None of the offered authentication methods are supported: {}",
                offered.join(", ")
            ),
            AuthenticationError::MalformedCoppa { missing } => {
                format!("The COPPA age gate is missing its '{missing}' link")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DerivedAuthentication {
    pub(crate) primary: AccountProviderAuthentication,
    pub(crate) alternatives: Vec<AccountProviderAuthentication>,
}

/// Picks the first recognized entry as the primary method.
///
/// Entries of unknown types are skipped. Recognized entries after the primary become
/// alternatives; a malformed alternative is dropped rather than failing the derivation.
pub(crate) fn derive_authentication(
    entries: &[AuthenticationObject],
) -> Result<DerivedAuthentication, AuthenticationError> {
    let mut recognized = entries.iter().filter(|e| is_recognized(&e.type_uri));

    let Some(first) = recognized.next() else {
        return Err(AuthenticationError::NoUsableMethod {
            offered: entries.iter().map(|e| e.type_uri.clone()).collect(),
        });
    };
    let primary = convert(first)?;

    let mut alternatives = Vec::new();
    for entry in recognized {
        match convert(entry) {
            Ok(auth) => alternatives.push(auth),
            Err(e) => warn!(
                auth_type = %entry.type_uri,
                reason = %e.message(),
                "skipping unusable alternative authentication method"
            ),
        }
    }

    Ok(DerivedAuthentication {
        primary,
        alternatives,
    })
}

fn is_recognized(type_uri: &str) -> bool {
    matches!(type_uri, AUTH_TYPE_BASIC | AUTH_TYPE_COPPA | AUTH_TYPE_ANONYMOUS)
}

fn convert(
    entry: &AuthenticationObject,
) -> Result<AccountProviderAuthentication, AuthenticationError> {
    match entry.type_uri.as_str() {
        AUTH_TYPE_BASIC => Ok(AccountProviderAuthentication::Basic(basic(entry))),
        AUTH_TYPE_COPPA => {
            let greater_equal_13 = entry
                .link(REL_COPPA_RESTRICTION_MET)
                .ok_or(AuthenticationError::MalformedCoppa {
                    missing: REL_COPPA_RESTRICTION_MET,
                })?;
            let under_13 = entry
                .link(REL_COPPA_RESTRICTION_NOT_MET)
                .ok_or(AuthenticationError::MalformedCoppa {
                    missing: REL_COPPA_RESTRICTION_NOT_MET,
                })?;
            Ok(AccountProviderAuthentication::CoppaAgeGate {
                greater_equal_13: greater_equal_13.clone(),
                under_13: under_13.clone(),
            })
        }
        AUTH_TYPE_ANONYMOUS => Ok(AccountProviderAuthentication::Anonymous),
        other => Err(AuthenticationError::NoUsableMethod {
            offered: vec![other.to_string()],
        }),
    }
}

fn basic(entry: &AuthenticationObject) -> BasicAuthentication {
    let login = entry.inputs.get("login").cloned().unwrap_or_default();
    let password = entry.inputs.get("password").cloned().unwrap_or_default();
    BasicAuthentication {
        description: entry.description.clone(),
        labels: entry.labels.clone(),
        barcode_format: login.barcode_format,
        keyboard: login.keyboard,
        password_keyboard: password.keyboard,
        password_maximum_length: password.maximum_length,
        logo_uri: entry.link(rel::LOGO).cloned(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use libreg_core::{KeyboardInput, Link};
    use url::Url;

    use super::*;
    use crate::auth_document::InputDescription;

    fn entry(type_uri: &str, links: Vec<Link>) -> AuthenticationObject {
        AuthenticationObject {
            type_uri: type_uri.to_string(),
            description: None,
            labels: BTreeMap::new(),
            inputs: BTreeMap::new(),
            links,
        }
    }

    fn link(href: &str, rel: &str) -> Link {
        Link::basic(Url::parse(href).unwrap(), rel)
    }

    #[test]
    fn first_recognized_entry_wins() {
        let entries = vec![
            entry("http://example.com/unknown", vec![]),
            entry(AUTH_TYPE_ANONYMOUS, vec![]),
            entry(AUTH_TYPE_BASIC, vec![]),
        ];
        let derived = derive_authentication(&entries).unwrap();
        assert_eq!(derived.primary, AccountProviderAuthentication::Anonymous);
        assert_eq!(derived.alternatives.len(), 1);
        assert!(derived.alternatives[0].requires_credentials());
    }

    #[test]
    fn empty_list_is_unusable() {
        let err = derive_authentication(&[]).unwrap_err();
        assert_eq!(err, AuthenticationError::NoUsableMethod { offered: vec![] });
    }

    #[test]
    fn unrecognized_only_is_unusable() {
        let entries = vec![entry("http://example.com/saml", vec![])];
        match derive_authentication(&entries).unwrap_err() {
            AuthenticationError::NoUsableMethod { offered } => {
                assert_eq!(offered, vec!["http://example.com/saml".to_string()])
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn coppa_requires_both_links() {
        let entries = vec![entry(
            AUTH_TYPE_COPPA,
            vec![link("https://example.com/kids", REL_COPPA_RESTRICTION_NOT_MET)],
        )];
        assert_eq!(
            derive_authentication(&entries).unwrap_err(),
            AuthenticationError::MalformedCoppa {
                missing: REL_COPPA_RESTRICTION_MET
            }
        );
    }

    #[test]
    fn coppa_with_both_links_is_accepted() {
        let entries = vec![entry(
            AUTH_TYPE_COPPA,
            vec![
                link("https://example.com/kids", REL_COPPA_RESTRICTION_NOT_MET),
                link("https://example.com/all", REL_COPPA_RESTRICTION_MET),
            ],
        )];
        match derive_authentication(&entries).unwrap().primary {
            AccountProviderAuthentication::CoppaAgeGate {
                greater_equal_13,
                under_13,
            } => {
                assert_eq!(greater_equal_13.as_str(), "https://example.com/all");
                assert_eq!(under_13.as_str(), "https://example.com/kids");
            }
            other => panic!("unexpected authentication {other:?}"),
        }
    }

    #[test]
    fn malformed_alternatives_are_dropped() {
        let entries = vec![
            entry(AUTH_TYPE_BASIC, vec![]),
            entry(AUTH_TYPE_COPPA, vec![]),
        ];
        let derived = derive_authentication(&entries).unwrap();
        assert!(derived.primary.requires_credentials());
        assert!(derived.alternatives.is_empty());
    }

    #[test]
    fn basic_reads_inputs_and_labels() {
        let mut e = entry(
            AUTH_TYPE_BASIC,
            vec![link("https://example.com/logo.png", "logo")],
        );
        e.labels.insert("login".to_string(), "Barcode".to_string());
        e.inputs.insert(
            "login".to_string(),
            InputDescription {
                keyboard: KeyboardInput::NumberPad,
                maximum_length: 14,
                barcode_format: Some("Codabar".to_string()),
            },
        );
        e.inputs.insert(
            "password".to_string(),
            InputDescription {
                keyboard: KeyboardInput::NumberPad,
                maximum_length: 4,
                barcode_format: None,
            },
        );

        let basic = basic(&e);
        assert_eq!(basic.keyboard, KeyboardInput::NumberPad);
        assert_eq!(basic.barcode_format.as_deref(), Some("Codabar"));
        assert_eq!(basic.password_maximum_length, 4);
        assert_eq!(basic.labels.get("login").map(String::as_str), Some("Barcode"));
        assert_eq!(
            basic.logo_uri.as_ref().map(Url::as_str),
            Some("https://example.com/logo.png")
        );
    }
}
