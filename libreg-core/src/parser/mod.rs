use std::collections::BTreeMap;

use url::Url;

use crate::error::ParseError;
use crate::types::AccountProviderDescription;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Auto,
}

#[derive(Debug, Clone)]
pub struct ParsedDescriptions {
    pub descriptions: BTreeMap<Url, AccountProviderDescription>,
    pub format: DocumentFormat,
}

/// Parses a document holding a list of provider descriptions.
pub fn parse_descriptions_str(
    input: &str,
    format: DocumentFormat,
) -> Result<ParsedDescriptions, ParseError> {
    let (list, format): (Vec<AccountProviderDescription>, DocumentFormat) = match format {
        DocumentFormat::Json => (serde_json::from_str(input)?, format),
        DocumentFormat::Yaml => (serde_yaml::from_str(input)?, format),
        DocumentFormat::Auto => parse_auto(input)?,
    };
    Ok(ParsedDescriptions {
        descriptions: index_by_id(list)?,
        format,
    })
}

fn parse_auto(
    input: &str,
) -> Result<(Vec<AccountProviderDescription>, DocumentFormat), ParseError> {
    // JSON always starts with `{` or `[` after trimming.
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return match serde_json::from_str(input) {
            Ok(list) => Ok((list, DocumentFormat::Json)),
            Err(e) => match serde_yaml::from_str(input) {
                Ok(list) => Ok((list, DocumentFormat::Yaml)),
                Err(_) => Err(ParseError::Json(e)),
            },
        };
    }

    match serde_yaml::from_str(input) {
        Ok(list) => Ok((list, DocumentFormat::Yaml)),
        Err(e) => match serde_json::from_str(input) {
            Ok(list) => Ok((list, DocumentFormat::Json)),
            Err(_) => Err(ParseError::Yaml(e)),
        },
    }
}

fn index_by_id(
    list: Vec<AccountProviderDescription>,
) -> Result<BTreeMap<Url, AccountProviderDescription>, ParseError> {
    let mut out = BTreeMap::new();
    for description in list {
        let id = description.id.clone();
        if out.insert(id.clone(), description).is_some() {
            return Err(ParseError::DuplicateId(id));
        }
    }
    Ok(out)
}
