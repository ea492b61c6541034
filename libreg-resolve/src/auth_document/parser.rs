use std::collections::BTreeMap;
use std::fmt;

use libreg_core::{KeyboardInput, Link};
use serde_json::{Map as JsonMap, Value};
use url::Url;

use super::{AuthenticationDocument, AuthenticationObject, Features, InputDescription};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub source: Url,
    pub message: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrorEntry {
    pub source: Url,
    pub message: String,
}

impl fmt::Display for ParseErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseResult<T> {
    Success {
        document: T,
        warnings: Vec<ParseWarning>,
    },
    Failure {
        warnings: Vec<ParseWarning>,
        errors: Vec<ParseErrorEntry>,
    },
}

impl<T> ParseResult<T> {
    pub fn warnings(&self) -> &[ParseWarning] {
        match self {
            ParseResult::Success { warnings, .. } | ParseResult::Failure { warnings, .. } => {
                warnings
            }
        }
    }
}

pub trait AuthDocumentParser: Send + Sync {
    fn parse(&self, uri: &Url, bytes: &[u8]) -> ParseResult<AuthenticationDocument>;
}

/// Parses JSON authentication documents.
///
/// Structural problems (not an object, missing `id` or `title`) are errors. Problems confined to
/// a single link, input or authentication entry are warnings and the offending item is dropped
/// or defaulted.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAuthDocumentParser;

impl AuthDocumentParser for JsonAuthDocumentParser {
    fn parse(&self, uri: &Url, bytes: &[u8]) -> ParseResult<AuthenticationDocument> {
        let mut ctx = Context::new(uri);
        let value: Value = match serde_json::from_slice(bytes) {
            Ok(v) => v,
            Err(e) => {
                ctx.error(format!("invalid JSON: {e}"));
                return ctx.fail();
            }
        };
        let Value::Object(root) = value else {
            ctx.error("document is not a JSON object");
            return ctx.fail();
        };

        let id = match root.get("id").and_then(Value::as_str) {
            Some(raw) => match Url::parse(raw) {
                Ok(u) => Some(u),
                Err(e) => {
                    ctx.error(format!("invalid id {raw:?}: {e}"));
                    None
                }
            },
            None => {
                ctx.error("missing required string field 'id'");
                None
            }
        };
        let title = root.get("title").and_then(Value::as_str).map(str::to_string);
        if title.is_none() {
            ctx.error("missing required string field 'title'");
        }

        let authentication = match root.get("authentication") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| ctx.authentication_object(i, item))
                .collect(),
            Some(_) => {
                ctx.warn("'authentication' is not an array; ignoring it");
                Vec::new()
            }
        };
        let links = ctx.links("links", root.get("links"));
        let features = ctx.features(root.get("features"));
        let main_color = root
            .get("color_scheme")
            .and_then(Value::as_str)
            .map(str::to_string);

        match (id, title) {
            (Some(id), Some(title)) if ctx.errors.is_empty() => ParseResult::Success {
                document: AuthenticationDocument {
                    id,
                    title,
                    description: root
                        .get("description")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    authentication,
                    links,
                    features,
                    main_color,
                },
                warnings: ctx.warnings,
            },
            _ => ctx.fail(),
        }
    }
}

struct Context<'a> {
    source: &'a Url,
    warnings: Vec<ParseWarning>,
    errors: Vec<ParseErrorEntry>,
}

impl<'a> Context<'a> {
    fn new(source: &'a Url) -> Self {
        Self {
            source,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(ParseWarning {
            source: self.source.clone(),
            message: message.into(),
        });
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(ParseErrorEntry {
            source: self.source.clone(),
            message: message.into(),
        });
    }

    fn fail<T>(self) -> ParseResult<T> {
        ParseResult::Failure {
            warnings: self.warnings,
            errors: self.errors,
        }
    }

    fn links(&mut self, path: &str, value: Option<&Value>) -> Vec<Link> {
        let items = match value {
            None | Some(Value::Null) => return Vec::new(),
            Some(Value::Array(items)) => items,
            Some(_) => {
                self.warn(format!("{path}: not an array; ignoring it"));
                return Vec::new();
            }
        };
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| match serde_json::from_value::<Link>(item.clone()) {
                Ok(link) => Some(link),
                Err(e) => {
                    self.warn(format!("{path}[{i}]: unusable link: {e}"));
                    None
                }
            })
            .collect()
    }

    fn features(&mut self, value: Option<&Value>) -> Features {
        let obj = match value {
            None | Some(Value::Null) => return Features::default(),
            Some(Value::Object(obj)) => obj,
            Some(_) => {
                self.warn("features: not an object; ignoring it");
                return Features::default();
            }
        };
        Features {
            enabled: self.string_list("features.enabled", obj.get("enabled")).into_iter().collect(),
            disabled: self
                .string_list("features.disabled", obj.get("disabled"))
                .into_iter()
                .collect(),
        }
    }

    fn string_list(&mut self, path: &str, value: Option<&Value>) -> Vec<String> {
        match value {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(i, v)| match v.as_str() {
                    Some(s) => Some(s.to_string()),
                    None => {
                        self.warn(format!("{path}[{i}]: expected a string"));
                        None
                    }
                })
                .collect(),
            Some(_) => {
                self.warn(format!("{path}: not an array; ignoring it"));
                Vec::new()
            }
        }
    }

    fn authentication_object(
        &mut self,
        index: usize,
        value: &Value,
    ) -> Option<AuthenticationObject> {
        let path = format!("authentication[{index}]");
        let Some(obj) = value.as_object() else {
            self.warn(format!("{path}: not an object; skipping it"));
            return None;
        };
        let Some(type_uri) = obj.get("type").and_then(Value::as_str) else {
            self.warn(format!("{path}: missing 'type'; skipping it"));
            return None;
        };

        Some(AuthenticationObject {
            type_uri: type_uri.to_string(),
            description: obj.get("description").and_then(Value::as_str).map(str::to_string),
            labels: self.labels(&path, obj),
            inputs: self.inputs(&path, obj),
            links: self.links(&format!("{path}.links"), obj.get("links")),
        })
    }

    fn labels(&mut self, path: &str, obj: &JsonMap<String, Value>) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        let Some(labels) = obj.get("labels").and_then(Value::as_object) else {
            return out;
        };
        for (k, v) in labels {
            match v.as_str() {
                Some(s) => {
                    out.insert(k.clone(), s.to_string());
                }
                None => self.warn(format!("{path}.labels.{k}: expected a string")),
            }
        }
        out
    }

    fn inputs(
        &mut self,
        path: &str,
        obj: &JsonMap<String, Value>,
    ) -> BTreeMap<String, InputDescription> {
        let mut out = BTreeMap::new();
        let Some(inputs) = obj.get("inputs").and_then(Value::as_object) else {
            return out;
        };
        for (name, input) in inputs {
            let input_path = format!("{path}.inputs.{name}");
            let Some(input) = input.as_object() else {
                self.warn(format!("{input_path}: not an object; skipping it"));
                continue;
            };
            let keyboard = match input.get("keyboard").and_then(Value::as_str) {
                None => KeyboardInput::Default,
                Some(raw) => KeyboardInput::parse(raw).unwrap_or_else(|| {
                    self.warn(format!("{input_path}.keyboard: unrecognized keyboard {raw:?}"));
                    KeyboardInput::Default
                }),
            };
            let maximum_length = match input.get("maximum_length") {
                None | Some(Value::Null) => 0,
                Some(v) => match v.as_u64().and_then(|n| u32::try_from(n).ok()) {
                    Some(n) => n,
                    None => {
                        self.warn(format!("{input_path}.maximum_length: not a valid length"));
                        0
                    }
                },
            };
            out.insert(
                name.clone(),
                InputDescription {
                    keyboard,
                    maximum_length,
                    barcode_format: input
                        .get("barcode_format")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                },
            );
        }
        out
    }
}
