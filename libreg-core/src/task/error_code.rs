use std::fmt;

/// Stable, machine-readable failure tokens attached to failed steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "httpRequestFailed")]
    HttpRequestFailed,
    #[serde(rename = "authDocumentUnusableLink")]
    AuthDocumentUnusableLink,
    #[serde(rename = "authDocumentParseFailed")]
    AuthDocumentParseFailed,
    #[serde(rename = "authDocumentUnusable")]
    AuthDocumentUnusable,
    #[serde(rename = "authDocumentNoStartURI")]
    AuthDocumentNoStartUri,
    #[serde(rename = "noApplicableSource")]
    NoApplicableSource,
    #[serde(rename = "unexpectedException")]
    UnexpectedException,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::HttpRequestFailed => "httpRequestFailed",
            ErrorCode::AuthDocumentUnusableLink => "authDocumentUnusableLink",
            ErrorCode::AuthDocumentParseFailed => "authDocumentParseFailed",
            ErrorCode::AuthDocumentUnusable => "authDocumentUnusable",
            ErrorCode::AuthDocumentNoStartUri => "authDocumentNoStartURI",
            ErrorCode::NoApplicableSource => "noApplicableSource",
            ErrorCode::UnexpectedException => "unexpectedException",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
