use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::config::HttpConfig;

pub const PROBLEM_REPORT_TYPE: &str = "application/api-problem+json";

/// RFC 7807 problem details returned by the server alongside an error status.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProblemReport {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum HttpError {
    #[error("timeout")]
    Timeout,
    #[error("connect/dns/tls error: {0}")]
    Network(String),
    #[error("response too large (>{max_bytes} bytes)")]
    ResponseTooLarge { max_bytes: usize },
    #[error("server returned status {status}{}", problem_suffix(.problem))]
    Status {
        status: u16,
        problem: Option<ProblemReport>,
    },
    #[error("http error: {0}")]
    Other(String),
}

impl HttpError {
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn problem(&self) -> Option<&ProblemReport> {
        match self {
            HttpError::Status { problem, .. } => problem.as_ref(),
            _ => None,
        }
    }
}

fn problem_suffix(problem: &Option<ProblemReport>) -> String {
    match problem.as_ref().and_then(|p| p.title.as_deref().or(p.detail.as_deref())) {
        Some(text) => format!(": {text}"),
        None => String::new(),
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetches `url`. Any non-2xx status is returned as [`HttpError::Status`].
    async fn get(&self, url: &Url) -> Result<HttpResponse, HttpError>;
}

pub struct ReqwestHttpClient {
    client: reqwest::Client,
    config: HttpConfig,
}

impl ReqwestHttpClient {
    pub fn new(config: HttpConfig) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| HttpError::Other(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &Url) -> Result<HttpResponse, HttpError> {
        debug!(url = %url, "http get");
        let mut resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = resp.status().as_u16();

        let mut headers = BTreeMap::new();
        for (k, v) in resp.headers().iter() {
            if let Ok(s) = v.to_str() {
                headers.insert(k.to_string(), s.to_string());
            }
        }

        // Read response body with size cap; stop as soon as the cap is passed.
        let max_bytes = self.config.max_response_bytes;
        if resp
            .content_length()
            .is_some_and(|announced| announced > max_bytes as u64)
        {
            return Err(HttpError::ResponseTooLarge { max_bytes });
        }
        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(map_reqwest_error)? {
            append_capped(&mut body, &chunk, max_bytes)?;
        }
        debug!(url = %url, status, bytes = body.len(), "http response");

        if !(200..300).contains(&status) {
            return Err(HttpError::Status {
                status,
                problem: parse_problem_report(&headers, &body),
            });
        }
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn append_capped(body: &mut Vec<u8>, chunk: &[u8], max_bytes: usize) -> Result<(), HttpError> {
    if body.len() + chunk.len() > max_bytes {
        return Err(HttpError::ResponseTooLarge { max_bytes });
    }
    body.extend_from_slice(chunk);
    Ok(())
}

/// Parses a problem report body when the response declares one.
pub fn parse_problem_report(
    headers: &BTreeMap<String, String>,
    body: &[u8],
) -> Option<ProblemReport> {
    let content_type = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
        .map(|(_, v)| v.as_str())?;
    if !content_type.starts_with(PROBLEM_REPORT_TYPE) {
        return None;
    }
    serde_json::from_slice(body).ok()
}

fn map_reqwest_error(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        return HttpError::Timeout;
    }
    if e.is_connect() || e.is_request() {
        return HttpError::Network(e.to_string());
    }
    HttpError::Other(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_capped_accepts_a_body_of_exactly_the_cap() {
        let mut body = Vec::new();
        append_capped(&mut body, b"abcd", 8).unwrap();
        append_capped(&mut body, b"efgh", 8).unwrap();
        assert_eq!(body, b"abcdefgh");
    }

    #[test]
    fn append_capped_rejects_the_chunk_that_crosses_the_cap() {
        let mut body = b"abcdef".to_vec();
        let err = append_capped(&mut body, b"ghi", 8).unwrap_err();
        assert!(matches!(err, HttpError::ResponseTooLarge { max_bytes: 8 }));
        assert_eq!(body.len(), 6);
    }

    #[test]
    fn problem_report_requires_the_problem_content_type() {
        let body = br#"{"title":"Not here","status":404}"#;
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        assert_eq!(parse_problem_report(&headers, body), None);

        headers.insert("content-type".to_string(), PROBLEM_REPORT_TYPE.to_string());
        let problem = parse_problem_report(&headers, body).unwrap();
        assert_eq!(problem.title.as_deref(), Some("Not here"));
        assert_eq!(problem.status, Some(404));
    }
}
