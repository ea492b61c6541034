#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use libreg_core::types::rel;
use libreg_core::{
    AccountProvider, AccountProviderAuthentication, AccountProviderDescription, Link, TaskRecorder,
    TaskResult,
};
use libreg_resolve::auth_document::{AuthDocumentParser, AuthenticationDocument, ParseResult};
use libreg_resolve::{
    AccountProviderSource, HttpClient, HttpError, HttpResponse, Progress, SearchQuery,
    SourceError, SourceResult,
};
use url::Url;

pub const AUTH_DOC_URL: &str = "https://alpha.example.com/auth";

pub const FULL_AUTH_DOC: &str = r#"{
  "id": "https://alpha.example.com/auth",
  "title": "Alpha Library",
  "description": "Alpha's collection",
  "color_scheme": "blue",
  "features": {
    "enabled": ["https://librarysimplified.org/rel/policy/reservations"],
    "disabled": []
  },
  "authentication": [
    {
      "type": "http://opds-spec.org/auth/basic",
      "description": "Library card",
      "labels": { "login": "Barcode", "password": "PIN" },
      "inputs": {
        "login": { "keyboard": "Number pad", "maximum_length": 14, "barcode_format": "Codabar" },
        "password": { "keyboard": "Number pad", "maximum_length": 4 }
      },
      "links": []
    },
    { "type": "http://librarysimplified.org/rel/auth/anonymous" }
  ],
  "links": [
    { "rel": "start", "href": "https://alpha.example.com/catalog/start", "type": "application/atom+xml" },
    { "rel": "terms-of-service", "href": "https://alpha.example.com/eula" },
    { "rel": "privacy-policy", "href": "https://alpha.example.com/privacy" },
    { "rel": "license", "href": "https://alpha.example.com/license" },
    { "rel": "logo", "href": "https://alpha.example.com/logo.png" },
    { "rel": "help", "href": "mailto:help@alpha.example.com" },
    { "rel": "register", "href": "https://alpha.example.com/signup" },
    { "rel": "http://opds-spec.org/shelf", "href": "https://alpha.example.com/loans" },
    { "rel": "http://librarysimplified.org/terms/rel/user-profile", "href": "https://alpha.example.com/patrons/me" }
  ]
}"#;

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

pub fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
}

pub fn description(id: &str, title: &str, updated: DateTime<Utc>) -> AccountProviderDescription {
    AccountProviderDescription {
        id: url(id),
        title: title.to_string(),
        description: None,
        updated,
        links: vec![],
        images: vec![],
        is_automatic: false,
        is_production: true,
    }
}

pub fn with_auth_document(
    mut d: AccountProviderDescription,
    href: &str,
) -> AccountProviderDescription {
    d.links.push(Link::basic(url(href), rel::AUTHENTICATION_DOCUMENT));
    d
}

pub fn with_catalog(mut d: AccountProviderDescription, href: &str) -> AccountProviderDescription {
    d.links.push(Link::basic(url(href), rel::CATALOG));
    d
}

pub fn provider(id: &str, title: &str, updated: DateTime<Utc>) -> AccountProvider {
    AccountProvider {
        id: url(id),
        display_name: title.to_string(),
        subtitle: None,
        logo: None,
        authentication: AccountProviderAuthentication::Anonymous,
        authentication_alternatives: vec![],
        supports_reservations: false,
        loans_uri: None,
        card_creator_uri: None,
        authentication_document_uri: None,
        catalog_uri: url("https://default.example.com/catalog"),
        support_email: None,
        eula: None,
        license: None,
        privacy_policy: None,
        main_color: "red".to_string(),
        patron_settings_uri: None,
        annotations_uri: None,
        is_production: true,
        add_automatically: false,
        updated,
    }
}

pub fn no_progress(_: &Url, _: &str) {}

/// Collects progress messages.
#[derive(Default)]
pub struct ProgressLog {
    messages: Mutex<Vec<String>>,
}

impl ProgressLog {
    pub fn callback(&self) -> impl Fn(&Url, &str) + Send + Sync + '_ {
        move |_: &Url, message: &str| self.messages.lock().unwrap().push(message.to_string())
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

/// Serves canned responses; unknown URLs answer 404.
#[derive(Default)]
pub struct MockHttp {
    responses: Mutex<HashMap<Url, Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<Url>>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(self, target: &str, body: &str) -> Self {
        self.responses.lock().unwrap().insert(
            url(target),
            Ok(HttpResponse {
                status: 200,
                headers: BTreeMap::new(),
                body: body.as_bytes().to_vec(),
            }),
        );
        self
    }

    pub fn with_error(self, target: &str, error: HttpError) -> Self {
        self.responses.lock().unwrap().insert(url(target), Err(error));
        self
    }

    pub fn requests(&self) -> Vec<Url> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for MockHttp {
    async fn get(&self, target: &Url) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(target.clone());
        self.responses
            .lock()
            .unwrap()
            .get(target)
            .cloned()
            .unwrap_or(Err(HttpError::Status {
                status: 404,
                problem: None,
            }))
    }
}

pub struct PanickingParser;

impl AuthDocumentParser for PanickingParser {
    fn parse(&self, _uri: &Url, _bytes: &[u8]) -> ParseResult<AuthenticationDocument> {
        panic!("null pointer deep in parsing")
    }
}

/// A scripted source for registry tests.
pub struct StubSource {
    pub name: String,
    pub descriptions: Vec<AccountProviderDescription>,
    pub fail_load: bool,
    pub claims: bool,
    pub resolves_to: Option<AccountProvider>,
    pub panic_on_resolve: bool,
    pub panic_on_claim: bool,
    pub resolve_calls: AtomicUsize,
    pub clear_calls: AtomicUsize,
}

impl StubSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            descriptions: vec![],
            fail_load: false,
            claims: false,
            resolves_to: None,
            panic_on_resolve: false,
            panic_on_claim: false,
            resolve_calls: AtomicUsize::new(0),
            clear_calls: AtomicUsize::new(0),
        }
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl AccountProviderSource for StubSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self, _include_testing: bool) -> SourceResult {
        if self.fail_load {
            return Err(SourceError::Feed {
                url: url("https://broken.example.com/feed"),
                message: "unreachable".to_string(),
            });
        }
        Ok(self
            .descriptions
            .iter()
            .map(|d| (d.id.clone(), d.clone()))
            .collect())
    }

    async fn query(&self, query: &SearchQuery) -> SourceResult {
        let mut all = self.load(query.include_testing).await?;
        all.retain(|_, d| d.matches_text(&query.text));
        Ok(all)
    }

    fn can_resolve(&self, _description: &AccountProviderDescription) -> bool {
        if self.panic_on_claim {
            panic!("claim check exploded");
        }
        self.claims
    }

    async fn resolve(
        &self,
        progress: Progress<'_>,
        description: &AccountProviderDescription,
    ) -> TaskResult<AccountProvider> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_resolve {
            panic!("source exploded");
        }
        let mut recorder = TaskRecorder::new();
        progress(&description.id, "stub step");
        recorder.begin_new_step("stub step");
        recorder.add_attribute("Source", self.name.clone());
        match &self.resolves_to {
            Some(p) => recorder.finish_success(p.clone()),
            None => {
                recorder.current_step_failed(
                    "stub failure",
                    libreg_core::ErrorCode::HttpRequestFailed,
                    None,
                );
                recorder.finish_failure()
            }
        }
    }

    async fn clear(&self) {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
    }
}
