mod support;

use std::sync::Arc;

use libreg_core::types::rel;
use libreg_core::{AccountProviderAuthentication, ErrorCode, KeyboardInput, Link};
use libreg_resolve::auth_document::JsonAuthDocumentParser;
use libreg_resolve::resolver::RESOLVING_DESCRIPTION;
use libreg_resolve::{
    AccountProviderSource, HttpError, ProblemReport, ResolverConfig, StandardResolver,
};

use support::*;

fn resolver(http: MockHttp) -> StandardResolver {
    StandardResolver::new(
        Arc::new(http),
        Arc::new(JsonAuthDocumentParser),
        ResolverConfig::default(),
    )
}

fn alpha() -> libreg_core::AccountProviderDescription {
    with_auth_document(
        description("urn:uuid:alpha", "Alpha Library", at(1)),
        AUTH_DOC_URL,
    )
}

#[tokio::test]
async fn resolves_basic_authentication_document() {
    let resolver = resolver(MockHttp::new().with_body(AUTH_DOC_URL, FULL_AUTH_DOC));
    let progress = ProgressLog::default();
    let callback = progress.callback();

    let result = resolver.resolve(&callback, &alpha()).await;

    assert!(result.is_success(), "{:?}", result.steps());
    let provider = result.result().unwrap();
    assert_eq!(provider.id, url("urn:uuid:alpha"));
    assert_eq!(provider.display_name, "Alpha Library");
    assert_eq!(provider.subtitle.as_deref(), Some("Alpha's collection"));
    assert_eq!(provider.catalog_uri, url("https://alpha.example.com/catalog/start"));
    assert_eq!(provider.authentication_document_uri, Some(url(AUTH_DOC_URL)));
    assert!(provider.supports_reservations);
    assert_eq!(provider.main_color, "blue");
    assert_eq!(provider.support_email.as_deref(), Some("help@alpha.example.com"));
    assert_eq!(provider.eula, Some(url("https://alpha.example.com/eula")));
    assert_eq!(provider.license, Some(url("https://alpha.example.com/license")));
    assert_eq!(provider.privacy_policy, Some(url("https://alpha.example.com/privacy")));
    assert_eq!(provider.logo, Some(url("https://alpha.example.com/logo.png")));
    assert_eq!(provider.loans_uri, Some(url("https://alpha.example.com/loans")));
    assert_eq!(provider.card_creator_uri, Some(url("https://alpha.example.com/signup")));
    assert!(provider.supports_card_creator());
    assert_eq!(
        provider.patron_settings_uri,
        Some(url("https://alpha.example.com/patrons/me"))
    );
    assert_eq!(provider.annotations_uri, None);
    assert_eq!(provider.updated, at(1));

    match &provider.authentication {
        AccountProviderAuthentication::Basic(basic) => {
            assert_eq!(basic.description.as_deref(), Some("Library card"));
            assert_eq!(basic.labels.get("login").map(String::as_str), Some("Barcode"));
            assert_eq!(basic.barcode_format.as_deref(), Some("Codabar"));
            assert_eq!(basic.keyboard, KeyboardInput::NumberPad);
            assert_eq!(basic.password_keyboard, KeyboardInput::NumberPad);
            assert_eq!(basic.password_maximum_length, 4);
        }
        other => panic!("expected basic authentication, got {other:?}"),
    }
    assert_eq!(
        provider.authentication_alternatives,
        vec![AccountProviderAuthentication::Anonymous]
    );

    let steps = result.steps();
    assert_eq!(steps.len(), 7);
    assert_eq!(steps[0].description, RESOLVING_DESCRIPTION);
    assert!(steps.iter().all(|s| !s.resolution.is_failed()));
    assert_eq!(result.attributes().get("Provider").map(String::as_str), Some("urn:uuid:alpha"));
    assert_eq!(
        result.attributes().get("Authentication Document").map(String::as_str),
        Some(AUTH_DOC_URL)
    );

    // One progress call per step, in order, before it began.
    let descriptions: Vec<String> = steps.iter().map(|s| s.description.clone()).collect();
    assert_eq!(progress.messages(), descriptions);
}

#[tokio::test]
async fn description_without_auth_document_is_anonymous() {
    let http = MockHttp::new();
    let resolver = resolver(http);
    let beta = with_catalog(
        description("urn:uuid:beta", "Beta Library", at(2)),
        "https://beta.example.com/catalog",
    );

    let result = resolver.resolve(&no_progress, &beta).await;

    let provider = result.result().expect("resolution succeeds");
    assert_eq!(provider.authentication, AccountProviderAuthentication::Anonymous);
    assert_eq!(provider.catalog_uri, url("https://beta.example.com/catalog"));
    assert!(!provider.supports_reservations);
    assert_eq!(provider.main_color, "red");
    assert_eq!(provider.authentication_document_uri, None);
    // Framing step plus the four assembly steps; nothing was fetched.
    assert_eq!(result.steps().len(), 5);
}

#[tokio::test]
async fn templated_auth_document_link_is_unusable() {
    let resolver = resolver(MockHttp::new());
    let mut gamma = description("urn:uuid:gamma", "Gamma", at(1));
    gamma.links.push(
        serde_json::from_value::<Link>(serde_json::json!({
            "href": "https://gamma.example.com/auth{?lang}",
            "rel": rel::AUTHENTICATION_DOCUMENT,
            "templated": true
        }))
        .unwrap(),
    );

    let result = resolver.resolve(&no_progress, &gamma).await;

    assert!(!result.is_success());
    assert_eq!(result.last_error_code(), Some(ErrorCode::AuthDocumentUnusableLink));
}

#[tokio::test]
async fn http_failure_records_status_and_problem_report() {
    let problem = ProblemReport {
        problem_type: Some(
            "http://librarysimplified.org/terms/problem/remote-integration-failed".into(),
        ),
        title: Some("Remote failure".into()),
        status: Some(502),
        detail: Some("upstream unavailable".into()),
    };
    let resolver = resolver(MockHttp::new().with_error(
        AUTH_DOC_URL,
        HttpError::Status {
            status: 502,
            problem: Some(problem),
        },
    ));

    let result = resolver.resolve(&no_progress, &alpha()).await;

    assert!(!result.is_success());
    assert_eq!(result.last_error_code(), Some(ErrorCode::HttpRequestFailed));
    assert_eq!(result.attributes().get("HTTP Status").map(String::as_str), Some("502"));
    assert!(result.attributes()["Problem Report"].contains("upstream unavailable"));
    assert!(result.steps().last().resolution.exception().is_some());
    // Framing step and the fetch step only.
    assert_eq!(result.steps().len(), 2);
}

#[tokio::test]
async fn missing_auth_document_is_an_http_failure() {
    let resolver = resolver(MockHttp::new());

    let result = resolver.resolve(&no_progress, &alpha()).await;

    assert_eq!(result.last_error_code(), Some(ErrorCode::HttpRequestFailed));
    assert_eq!(result.attributes().get("HTTP Status").map(String::as_str), Some("404"));
}

#[tokio::test]
async fn unparseable_document_fails_parsing() {
    let resolver = resolver(MockHttp::new().with_body(AUTH_DOC_URL, "<html>not json</html>"));

    let result = resolver.resolve(&no_progress, &alpha()).await;

    assert_eq!(result.last_error_code(), Some(ErrorCode::AuthDocumentParseFailed));
    assert!(result.message().contains("invalid JSON"));
}

const DOC_WITH_WARNING: &str = r#"{
  "id": "https://alpha.example.com/auth",
  "title": "Alpha Library",
  "authentication": [{ "type": "http://librarysimplified.org/rel/auth/anonymous" }],
  "links": [
    { "rel": "start", "href": "https://alpha.example.com/start" },
    { "rel": "logo" }
  ]
}"#;

#[tokio::test]
async fn parser_warnings_are_tolerated_by_default() {
    let resolver = resolver(MockHttp::new().with_body(AUTH_DOC_URL, DOC_WITH_WARNING));

    let result = resolver.resolve(&no_progress, &alpha()).await;

    assert!(result.is_success());
    assert_eq!(result.result().unwrap().logo, None);
}

#[tokio::test]
async fn parser_warnings_fail_when_treated_as_errors() {
    let resolver = StandardResolver::new(
        Arc::new(MockHttp::new().with_body(AUTH_DOC_URL, DOC_WITH_WARNING)),
        Arc::new(JsonAuthDocumentParser),
        ResolverConfig {
            warnings_as_errors: true,
            ..ResolverConfig::default()
        },
    );

    let result = resolver.resolve(&no_progress, &alpha()).await;

    assert_eq!(result.last_error_code(), Some(ErrorCode::AuthDocumentParseFailed));
    assert!(result.message().contains("warnings"));
}

#[tokio::test]
async fn panicking_parser_is_reported_as_unexpected_exception() {
    let resolver = StandardResolver::new(
        Arc::new(MockHttp::new().with_body(AUTH_DOC_URL, FULL_AUTH_DOC)),
        Arc::new(PanickingParser),
        ResolverConfig::default(),
    );
    let progress = ProgressLog::default();
    let callback = progress.callback();

    let result = resolver.resolve(&callback, &alpha()).await;

    assert!(!result.is_success());
    assert_eq!(result.last_error_code(), Some(ErrorCode::UnexpectedException));
    let steps = result.steps();
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].description, RESOLVING_DESCRIPTION);
    assert!(!steps[0].resolution.is_failed());
    assert_eq!(
        steps[1].description,
        format!("Fetching authentication document {AUTH_DOC_URL}…")
    );
    assert!(!steps[1].resolution.is_failed());
    assert_eq!(steps[2].description, "Parsing authentication document…");
    assert_eq!(
        steps[2].resolution.error_code(),
        Some(ErrorCode::UnexpectedException)
    );
    let exception = steps.last().resolution.exception().unwrap();
    assert!(exception.to_string().contains("null pointer deep in parsing"));
    assert_eq!(result.attributes()["Authentication Document"], AUTH_DOC_URL);

    let announced: Vec<String> = steps.iter().map(|s| s.description.clone()).collect();
    assert_eq!(progress.messages(), announced);
}

#[tokio::test]
async fn document_without_start_link_and_description_without_catalog_fails() {
    let doc = r#"{
      "id": "https://alpha.example.com/auth",
      "title": "Alpha Library",
      "authentication": [{ "type": "http://librarysimplified.org/rel/auth/anonymous" }],
      "links": []
    }"#;
    let resolver = resolver(MockHttp::new().with_body(AUTH_DOC_URL, doc));

    let result = resolver.resolve(&no_progress, &alpha()).await;

    assert_eq!(result.last_error_code(), Some(ErrorCode::AuthDocumentNoStartUri));
}

#[tokio::test]
async fn catalog_link_stands_in_for_missing_start_link() {
    let doc = r#"{
      "id": "https://alpha.example.com/auth",
      "title": "Alpha Library",
      "authentication": [{ "type": "http://librarysimplified.org/rel/auth/anonymous" }]
    }"#;
    let resolver = resolver(MockHttp::new().with_body(AUTH_DOC_URL, doc));
    let described = with_catalog(alpha(), "https://alpha.example.com/opds");

    let result = resolver.resolve(&no_progress, &described).await;

    assert_eq!(
        result.result().unwrap().catalog_uri,
        url("https://alpha.example.com/opds")
    );
}

#[tokio::test]
async fn coppa_gate_without_links_is_unusable() {
    let doc = r#"{
      "id": "https://alpha.example.com/auth",
      "title": "Alpha Library",
      "authentication": [{
        "type": "http://librarysimplified.org/terms/authentication/gate/coppa",
        "links": [
          { "rel": "http://librarysimplified.org/terms/rel/authentication/restriction-met", "href": "https://alpha.example.com/13plus" }
        ]
      }],
      "links": [{ "rel": "start", "href": "https://alpha.example.com/start" }]
    }"#;
    let resolver = resolver(MockHttp::new().with_body(AUTH_DOC_URL, doc));

    let result = resolver.resolve(&no_progress, &alpha()).await;

    assert_eq!(result.last_error_code(), Some(ErrorCode::AuthDocumentUnusable));
}

#[tokio::test]
async fn document_offering_no_supported_method_is_unusable() {
    let doc = r#"{
      "id": "https://alpha.example.com/auth",
      "title": "Alpha Library",
      "authentication": [{ "type": "http://opds-spec.org/auth/oauth/implicit" }],
      "links": [{ "rel": "start", "href": "https://alpha.example.com/start" }]
    }"#;
    let resolver = resolver(MockHttp::new().with_body(AUTH_DOC_URL, doc));

    let result = resolver.resolve(&no_progress, &alpha()).await;

    assert_eq!(result.last_error_code(), Some(ErrorCode::AuthDocumentUnusable));
    assert!(result.message().contains("oauth"));
}

#[test]
fn claims_descriptions_with_auth_document_or_web_catalog() {
    let resolver = resolver(MockHttp::new());

    assert!(resolver.can_resolve(&alpha()));
    assert!(resolver.can_resolve(&with_catalog(
        description("urn:uuid:beta", "Beta", at(1)),
        "https://beta.example.com/catalog"
    )));
    assert!(!resolver.can_resolve(&with_catalog(
        description("urn:uuid:beta", "Beta", at(1)),
        "file:///srv/catalog.xml"
    )));
    assert!(!resolver.can_resolve(&description("urn:uuid:bare", "Bare", at(1))));
}
