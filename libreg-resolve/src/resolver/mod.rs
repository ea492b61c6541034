//! Resolution of provider descriptions through their authentication documents.

mod authentication;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use libreg_core::{
    AccountProvider, AccountProviderAuthentication, AccountProviderDescription, ErrorCode, Link,
    TaskException, TaskRecorder, TaskResult,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::auth_document::{
    AuthDocumentParser, AuthenticationDocument, ParseResult, FEATURE_RESERVATIONS,
};
use crate::config::ResolverConfig;
use crate::http::HttpClient;
use crate::source::{AccountProviderSource, Progress, SourceResult};

use self::authentication::{derive_authentication, DerivedAuthentication};

pub const RESOLVING_DESCRIPTION: &str = "Resolving description…";

/// Resolves descriptions by fetching and interpreting their authentication documents.
///
/// It contributes no descriptions of its own. It claims any description that links an
/// authentication document or a catalog.
pub struct StandardResolver {
    http: Arc<dyn HttpClient>,
    parser: Arc<dyn AuthDocumentParser>,
    config: ResolverConfig,
}

impl StandardResolver {
    pub fn new(
        http: Arc<dyn HttpClient>,
        parser: Arc<dyn AuthDocumentParser>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            http,
            parser,
            config,
        }
    }

    /// Runs every phase against the shared recorder. `None` means a phase recorded a failure.
    async fn run_phases(
        &self,
        recorder: &mut TaskRecorder,
        progress: Progress<'_>,
        description: &AccountProviderDescription,
    ) -> Option<AccountProvider> {
        match description.authentication_document_link() {
            Some(link) => {
                let document = self
                    .fetch_auth_document(recorder, progress, description, link)
                    .await?;
                self.build_provider(recorder, progress, description, Some(&document))
            }
            None => {
                debug!(provider = %description.id, "no authentication document linked");
                self.build_provider(recorder, progress, description, None)
            }
        }
    }

    async fn fetch_auth_document(
        &self,
        recorder: &mut TaskRecorder,
        progress: Progress<'_>,
        description: &AccountProviderDescription,
        link: &Link,
    ) -> Option<AuthenticationDocument> {
        let id = &description.id;
        let message = format!("Fetching authentication document {}…", link.href_str());
        progress(id, &message);
        recorder.begin_new_step(message);
        recorder.add_attribute("Authentication Document", link.href_str());

        let Some(target) = link.href() else {
            recorder.current_step_failed(
                format!(
                    "The authentication document link {} is templated and cannot be fetched",
                    link.href_str()
                ),
                ErrorCode::AuthDocumentUnusableLink,
                None,
            );
            return None;
        };

        let response = match self.http.get(target).await {
            Ok(response) => response,
            Err(e) => {
                if let Some(status) = e.status() {
                    recorder.add_attribute("HTTP Status", status.to_string());
                }
                if let Some(problem) = e.problem() {
                    if let Ok(json) = serde_json::to_string(problem) {
                        recorder.add_attribute("Problem Report", json);
                    }
                }
                warn!(
                    provider = %id,
                    url = %target,
                    error = %e,
                    "authentication document fetch failed"
                );
                recorder.current_step_failed(
                    format!("Failed to fetch the authentication document {target}: {e}"),
                    ErrorCode::HttpRequestFailed,
                    Some(TaskException::new(e)),
                );
                return None;
            }
        };
        recorder.current_step_succeeded(format!(
            "Fetched the authentication document ({} bytes)",
            response.body.len()
        ));

        let message = "Parsing authentication document…";
        progress(id, message);
        recorder.begin_new_step(message);
        match self.parser.parse(target, &response.body) {
            ParseResult::Success { document, warnings } => {
                if warnings.is_empty() {
                    recorder.current_step_succeeded("Parsed the authentication document");
                    return Some(document);
                }
                let listed = join_display(&warnings);
                if self.config.warnings_as_errors {
                    recorder.current_step_failed(
                        format!("The authentication document produced warnings: {listed}"),
                        ErrorCode::AuthDocumentParseFailed,
                        None,
                    );
                    return None;
                }
                debug!(
                    provider = %id,
                    warnings = %listed,
                    "authentication document parsed with warnings"
                );
                recorder.current_step_succeeded(format!(
                    "Parsed the authentication document with {} warning(s)",
                    warnings.len()
                ));
                Some(document)
            }
            ParseResult::Failure { warnings, errors } => {
                let mut message = format!(
                    "Failed to parse the authentication document: {}",
                    join_display(&errors)
                );
                if !warnings.is_empty() {
                    message.push_str(&format!(" (warnings: {})", join_display(&warnings)));
                }
                recorder.current_step_failed(message, ErrorCode::AuthDocumentParseFailed, None);
                None
            }
        }
    }

    fn build_provider(
        &self,
        recorder: &mut TaskRecorder,
        progress: Progress<'_>,
        description: &AccountProviderDescription,
        document: Option<&AuthenticationDocument>,
    ) -> Option<AccountProvider> {
        let id = &description.id;

        let message = "Checking reservation support…";
        progress(id, message);
        recorder.begin_new_step(message);
        let supports_reservations =
            document.is_some_and(|d| d.features.is_enabled(FEATURE_RESERVATIONS));
        recorder.current_step_succeeded(if supports_reservations {
            "Reservations are supported"
        } else {
            "Reservations are not supported"
        });

        let message = "Determining authentication method…";
        progress(id, message);
        recorder.begin_new_step(message);
        let authentication = match document {
            None => DerivedAuthentication {
                primary: AccountProviderAuthentication::Anonymous,
                alternatives: Vec::new(),
            },
            Some(document) => match derive_authentication(&document.authentication) {
                Ok(derived) => derived,
                Err(e) => {
                    recorder.current_step_failed(
                        e.message(),
                        ErrorCode::AuthDocumentUnusable,
                        None,
                    );
                    return None;
                }
            },
        };
        recorder.current_step_succeeded(match &authentication.primary {
            AccountProviderAuthentication::Basic(_) => "Authentication requires credentials",
            AccountProviderAuthentication::CoppaAgeGate { .. } => {
                "Authentication is a COPPA age gate"
            }
            AccountProviderAuthentication::Anonymous => "No authentication is required",
        });

        let message = "Determining catalog URI…";
        progress(id, message);
        recorder.begin_new_step(message);
        let catalog_uri = match document
            .and_then(AuthenticationDocument::start_uri)
            .or_else(|| description.catalog_uri())
        {
            Some(uri) => uri.clone(),
            None => {
                recorder.current_step_failed(
                    "No start URI was provided by the authentication document or the description",
                    ErrorCode::AuthDocumentNoStartUri,
                    None,
                );
                return None;
            }
        };
        recorder.current_step_succeeded(format!("Catalog URI is {catalog_uri}"));

        let message = "Assembling provider…";
        progress(id, message);
        recorder.begin_new_step(message);
        let link = |f: fn(&AuthenticationDocument) -> Option<&Url>| document.and_then(f).cloned();
        let provider = AccountProvider {
            id: id.clone(),
            display_name: description.title.clone(),
            subtitle: description
                .description
                .clone()
                .or_else(|| document.and_then(|d| d.description.clone())),
            logo: link(AuthenticationDocument::logo_uri)
                .or_else(|| description.logo_uri().cloned()),
            authentication: authentication.primary,
            authentication_alternatives: authentication.alternatives,
            supports_reservations,
            loans_uri: link(AuthenticationDocument::loans_uri),
            card_creator_uri: link(AuthenticationDocument::card_creator_uri),
            authentication_document_uri: description
                .authentication_document_link()
                .and_then(Link::href)
                .cloned(),
            catalog_uri,
            support_email: document.and_then(AuthenticationDocument::support_email),
            eula: link(AuthenticationDocument::eula_uri),
            license: link(AuthenticationDocument::license_uri),
            privacy_policy: link(AuthenticationDocument::privacy_policy_uri),
            main_color: document
                .and_then(|d| d.main_color.clone())
                .unwrap_or_else(|| self.config.default_main_color.clone()),
            patron_settings_uri: link(AuthenticationDocument::patron_settings_uri),
            // Only discoverable after the patron signs in.
            annotations_uri: None,
            is_production: description.is_production,
            add_automatically: description.is_automatic,
            updated: description.updated,
        };
        recorder.current_step_succeeded(format!("Resolved provider {}", provider.display_name));
        Some(provider)
    }
}

#[async_trait]
impl AccountProviderSource for StandardResolver {
    fn name(&self) -> &str {
        "standard-resolver"
    }

    async fn load(&self, _include_testing: bool) -> SourceResult {
        Ok(Default::default())
    }

    fn can_resolve(&self, description: &AccountProviderDescription) -> bool {
        description.authentication_document_link().is_some()
            || description
                .catalog_uri()
                .is_some_and(|u| matches!(u.scheme(), "http" | "https"))
    }

    async fn resolve(
        &self,
        progress: Progress<'_>,
        description: &AccountProviderDescription,
    ) -> TaskResult<AccountProvider> {
        let id = &description.id;
        info!(provider = %id, title = %description.title, "resolving description");

        let mut recorder = TaskRecorder::new();
        progress(id, RESOLVING_DESCRIPTION);
        recorder.begin_new_step(RESOLVING_DESCRIPTION);
        recorder.add_attribute("Provider", id.as_str());
        recorder.add_attribute("Provider Title", description.title.as_str());

        let outcome = AssertUnwindSafe(self.run_phases(&mut recorder, progress, description))
            .catch_unwind()
            .await;

        let result = match outcome {
            Ok(Some(provider)) => recorder.finish_success(provider),
            Ok(None) => recorder.finish_failure(),
            Err(payload) => {
                let exception = TaskException::from_panic(payload);
                warn!(provider = %id, error = %exception, "resolution panicked");
                recorder.current_step_failed_appending(
                    format!("Unexpected error while resolving the description: {exception}"),
                    ErrorCode::UnexpectedException,
                    exception,
                );
                recorder.finish_failure()
            }
        };
        info!(
            provider = %id,
            succeeded = result.is_success(),
            steps = result.steps().len(),
            "resolution finished"
        );
        result
    }
}

fn join_display<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
