use std::sync::Arc;

use chrono::{DateTime, Utc};
use libreg_core::{AccountProvider, AccountProviderAuthentication};
use libreg_resolve::auth_document::JsonAuthDocumentParser;
use libreg_resolve::{
    AccountProviderRegistry, AccountProviderSource, FileSource, HttpClient, RegistryConfig,
    RegistryFeedSource, ReqwestHttpClient, ResolverConfig, StandardResolver,
};
use url::Url;

use crate::args::{HttpArgs, SourceArgs};

pub const DEFAULT_PROVIDER_ID: &str = "urn:libreg:default";

/// Builds a registry over the file and feed sources named on the command line.
///
/// The standard resolver is always registered last, so a description is resolved through its
/// authentication document unless an earlier source claims it.
pub fn build_registry(
    source: &SourceArgs,
    http: &HttpArgs,
    resolver: ResolverConfig,
) -> Result<AccountProviderRegistry, String> {
    if source.loading_source_count() == 0 {
        return Err("no provider sources configured; pass --file or --feed".to_string());
    }
    let client: Arc<dyn HttpClient> = Arc::new(
        ReqwestHttpClient::new(http.to_config())
            .map_err(|e| format!("failed to create HTTP client: {e}"))?,
    );

    let mut sources: Vec<Arc<dyn AccountProviderSource>> = Vec::new();
    for path in &source.files {
        sources.push(Arc::new(FileSource::new(path)));
    }
    if let Some(feed) = &source.feed {
        sources.push(Arc::new(RegistryFeedSource::new(
            Arc::clone(&client),
            feed.clone(),
            source.qa_feed.clone(),
        )));
    }
    sources.push(Arc::new(StandardResolver::new(
        client,
        Arc::new(JsonAuthDocumentParser),
        resolver,
    )));

    Ok(AccountProviderRegistry::new(
        default_provider(&source.default_catalog)?,
        sources,
        RegistryConfig::default(),
    ))
}

pub fn is_default_provider(id: &Url) -> bool {
    id.as_str() == DEFAULT_PROVIDER_ID
}

fn default_provider(catalog: &Url) -> Result<AccountProvider, String> {
    let id = Url::parse(DEFAULT_PROVIDER_ID).map_err(|e| format!("invalid default id: {e}"))?;
    Ok(AccountProvider {
        id,
        display_name: "Default Collection".to_string(),
        subtitle: None,
        logo: None,
        authentication: AccountProviderAuthentication::Anonymous,
        authentication_alternatives: Vec::new(),
        supports_reservations: false,
        loans_uri: None,
        card_creator_uri: None,
        authentication_document_uri: None,
        catalog_uri: catalog.clone(),
        support_email: None,
        eula: None,
        license: None,
        privacy_policy: None,
        main_color: "red".to_string(),
        patron_settings_uri: None,
        annotations_uri: None,
        is_production: true,
        add_automatically: false,
        // Anything a source reports for this id replaces it.
        updated: DateTime::<Utc>::MIN_UTC,
    })
}
