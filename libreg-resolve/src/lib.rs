#![forbid(unsafe_code)]

//! Provider sources, the standard authentication-document resolver, and the provider registry.

pub mod auth_document;
pub mod config;
pub mod http;
pub mod registry;
pub mod resolver;
pub mod source;

pub use crate::config::{HttpConfig, RegistryConfig, ResolverConfig};
pub use crate::http::{HttpClient, HttpError, HttpResponse, ProblemReport, ReqwestHttpClient};
pub use crate::registry::{AccountProviderRegistry, RegistryEvent, RegistryStatus};
pub use crate::resolver::StandardResolver;
pub use crate::source::{
    AccountProviderSource, FileSource, Progress, RegistryFeedSource, SearchQuery, SourceError,
    SourceResult,
};
