use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use libreg_resolve::{HttpConfig, ResolverConfig};
use url::Url;

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Description document (JSON or YAML); may be repeated.
    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,
    /// Production registry feed.
    #[arg(long)]
    pub feed: Option<Url>,
    /// QA registry feed, consulted only with --include-testing.
    #[arg(long)]
    pub qa_feed: Option<Url>,
    #[arg(long)]
    pub include_testing: bool,
    /// Catalog of the built-in fallback provider.
    #[arg(long, default_value = "http://localhost/")]
    pub default_catalog: Url,
}

impl SourceArgs {
    pub fn loading_source_count(&self) -> usize {
        self.files.len() + usize::from(self.feed.is_some())
    }
}

#[derive(Debug, Args, Clone)]
pub struct HttpArgs {
    /// Request timeout in milliseconds.
    #[arg(long, default_value_t = 30000)]
    pub timeout: u64,
    #[arg(long, default_value_t = 4_194_304)]
    pub max_response_bytes: usize,
    #[arg(long)]
    pub user_agent: Option<String>,
}

impl HttpArgs {
    pub fn to_config(&self) -> HttpConfig {
        let defaults = HttpConfig::default();
        HttpConfig {
            timeout: Duration::from_millis(self.timeout),
            max_response_bytes: self.max_response_bytes,
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct ResolverArgs {
    /// Fail when the authentication document parses with warnings.
    #[arg(long)]
    pub warnings_as_errors: bool,
    #[arg(long, default_value = "red")]
    pub default_main_color: String,
}

impl ResolverArgs {
    pub fn to_config(&self) -> ResolverConfig {
        ResolverConfig {
            warnings_as_errors: self.warnings_as_errors,
            default_main_color: self.default_main_color.clone(),
        }
    }
}
