use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub max_response_bytes: usize,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_response_bytes: 4 * 1024 * 1024,
            user_agent: concat!("libreg/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Treat parser warnings as a failed parse.
    pub warnings_as_errors: bool,
    /// Used when the authentication document does not name a color scheme.
    pub default_main_color: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            warnings_as_errors: false,
            default_main_color: "red".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Capacity of the event channel; slower subscribers observe a lag instead of blocking.
    pub event_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            event_capacity: 256,
        }
    }
}
