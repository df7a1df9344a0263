//! Client configuration.

/// Default base URL for the ViaggiaTreno REST API.
pub const DEFAULT_BASE_URL: &str =
    "http://www.viaggiatreno.it/infomobilita/resteasy/viaggiatreno";

/// Train categories requested from the segment endpoints.
pub const DEFAULT_CATEGORIES: &str = "ES*,IC,EXP,EC,EN,REG";

/// Default maximum number of per-segment requests in flight.
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration shared by the HTTP gateway and the traffic client.
///
/// Built once at start-up and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,
    /// Category filter sent to the segment list and segment detail endpoints.
    pub categories: String,
    /// Maximum concurrent per-segment requests during train aggregation.
    pub max_concurrent: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl TrafficConfig {
    /// Create a config pointing at the production service.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            categories: DEFAULT_CATEGORIES.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom base URL (for testing or a proxy).
    ///
    /// A trailing slash is dropped so paths can always start with `/`.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Set the category filter.
    pub fn with_categories(mut self, categories: impl Into<String>) -> Self {
        self.categories = categories.into();
        self
    }

    /// Set maximum concurrent requests. Zero is raised to one.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self::new()
    }
}
