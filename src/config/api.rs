/// Client behaviour for the currency-rate HTTP API.
#[derive(Debug, Clone)]
pub struct RateApiConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub retries: u32,
    pub backoff_ms: u64,
}

impl Default for RateApiConfig {
    fn default() -> Self {
        Self {
            base_url: RATE_API.endpoints.base_url.to_string(),
            timeout_ms: RATE_API.client.timeout_ms,
            retries: RATE_API.client.retries,
            backoff_ms: RATE_API.client.backoff_ms,
        }
    }
}

impl RateApiConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

pub struct Endpoints {
    /// Package root. A version tag (`@YYYY-MM-DD` or `@latest`) is appended per request.
    pub base_url: &'static str,
    pub catalog_tag: &'static str,
    pub api_version: &'static str,
}

pub struct ClientDefaults {
    pub timeout_ms: u64,
    pub retries: u32,
    pub backoff_ms: u64,
    pub user_agent: &'static str,
}

pub struct ApiSettings {
    pub endpoints: Endpoints,
    pub client: ClientDefaults,
}

pub const RATE_API: ApiSettings = ApiSettings {
    endpoints: Endpoints {
        base_url: "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api",
        catalog_tag: "latest",
        api_version: "v1",
    },
    client: ClientDefaults {
        timeout_ms: 5000,
        retries: 2,
        backoff_ms: 500,
        user_agent: "fx-window",
    },
};
