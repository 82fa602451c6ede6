use std::time::Duration;

use common::utils::{load_dotenv, optional_var, parse_var, required_var};

/// Attempts per prediction, counting the first one.
pub const MAX_ATTEMPTS: u32 = 2;

// Longer than the relay's upstream bound, so a cold start shows up as the relay's 504.
const DEFAULT_TIMEOUT_SECS: u64 = 70;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full URL of the relay's prediction route.
    pub relay_url: String,
    /// Sent as both `apikey` and bearer token when set.
    pub api_key: Option<String>,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(relay_url: impl Into<String>) -> Self {
        ClientConfig {
            relay_url: relay_url.into(),
            api_key: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        load_dotenv();

        let relay_url = required_var("PREDICT_PROXY_URL")?;
        let api_key = optional_var("PREDICT_PROXY_API_KEY");
        let request_timeout =
            Duration::from_secs(parse_var("PREDICT_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?);

        Ok(ClientConfig {
            relay_url,
            api_key,
            request_timeout,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
