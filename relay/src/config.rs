use std::time::Duration;

use common::utils::{load_dotenv, optional_var, parse_var, required_var};

const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 55;

#[derive(Debug, Clone)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,

    // Model service, without the `/predict` route
    pub upstream_api_url: String,
    /// Upper bound on one upstream exchange; sized above the host's cold-start time.
    pub upstream_timeout: Duration,

    // Platform key required from callers, if any
    pub api_key: Option<String>,
}

impl Config {
    pub fn new(upstream_api_url: impl Into<String>) -> Self {
        Config {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            upstream_api_url: upstream_api_url.into(),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            api_key: None,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        load_dotenv();

        let server_host = optional_var("RELAY_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let server_port = parse_var("RELAY_PORT", 8080u16)?;
        let upstream_api_url = required_var("UPSTREAM_API_URL")?;
        let upstream_timeout = Duration::from_secs(parse_var(
            "UPSTREAM_TIMEOUT_SECS",
            DEFAULT_UPSTREAM_TIMEOUT_SECS,
        )?);
        let api_key = optional_var("RELAY_API_KEY");

        Ok(Config {
            server_host,
            server_port,
            upstream_api_url,
            upstream_timeout,
            api_key,
        })
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn predict_url(&self) -> String {
        format!("{}/predict", self.upstream_api_url.trim_end_matches('/'))
    }
}
