use std::time::Duration;

use crate::errors::DebateError;

/// Base URL used when `DEBATE_BACKEND_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// A debate runs several model calls per agent, so the default is generous.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration for the debate service client.
#[derive(Clone, Debug)]
pub struct DebateClientConfig {
    /// Base address of the debate service; the endpoint path is appended.
    pub base_url: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Optional `User-Agent` header.
    pub user_agent: Option<String>,
}

impl Default for DebateClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl DebateClientConfig {
    /// Creates a config for the given base URL with default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: None,
        }
    }

    /// Builds a config from `DEBATE_BACKEND_URL` and `DEBATE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, DebateError> {
        let base_url = std::env::var("DEBATE_BACKEND_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(base_url);
        if let Ok(raw) = std::env::var("DEBATE_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                DebateError::Config(format!("invalid DEBATE_TIMEOUT_SECS {raw:?}: {e}"))
            })?;
            config = config.timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Overrides the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), DebateError> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(DebateError::Config("base_url must not be empty".into()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(DebateError::Config(format!(
                "base_url must start with http:// or https://, got {base:?}"
            )));
        }
        if self.timeout.is_zero() {
            return Err(DebateError::Config("timeout must be greater than 0".into()));
        }
        Ok(())
    }

    pub(crate) fn debate_url(&self) -> String {
        format!("{}/debate", self.base_url.trim().trim_end_matches('/'))
    }
}
