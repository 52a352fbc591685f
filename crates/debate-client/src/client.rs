use tracing::{debug, warn};

use crate::config::DebateClientConfig;
use crate::errors::DebateError;
use crate::model::{DebateRequest, DebateResponse};
use crate::service::DebateService;

/// HTTP client for the debate endpoint.
pub struct DebateClient {
    client: reqwest::Client,
    config: DebateClientConfig,
}

impl DebateClient {
    /// Creates a client from explicit configuration.
    pub fn new(config: DebateClientConfig) -> Result<Self, DebateError> {
        config.validate()?;
        let mut builder = reqwest::Client::builder().timeout(config.timeout);
        if let Some(user_agent) = config.user_agent.as_deref() {
            builder = builder.user_agent(user_agent);
        }
        let client = builder
            .build()
            .map_err(|e| DebateError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Creates a client using `DEBATE_BACKEND_URL` / `DEBATE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, DebateError> {
        Self::new(DebateClientConfig::from_env()?)
    }

    pub fn config(&self) -> &DebateClientConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl DebateService for DebateClient {
    async fn request_debate(&self, request: DebateRequest) -> Result<DebateResponse, DebateError> {
        let url = self.config.debate_url();
        debug!(
            url = %url,
            chat_id = request.session_id.as_deref().unwrap_or("-"),
            use_improved = request.use_improved_prompt,
            "sending debate request"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DebateError::Network(format!("debate request to {url} failed: {e}")))?;
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if (200..300).contains(&status) => {
                return Err(DebateError::Network(format!(
                    "failed to read debate response body: {e}"
                )));
            }
            Err(_) => "<unreadable body>".to_string(),
        };
        classify_response(status, &body)
    }
}

/// Maps a raw HTTP status and body onto the success variants or an error.
pub fn classify_response(status: u16, body: &str) -> Result<DebateResponse, DebateError> {
    if !(200..300).contains(&status) {
        warn!(status, "debate service returned an error status");
        return Err(DebateError::transport(status, body));
    }
    let response = DebateResponse::from_json_str(body)?;
    debug!(status, kind = response.kind(), "classified debate response");
    Ok(response)
}
