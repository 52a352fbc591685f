/// Errors produced while negotiating a debate with the remote service.
///
/// `Validation` and `Busy` are raised locally by the controller before any
/// request is sent. `Transport`, `Network` and `Parse` come from a single
/// round trip and are terminal for that attempt; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DebateError {
    /// Invalid client configuration (base URL, HTTP client construction).
    #[error("config error: {0}")]
    Config(String),
    /// User input rejected before reaching the network.
    #[error("{0}")]
    Validation(String),
    /// Service answered with a non-2xx status.
    #[error("backend error {status}: {body}")]
    Transport { status: u16, body: String },
    /// Request never produced a response (connect, timeout, reset).
    #[error("network error: {0}")]
    Network(String),
    /// A 2xx response whose body is not a recognizable debate payload.
    #[error("invalid response body: {0}")]
    Parse(String),
    /// A request is already in flight for this session.
    #[error("a debate request is already in flight")]
    Busy,
}

impl DebateError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn transport(status: u16, body: impl Into<String>) -> Self {
        Self::Transport {
            status,
            body: body.into(),
        }
    }

    /// Returns the HTTP status for `Transport` errors.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for errors raised locally without contacting the service.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Busy | Self::Config(_))
    }
}

impl From<serde_json::Error> for DebateError {
    fn from(value: serde_json::Error) -> Self {
        DebateError::Parse(value.to_string())
    }
}
