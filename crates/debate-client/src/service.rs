use crate::errors::DebateError;
use crate::model::{DebateRequest, DebateResponse};

/// One round trip against the debate service.
///
/// Implementations hold no per-session state and never retry: each call
/// yields exactly one response variant or exactly one error.
#[async_trait::async_trait]
pub trait DebateService: Send + Sync {
    async fn request_debate(&self, request: DebateRequest) -> Result<DebateResponse, DebateError>;
}

#[async_trait::async_trait]
impl<T: DebateService + ?Sized> DebateService for std::sync::Arc<T> {
    async fn request_debate(&self, request: DebateRequest) -> Result<DebateResponse, DebateError> {
        (**self).request_debate(request).await
    }
}
