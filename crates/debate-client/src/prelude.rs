//! Common imports for typical client usage.
pub use crate::{
    Completion, DebateClient, DebateClientConfig, DebateError, DebateOutcome, DebateRequest,
    DebateResponse, DebateService, PendingDebate, PhaseKind, PromptSuggestion, Session,
    SessionController, SessionPhase,
};
