use std::fmt;

use crate::model::{DebateOutcome, PromptSuggestion};

/// Active state of a session, together with the data that state owns.
///
/// A suggestion only exists while awaiting confirmation, an outcome only
/// while completed and an error message only while failed.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SessionPhase {
    #[default]
    Idle,
    /// A request is in flight; `generation` identifies it.
    Pending { generation: u64 },
    AwaitingConfirmation(PromptSuggestion),
    Completed(DebateOutcome),
    Failed(String),
}

/// Data-free tag for `SessionPhase`, handy for logs and comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    Idle,
    Pending,
    AwaitingConfirmation,
    Completed,
    Failed,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

impl SessionPhase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Self::Idle => PhaseKind::Idle,
            Self::Pending { .. } => PhaseKind::Pending,
            Self::AwaitingConfirmation(_) => PhaseKind::AwaitingConfirmation,
            Self::Completed(_) => PhaseKind::Completed,
            Self::Failed(_) => PhaseKind::Failed,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// Client-held record of one conversation with the debate service.
///
/// Lives in memory only. The remote chat id is set from the first completed
/// debate and then echoed on every request until the session is reset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub(crate) question: String,
    pub(crate) session_id: Option<String>,
    pub(crate) phase: SessionPhase,
    pub(crate) notice: Option<String>,
}

impl Session {
    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    /// Local validation message; the phase is left untouched when one is set.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn pending_suggestion(&self) -> Option<&PromptSuggestion> {
        match &self.phase {
            SessionPhase::AwaitingConfirmation(suggestion) => Some(suggestion),
            _ => None,
        }
    }

    pub fn last_result(&self) -> Option<&DebateOutcome> {
        match &self.phase {
            SessionPhase::Completed(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        match &self.phase {
            SessionPhase::Failed(message) => Some(message),
            _ => None,
        }
    }
}
