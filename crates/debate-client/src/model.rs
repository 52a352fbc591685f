use std::collections::BTreeMap;

use crate::errors::DebateError;

/// Status value the service uses to ask for a prompt decision.
pub const NEEDS_CONFIRMATION: &str = "needs_confirmation";

/// Body of the single `POST /debate` call.
///
/// Optional fields serialize as `null` rather than being omitted.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DebateRequest {
    pub question: String,
    /// Remote chat identifier, echoed back once the service has assigned one.
    #[serde(rename = "chat_id")]
    pub session_id: Option<String>,
    #[serde(rename = "use_improved")]
    pub use_improved_prompt: bool,
    #[serde(rename = "improved_prompt")]
    pub improved_prompt_text: Option<String>,
}

impl DebateRequest {
    /// Plain request: let the service decide whether the prompt needs work.
    pub fn plain(question: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            question: question.into(),
            session_id,
            use_improved_prompt: false,
            improved_prompt_text: None,
        }
    }

    /// Request that runs the debate on a previously suggested prompt.
    pub fn with_improved(
        question: impl Into<String>,
        session_id: Option<String>,
        improved_prompt: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            session_id,
            use_improved_prompt: true,
            improved_prompt_text: Some(improved_prompt.into()),
        }
    }
}

/// Server proposal to rephrase the question before debating it.
///
/// Has no identity of its own; it is only meaningful for the session that
/// received it and is dropped on the next request.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PromptSuggestion {
    pub domain: String,
    pub original_prompt: String,
    pub improved_prompt: String,
    pub explanation: String,
    pub message: String,
    #[serde(default)]
    pub improvement_reason: Option<String>,
}

/// Final result of a completed debate round.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DebateOutcome {
    /// Whatever non-confirmation status the service sent, `null` if absent.
    #[serde(default)]
    pub status: serde_json::Value,
    #[serde(rename = "chat_id")]
    pub session_id: String,
    pub domain: String,
    pub used_prompt: String,
    pub agents: Vec<String>,
    #[serde(default)]
    pub initial: BTreeMap<String, String>,
    #[serde(default)]
    pub critiques: BTreeMap<String, String>,
    #[serde(default)]
    pub defenses: BTreeMap<String, String>,
    pub winner: String,
    #[serde(default)]
    pub scoreboard: BTreeMap<String, f64>,
    pub answer: String,
    #[serde(default)]
    pub reason: String,
    #[serde(rename = "judge_raw", default)]
    pub raw_judge_transcript: String,
}

impl DebateOutcome {
    /// Score the judge gave the winner, if the scoreboard mentions it.
    pub fn winner_score(&self) -> Option<f64> {
        self.scoreboard.get(&self.winner).copied()
    }

    /// Whether the winner appears both in `agents` and in `scoreboard`.
    ///
    /// The service is expected to guarantee this; callers only use it to
    /// annotate output.
    pub fn winner_is_consistent(&self) -> bool {
        self.agents.iter().any(|a| a == &self.winner) && self.scoreboard.contains_key(&self.winner)
    }

    /// Scoreboard entries ordered by descending score, ties broken by name.
    pub fn ranked_scoreboard(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .scoreboard
            .iter()
            .map(|(name, score)| (name.as_str(), *score))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

/// The two success shapes of a debate call.
#[derive(Clone, Debug, PartialEq)]
pub enum DebateResponse {
    /// The service wants the user to accept or reject an improved prompt.
    NeedsConfirmation(PromptSuggestion),
    /// The debate ran to completion.
    Debated(DebateOutcome),
}

impl DebateResponse {
    /// Classifies a 2xx response body.
    ///
    /// `status == "needs_confirmation"` selects the suggestion shape; any other
    /// or missing status is treated as a completed debate.
    pub fn from_json_str(body: &str) -> Result<Self, DebateError> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, DebateError> {
        if !value.is_object() {
            return Err(DebateError::Parse(
                "expected a JSON object at the top level".into(),
            ));
        }
        let needs_confirmation =
            value.get("status").and_then(|v| v.as_str()) == Some(NEEDS_CONFIRMATION);
        if needs_confirmation {
            Ok(Self::NeedsConfirmation(serde_json::from_value(value)?))
        } else {
            Ok(Self::Debated(serde_json::from_value(value)?))
        }
    }

    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NeedsConfirmation(_) => NEEDS_CONFIRMATION,
            Self::Debated(_) => "debated",
        }
    }
}
