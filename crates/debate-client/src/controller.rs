use tracing::{debug, info, warn};

use crate::errors::DebateError;
use crate::model::{DebateRequest, DebateResponse};
use crate::service::DebateService;
use crate::session::{PhaseKind, Session, SessionPhase};

/// Notice surfaced when the user triggers a debate without a question.
pub const EMPTY_QUESTION_NOTICE: &str = "Please enter a question first.";

/// A request the controller has committed to, tagged with its generation.
///
/// Hand it to a `DebateService` and feed the result back through
/// `SessionController::complete` with the same generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingDebate {
    pub generation: u64,
    pub request: DebateRequest,
}

/// What `SessionController::complete` did with a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The response matched the in-flight request and moved the session.
    Applied(PhaseKind),
    /// The response belonged to a cancelled or superseded request.
    Stale,
}

/// Interaction state machine for a debate session.
///
/// The only writer of `Session`. Every user action goes through here, and at
/// most one request is in flight at a time: triggers while pending are
/// rejected with `DebateError::Busy`, and each request carries a generation so
/// a late response from a cancelled request cannot overwrite newer state.
pub struct SessionController<S> {
    service: S,
    session: Session,
    generation: u64,
}

impl<S: DebateService> SessionController<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            session: Session::default(),
            generation: 0,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.session.phase
    }

    pub fn question(&self) -> &str {
        &self.session.question
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.session_id.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.session.notice.as_deref()
    }

    /// Binds user-entered text to the session question.
    pub fn set_question(&mut self, text: impl Into<String>) {
        self.session.question = text.into();
        self.session.notice = None;
    }

    /// Starts a debate on the current question.
    ///
    /// Allowed from every phase except `Pending`. From `AwaitingConfirmation`
    /// the outstanding suggestion is discarded.
    pub fn begin_debate(&mut self) -> Result<PendingDebate, DebateError> {
        self.ensure_not_pending()?;
        self.ensure_question()?;
        let request =
            DebateRequest::plain(self.session.question.clone(), self.session.session_id.clone());
        Ok(self.enter_pending(request))
    }

    /// Re-requests the debate using the suggested prompt verbatim.
    pub fn begin_accept_suggestion(&mut self) -> Result<PendingDebate, DebateError> {
        self.ensure_not_pending()?;
        let SessionPhase::AwaitingConfirmation(suggestion) = &self.session.phase else {
            return Err(DebateError::validation("no prompt suggestion to accept"));
        };
        let improved = suggestion.improved_prompt.clone();
        self.ensure_question()?;
        let request = DebateRequest::with_improved(
            self.session.question.clone(),
            self.session.session_id.clone(),
            improved,
        );
        Ok(self.enter_pending(request))
    }

    /// Declines the suggestion and debates the original question.
    pub fn begin_keep_original(&mut self) -> Result<PendingDebate, DebateError> {
        self.ensure_not_pending()?;
        if !matches!(self.session.phase, SessionPhase::AwaitingConfirmation(_)) {
            return Err(DebateError::validation("no prompt suggestion to decline"));
        }
        self.ensure_question()?;
        let request =
            DebateRequest::plain(self.session.question.clone(), self.session.session_id.clone());
        Ok(self.enter_pending(request))
    }

    /// Reconciles a service result with the session.
    ///
    /// Results whose generation does not match the in-flight request are
    /// dropped without touching state.
    pub fn complete(
        &mut self,
        generation: u64,
        result: Result<DebateResponse, DebateError>,
    ) -> Completion {
        match self.session.phase {
            SessionPhase::Pending { generation: current } if current == generation => {}
            _ => {
                warn!(
                    generation,
                    current = self.generation,
                    phase = %self.session.phase.kind(),
                    "dropping stale debate response"
                );
                return Completion::Stale;
            }
        }

        self.session.phase = match result {
            Ok(DebateResponse::NeedsConfirmation(suggestion)) => {
                info!(domain = %suggestion.domain, "service suggested an improved prompt");
                SessionPhase::AwaitingConfirmation(suggestion)
            }
            Ok(DebateResponse::Debated(outcome)) => {
                self.adopt_session_id(&outcome.session_id);
                info!(
                    chat_id = %outcome.session_id,
                    winner = %outcome.winner,
                    agents = outcome.agents.len(),
                    "debate completed"
                );
                SessionPhase::Completed(outcome)
            }
            Err(err) => {
                warn!(error = %err, "debate request failed");
                SessionPhase::Failed(err.to_string())
            }
        };
        Completion::Applied(self.session.phase.kind())
    }

    /// Abandons the in-flight request, if any.
    ///
    /// The session returns to `Idle` with its chat id intact; the abandoned
    /// request's response will be reported as stale.
    pub fn cancel_pending(&mut self) -> bool {
        if !self.session.phase.is_pending() {
            return false;
        }
        self.generation = self.generation.saturating_add(1);
        self.session.phase = SessionPhase::Idle;
        info!(generation = self.generation, "cancelled in-flight debate request");
        true
    }

    /// Starts a wholly new conversation, forgetting the remote chat id.
    pub fn reset(&mut self) -> Result<(), DebateError> {
        self.ensure_not_pending()?;
        self.session.session_id = None;
        self.session.phase = SessionPhase::Idle;
        self.session.notice = None;
        debug!("session reset");
        Ok(())
    }

    /// Runs `begin_debate` and the round trip.
    ///
    /// Local rejections are returned as errors; service failures land in
    /// `SessionPhase::Failed`.
    pub async fn start_debate(&mut self) -> Result<PhaseKind, DebateError> {
        let pending = self.begin_debate()?;
        Ok(self.dispatch(pending).await)
    }

    /// Runs `begin_accept_suggestion` and the round trip.
    pub async fn accept_suggestion(&mut self) -> Result<PhaseKind, DebateError> {
        let pending = self.begin_accept_suggestion()?;
        Ok(self.dispatch(pending).await)
    }

    /// Runs `begin_keep_original` and the round trip.
    pub async fn keep_original(&mut self) -> Result<PhaseKind, DebateError> {
        let pending = self.begin_keep_original()?;
        Ok(self.dispatch(pending).await)
    }

    async fn dispatch(&mut self, pending: PendingDebate) -> PhaseKind {
        let PendingDebate {
            generation,
            request,
        } = pending;
        let result = self.service.request_debate(request).await;
        self.complete(generation, result);
        self.session.phase.kind()
    }

    fn ensure_not_pending(&self) -> Result<(), DebateError> {
        if self.session.phase.is_pending() {
            debug!(generation = self.generation, "ignoring trigger while a request is in flight");
            return Err(DebateError::Busy);
        }
        Ok(())
    }

    fn ensure_question(&mut self) -> Result<(), DebateError> {
        if self.session.question.trim().is_empty() {
            self.session.notice = Some(EMPTY_QUESTION_NOTICE.to_string());
            return Err(DebateError::validation(EMPTY_QUESTION_NOTICE));
        }
        Ok(())
    }

    fn enter_pending(&mut self, request: DebateRequest) -> PendingDebate {
        self.generation = self.generation.saturating_add(1);
        self.session.notice = None;
        self.session.phase = SessionPhase::Pending {
            generation: self.generation,
        };
        debug!(
            generation = self.generation,
            use_improved = request.use_improved_prompt,
            chat_id = request.session_id.as_deref().unwrap_or("-"),
            "debate request issued"
        );
        PendingDebate {
            generation: self.generation,
            request,
        }
    }

    fn adopt_session_id(&mut self, reported: &str) {
        match self.session.session_id.as_deref() {
            None => self.session.session_id = Some(reported.to_string()),
            Some(known) if known != reported => {
                warn!(known, reported, "service reported a different chat id; keeping the first");
            }
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DebateOutcome, PromptSuggestion};
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct ScriptedService {
        replies: Mutex<VecDeque<Result<DebateResponse, DebateError>>>,
        requests: Mutex<Vec<DebateRequest>>,
        calls: AtomicUsize,
    }

    impl ScriptedService {
        fn with(replies: Vec<Result<DebateResponse, DebateError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                ..Self::default()
            }
        }

        fn requests(&self) -> Vec<DebateRequest> {
            self.requests.lock().expect("lock").clone()
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl DebateService for ScriptedService {
        async fn request_debate(
            &self,
            request: DebateRequest,
        ) -> Result<DebateResponse, DebateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().expect("lock").push(request);
            self.replies
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or_else(|| Err(DebateError::Network("no scripted reply".into())))
        }
    }

    fn suggestion(original: &str, improved: &str) -> PromptSuggestion {
        PromptSuggestion {
            domain: "general".into(),
            original_prompt: original.into(),
            improved_prompt: improved.into(),
            explanation: "Your original prompt was short.".into(),
            message: "Your prompt was improved. Approve?".into(),
            improvement_reason: None,
        }
    }

    fn outcome(chat_id: &str, winner: &str) -> DebateOutcome {
        DebateOutcome {
            status: "ok".into(),
            session_id: chat_id.into(),
            domain: "general".into(),
            used_prompt: "Explain X".into(),
            agents: vec!["AgentA".into(), "AgentB".into()],
            initial: BTreeMap::from([("AgentA".into(), "a".into()), ("AgentB".into(), "b".into())]),
            critiques: BTreeMap::new(),
            defenses: BTreeMap::new(),
            winner: winner.into(),
            scoreboard: BTreeMap::from([("AgentA".into(), 9.0), ("AgentB".into(), 7.0)]),
            answer: "a".into(),
            reason: "more complete".into(),
            raw_judge_transcript: String::new(),
        }
    }

    fn controller(replies: Vec<Result<DebateResponse, DebateError>>) -> SessionController<ScriptedService> {
        SessionController::new(ScriptedService::with(replies))
    }

    #[tokio::test]
    async fn start_from_idle_sends_one_plain_request() {
        let mut ctl = controller(vec![Ok(DebateResponse::Debated(outcome("s1", "AgentA")))]);
        ctl.set_question("Explain X");
        let phase = ctl.start_debate().await.expect("start");
        assert_eq!(phase, PhaseKind::Completed);
        assert_eq!(
            ctl.service().requests(),
            vec![DebateRequest::plain("Explain X", None)]
        );
    }

    #[tokio::test]
    async fn blank_question_is_rejected_without_a_request() {
        let mut ctl = controller(vec![]);
        ctl.set_question("   \n\t");
        let err = ctl.start_debate().await.expect_err("blank");
        assert!(matches!(err, DebateError::Validation(_)));
        assert_eq!(ctl.service().calls(), 0);
        assert_eq!(ctl.phase(), &SessionPhase::Idle);
        assert_eq!(ctl.notice(), Some(EMPTY_QUESTION_NOTICE));

        ctl.set_question("Explain X");
        assert!(ctl.notice().is_none());
    }

    #[tokio::test]
    async fn blank_question_after_completion_keeps_the_result() {
        let mut ctl = controller(vec![Ok(DebateResponse::Debated(outcome("s1", "AgentA")))]);
        ctl.set_question("Explain X");
        ctl.start_debate().await.expect("start");
        ctl.set_question("");
        assert!(ctl.start_debate().await.is_err());
        assert_eq!(ctl.phase().kind(), PhaseKind::Completed);
        assert_eq!(ctl.service().calls(), 1);
    }

    #[tokio::test]
    async fn suggestion_moves_to_awaiting_confirmation() {
        let expected = suggestion("Explain X", "Explain X in detail with examples");
        let mut ctl = controller(vec![Ok(DebateResponse::NeedsConfirmation(expected.clone()))]);
        ctl.set_question("Explain X");
        let phase = ctl.start_debate().await.expect("start");
        assert_eq!(phase, PhaseKind::AwaitingConfirmation);
        assert_eq!(ctl.session().pending_suggestion(), Some(&expected));
        assert!(ctl.session().last_result().is_none());
        assert!(ctl.session().last_error().is_none());
        assert!(ctl.session_id().is_none());
    }

    #[tokio::test]
    async fn accepting_sends_improved_prompt_verbatim() {
        let improved = "  Explain X in detail, with examples.  ";
        let mut ctl = controller(vec![
            Ok(DebateResponse::NeedsConfirmation(suggestion("Explain X", improved))),
            Ok(DebateResponse::Debated(outcome("s1", "AgentA"))),
        ]);
        ctl.set_question("Explain X");
        ctl.start_debate().await.expect("start");
        ctl.accept_suggestion().await.expect("accept");

        let requests = ctl.service().requests();
        let second = &requests[1];
        assert!(second.use_improved_prompt);
        assert_eq!(second.improved_prompt_text.as_deref(), Some(improved));
        assert_eq!(second.question, "Explain X");
    }

    #[tokio::test]
    async fn keeping_original_sends_plain_original_question() {
        let mut ctl = controller(vec![
            Ok(DebateResponse::NeedsConfirmation(suggestion("Explain X", "Explain X better"))),
            Ok(DebateResponse::Debated(outcome("s1", "AgentA"))),
        ]);
        ctl.set_question("Explain X");
        ctl.start_debate().await.expect("start");
        ctl.keep_original().await.expect("keep");

        let requests = ctl.service().requests();
        let second = &requests[1];
        assert_eq!(second, &DebateRequest::plain("Explain X", None));
        assert_eq!(ctl.phase().kind(), PhaseKind::Completed);
    }

    #[tokio::test]
    async fn chat_id_is_threaded_through_later_requests() {
        let mut ctl = controller(vec![
            Ok(DebateResponse::Debated(outcome("abc123", "AgentA"))),
            Ok(DebateResponse::NeedsConfirmation(suggestion("Next", "Next, better"))),
            Ok(DebateResponse::Debated(outcome("abc123", "AgentB"))),
        ]);
        ctl.set_question("First");
        ctl.start_debate().await.expect("first");
        assert_eq!(ctl.session_id(), Some("abc123"));

        ctl.set_question("Next");
        ctl.start_debate().await.expect("second");
        assert_eq!(ctl.session_id(), Some("abc123"));
        ctl.accept_suggestion().await.expect("third");

        let requests = ctl.service().requests();
        assert_eq!(requests[0].session_id, None);
        assert!(
            requests[1..]
                .iter()
                .all(|r| r.session_id.as_deref() == Some("abc123"))
        );
        assert_eq!(ctl.session().last_result().map(|o| o.winner.as_str()), Some("AgentB"));
    }

    #[tokio::test]
    async fn first_chat_id_wins_over_a_later_different_one() {
        let mut ctl = controller(vec![
            Ok(DebateResponse::Debated(outcome("s1", "AgentA"))),
            Ok(DebateResponse::Debated(outcome("s2", "AgentA"))),
        ]);
        ctl.set_question("Explain X");
        ctl.start_debate().await.expect("first");
        ctl.start_debate().await.expect("second");
        assert_eq!(ctl.session_id(), Some("s1"));
    }

    #[tokio::test]
    async fn reading_state_issues_no_requests() {
        let mut ctl = controller(vec![Ok(DebateResponse::Debated(outcome("s1", "AgentA")))]);
        ctl.set_question("Explain X");
        ctl.start_debate().await.expect("start");
        for _ in 0..3 {
            let _ = ctl.session().clone();
            let _ = ctl.phase().kind();
            let _ = ctl.session_id();
        }
        assert_eq!(ctl.service().calls(), 1);
    }

    #[tokio::test]
    async fn example_accept_flow_completes_with_chat_id() {
        let mut ctl = controller(vec![
            Ok(DebateResponse::NeedsConfirmation(suggestion(
                "Explain X",
                "Explain X in detail with examples",
            ))),
            Ok(DebateResponse::Debated(outcome("s1", "AgentA"))),
        ]);
        ctl.set_question("Explain X");
        assert_eq!(
            ctl.start_debate().await.expect("start"),
            PhaseKind::AwaitingConfirmation
        );
        assert_eq!(
            ctl.accept_suggestion().await.expect("accept"),
            PhaseKind::Completed
        );
        let requests = ctl.service().requests();
        assert_eq!(
            requests[1],
            DebateRequest::with_improved("Explain X", None, "Explain X in detail with examples")
        );
        assert_eq!(ctl.session_id(), Some("s1"));
        assert!(ctl.session().pending_suggestion().is_none());
    }

    #[tokio::test]
    async fn server_error_lands_in_failed_with_status_and_body() {
        let mut ctl = controller(vec![Err(DebateError::Transport {
            status: 500,
            body: "internal error".into(),
        })]);
        ctl.set_question("Explain X");
        assert_eq!(ctl.start_debate().await.expect("start"), PhaseKind::Failed);
        let message = ctl.session().last_error().expect("error");
        assert!(message.contains("500"));
        assert!(message.contains("internal error"));
        assert!(ctl.session_id().is_none());
    }

    #[tokio::test]
    async fn failure_is_left_by_starting_again() {
        let mut ctl = controller(vec![
            Err(DebateError::Network("connection refused".into())),
            Ok(DebateResponse::Debated(outcome("s1", "AgentA"))),
        ]);
        ctl.set_question("Explain X");
        ctl.start_debate().await.expect("first");
        assert_eq!(ctl.phase().kind(), PhaseKind::Failed);
        ctl.start_debate().await.expect("second");
        assert_eq!(ctl.phase().kind(), PhaseKind::Completed);
        assert!(ctl.session().last_error().is_none());
    }

    #[test]
    fn triggers_while_pending_are_rejected() {
        let mut ctl = controller(vec![]);
        ctl.set_question("Explain X");
        let first = ctl.begin_debate().expect("first");
        assert_eq!(ctl.begin_debate(), Err(DebateError::Busy));
        assert_eq!(ctl.begin_keep_original(), Err(DebateError::Busy));
        assert_eq!(ctl.reset(), Err(DebateError::Busy));
        assert_eq!(
            ctl.phase(),
            &SessionPhase::Pending {
                generation: first.generation
            }
        );
    }

    #[test]
    fn cancelled_request_response_is_stale() {
        let mut ctl = controller(vec![]);
        ctl.set_question("Explain X");
        let abandoned = ctl.begin_debate().expect("first");
        assert!(ctl.cancel_pending());
        assert_eq!(ctl.phase(), &SessionPhase::Idle);

        let current = ctl.begin_debate().expect("second");
        assert_ne!(abandoned.generation, current.generation);

        let late = ctl.complete(
            abandoned.generation,
            Ok(DebateResponse::Debated(outcome("old", "AgentA"))),
        );
        assert_eq!(late, Completion::Stale);
        assert!(ctl.phase().is_pending());

        let fresh = ctl.complete(
            current.generation,
            Ok(DebateResponse::Debated(outcome("new", "AgentB"))),
        );
        assert_eq!(fresh, Completion::Applied(PhaseKind::Completed));
        assert_eq!(ctl.session_id(), Some("new"));
    }

    #[test]
    fn completion_without_pending_request_is_stale() {
        let mut ctl = controller(vec![]);
        let result = ctl.complete(1, Err(DebateError::Network("late".into())));
        assert_eq!(result, Completion::Stale);
        assert_eq!(ctl.phase(), &SessionPhase::Idle);
        assert!(!ctl.cancel_pending());
    }

    #[test]
    fn decisions_require_a_pending_suggestion() {
        let mut ctl = controller(vec![]);
        ctl.set_question("Explain X");
        assert!(matches!(
            ctl.begin_accept_suggestion(),
            Err(DebateError::Validation(_))
        ));
        assert!(matches!(
            ctl.begin_keep_original(),
            Err(DebateError::Validation(_))
        ));
        assert_eq!(ctl.phase(), &SessionPhase::Idle);
    }

    #[test]
    fn new_question_while_awaiting_discards_suggestion() {
        let mut ctl = controller(vec![]);
        ctl.set_question("Explain X");
        let pending = ctl.begin_debate().expect("first");
        ctl.complete(
            pending.generation,
            Ok(DebateResponse::NeedsConfirmation(suggestion("Explain X", "Explain X better"))),
        );
        assert_eq!(ctl.phase().kind(), PhaseKind::AwaitingConfirmation);

        ctl.set_question("Explain Y");
        let next = ctl.begin_debate().expect("second");
        assert_eq!(next.request, DebateRequest::plain("Explain Y", None));
        assert!(ctl.session().pending_suggestion().is_none());
    }

    #[tokio::test]
    async fn reset_forgets_the_chat_id() {
        let mut ctl = controller(vec![
            Ok(DebateResponse::Debated(outcome("s1", "AgentA"))),
            Ok(DebateResponse::Debated(outcome("s2", "AgentA"))),
        ]);
        ctl.set_question("Explain X");
        ctl.start_debate().await.expect("first");
        ctl.reset().expect("reset");
        assert_eq!(ctl.phase(), &SessionPhase::Idle);
        assert!(ctl.session_id().is_none());
        assert_eq!(ctl.question(), "Explain X");

        ctl.start_debate().await.expect("second");
        assert_eq!(ctl.service().requests()[1].session_id, None);
        assert_eq!(ctl.session_id(), Some("s2"));
    }
}
