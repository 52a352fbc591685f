use std::io::Write;

use debate_client::{DebateError, DebateService, PhaseKind, SessionController, SessionPhase};
use tokio::io::{AsyncBufRead, Lines};
use tokio::sync::mpsc;
use tracing::debug;

use crate::render::{self, Decision};

/// A keep-original request can be answered with yet another suggestion;
/// stop asking after this many rounds for one question.
const MAX_CONFIRMATION_ROUNDS: usize = 3;

/// How to answer a prompt suggestion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuggestionPolicy {
    Ask,
    UseImproved,
    KeepOriginal,
}

#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub verbose: bool,
    pub policy: SuggestionPolicy,
}

#[derive(Clone, Copy, Debug)]
enum Action {
    Start,
    Accept,
    Keep,
}

/// Terminal front end: binds input lines to the controller and prints the
/// session after every transition.
///
/// `interrupts` carries Ctrl-C presses. One cancels a pending request; one at
/// a prompt ends the session.
pub struct App<S, W> {
    controller: SessionController<S>,
    options: Options,
    out: W,
    interrupts: mpsc::UnboundedReceiver<()>,
    interrupted: bool,
}

impl<S: DebateService, W: Write> App<S, W> {
    pub fn new(
        controller: SessionController<S>,
        options: Options,
        out: W,
        interrupts: mpsc::UnboundedReceiver<()>,
    ) -> Self {
        Self {
            controller,
            options,
            out,
            interrupts,
            interrupted: false,
        }
    }

    #[cfg(test)]
    pub fn controller(&self) -> &SessionController<S> {
        &self.controller
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Reads questions until EOF, `/quit` or Ctrl-C at a prompt.
    pub async fn repl<R>(&mut self, input: &mut Lines<R>) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        writeln!(
            self.out,
            "Ask a question. Commands: /new starts a fresh conversation, /quit exits."
        )?;
        while !self.interrupted {
            write!(self.out, "question> ")?;
            self.out.flush()?;
            let Some(line) = self.read_line(input).await? else {
                break;
            };
            match line.trim() {
                "/quit" | "/exit" => break,
                "/new" => {
                    self.controller.reset()?;
                    writeln!(self.out, "Started a new conversation.")?;
                }
                _ => self.ask(&line, input).await?,
            }
        }
        Ok(())
    }

    /// Runs one question through the suggestion/debate exchange.
    pub async fn ask<R>(&mut self, question: &str, input: &mut Lines<R>) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        self.controller.set_question(question);
        let mut action = Action::Start;
        let mut rounds = 0;
        loop {
            let Some(phase) = self.perform(action).await? else {
                return Ok(());
            };
            debug!(%phase, "rendering transition");
            let suggestion = match self.controller.phase() {
                SessionPhase::AwaitingConfirmation(suggestion) => render::suggestion(suggestion),
                SessionPhase::Completed(outcome) => {
                    let text = render::outcome(outcome, self.options.verbose);
                    write!(self.out, "{text}")?;
                    return Ok(());
                }
                SessionPhase::Failed(message) => {
                    writeln!(self.out, "Error: {message}")?;
                    return Ok(());
                }
                SessionPhase::Idle | SessionPhase::Pending { .. } => return Ok(()),
            };
            write!(self.out, "{suggestion}")?;
            rounds += 1;
            if rounds > MAX_CONFIRMATION_ROUNDS {
                writeln!(self.out, "The service keeps asking for confirmation; giving up.")?;
                return Ok(());
            }
            action = match self.decide(input).await? {
                Some(Decision::UseImproved) => Action::Accept,
                Some(Decision::KeepOriginal) => Action::Keep,
                None => return Ok(()),
            };
        }
    }

    /// Returns `None` when the action was rejected locally or cancelled.
    async fn perform(&mut self, action: Action) -> anyhow::Result<Option<PhaseKind>> {
        let result = tokio::select! {
            biased;
            result = run_action(&mut self.controller, action) => Some(result),
            Some(()) = self.interrupts.recv() => None,
        };
        match result {
            Some(Ok(phase)) => Ok(Some(phase)),
            Some(Err(err)) => {
                let message = self
                    .controller
                    .notice()
                    .map(str::to_owned)
                    .unwrap_or_else(|| err.to_string());
                writeln!(self.out, "{message}")?;
                Ok(None)
            }
            None => {
                self.controller.cancel_pending();
                writeln!(self.out, "Cancelled.")?;
                Ok(None)
            }
        }
    }

    async fn decide<R>(&mut self, input: &mut Lines<R>) -> anyhow::Result<Option<Decision>>
    where
        R: AsyncBufRead + Unpin,
    {
        match self.options.policy {
            SuggestionPolicy::UseImproved => return Ok(Some(Decision::UseImproved)),
            SuggestionPolicy::KeepOriginal => return Ok(Some(Decision::KeepOriginal)),
            SuggestionPolicy::Ask => {}
        }
        loop {
            write!(self.out, "[u]se improved / [k]eep original > ")?;
            self.out.flush()?;
            let Some(line) = self.read_line(input).await? else {
                return Ok(None);
            };
            if let Some(decision) = render::parse_decision(&line) {
                return Ok(Some(decision));
            }
            writeln!(self.out, "Please answer u or k.")?;
        }
    }

    /// Next input line, or `None` on EOF or Ctrl-C.
    async fn read_line<R>(&mut self, input: &mut Lines<R>) -> anyhow::Result<Option<String>>
    where
        R: AsyncBufRead + Unpin,
    {
        tokio::select! {
            biased;
            line = input.next_line() => Ok(line?),
            Some(()) = self.interrupts.recv() => {
                self.interrupted = true;
                writeln!(self.out)?;
                Ok(None)
            }
        }
    }
}

/// Forwards every Ctrl-C to the returned receiver.
pub fn forward_interrupts() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}

async fn run_action<S: DebateService>(
    controller: &mut SessionController<S>,
    action: Action,
) -> Result<PhaseKind, DebateError> {
    match action {
        Action::Start => controller.start_debate().await,
        Action::Accept => controller.accept_suggestion().await,
        Action::Keep => controller.keep_original().await,
    }
}
