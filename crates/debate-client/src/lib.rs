//! Client for the multi-agent debate service.
//!
//! A debate is a two-step exchange: the first request may come back with a
//! suggested rephrasing that the user has to accept or decline before the
//! debate runs. `SessionController` owns that state machine and the remote
//! chat id; `DebateClient` performs the HTTP round trips.
//!
//! ```no_run
//! use debate_client::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), DebateError> {
//! let mut controller = SessionController::new(DebateClient::from_env()?);
//! controller.set_question("Explain the difference between the Diesel and Otto cycles");
//!
//! if controller.start_debate().await? == PhaseKind::AwaitingConfirmation {
//!     controller.accept_suggestion().await?;
//! }
//! if let Some(outcome) = controller.session().last_result() {
//!     println!("{} won: {}", outcome.winner, outcome.answer);
//! }
//! # Ok(())
//! # }
//! ```

/// HTTP implementation of `DebateService`.
pub mod client;
/// Client configuration.
pub mod config;
/// Session state machine.
pub mod controller;
/// Error taxonomy.
pub mod errors;
/// Wire types and response classification.
pub mod model;
/// Logging bootstrap.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Service seam between the controller and the network.
pub mod service;
/// Session record and phases.
pub mod session;

pub use client::{DebateClient, classify_response};
pub use config::DebateClientConfig;
pub use controller::{Completion, EMPTY_QUESTION_NOTICE, PendingDebate, SessionController};
pub use errors::DebateError;
pub use model::{DebateOutcome, DebateRequest, DebateResponse, PromptSuggestion};
pub use observability::init_observability;
pub use service::DebateService;
pub use session::{PhaseKind, Session, SessionPhase};
