//! Terminal front end for the multi-agent debate service.

mod app;
mod render;

use std::time::Duration;

use clap::Parser;
use debate_client::{DebateClient, DebateClientConfig, SessionController, init_observability};
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tracing::info;

use crate::app::{App, Options, SuggestionPolicy, forward_interrupts};

#[derive(Parser, Debug)]
#[command(
    name = "debate",
    version,
    about = "Ask a question, optionally accept an improved prompt, and read the agents' debate"
)]
struct Args {
    /// Ask a single question and exit instead of starting an interactive prompt.
    #[arg(short, long)]
    question: Option<String>,
    /// Debate service base URL (overrides DEBATE_BACKEND_URL).
    #[arg(long)]
    backend_url: Option<String>,
    /// HTTP timeout in seconds (overrides DEBATE_TIMEOUT_SECS).
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Accept any suggested prompt without asking.
    #[arg(long, conflicts_with = "keep_original")]
    auto_accept: bool,
    /// Decline any suggested prompt without asking.
    #[arg(long)]
    keep_original: bool,
    /// Print per-agent transcripts and the raw judge output.
    #[arg(short, long)]
    verbose: bool,
    /// Default log filter when DEBATE_LOG_LEVEL / RUST_LOG are unset.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Args {
    fn policy(&self) -> SuggestionPolicy {
        if self.auto_accept {
            SuggestionPolicy::UseImproved
        } else if self.keep_original || self.question.is_some() {
            SuggestionPolicy::KeepOriginal
        } else {
            SuggestionPolicy::Ask
        }
    }

    fn client_config(&self) -> anyhow::Result<DebateClientConfig> {
        let mut config = DebateClientConfig::from_env()?;
        if let Some(url) = self.backend_url.as_deref() {
            config = config.base_url(url);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.timeout(Duration::from_secs(secs));
        }
        Ok(config.user_agent(concat!("debate-cli/", env!("CARGO_PKG_VERSION"))))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    init_observability(&args.log_level);

    let config = args.client_config()?;
    info!(base_url = %config.base_url, timeout_secs = config.timeout.as_secs(), "debate client configured");
    let client = DebateClient::new(config)?;

    let options = Options {
        verbose: args.verbose,
        policy: args.policy(),
    };
    let mut app = App::new(
        SessionController::new(client),
        options,
        std::io::stdout(),
        forward_interrupts(),
    );
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    match args.question.as_deref() {
        Some(question) => app.ask(question, &mut input).await?,
        None => app.repl(&mut input).await?,
    }
    Ok(())
}
