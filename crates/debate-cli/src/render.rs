use std::fmt::Write as _;

use debate_client::{DebateOutcome, PromptSuggestion};

/// User answer to a prompt suggestion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    UseImproved,
    KeepOriginal,
}

pub fn parse_decision(input: &str) -> Option<Decision> {
    match input.trim().to_ascii_lowercase().as_str() {
        "u" | "use" | "y" | "yes" | "improved" => Some(Decision::UseImproved),
        "k" | "keep" | "n" | "no" | "original" => Some(Decision::KeepOriginal),
        _ => None,
    }
}

pub fn suggestion(suggestion: &PromptSuggestion) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Prompt improvement recommended ({})", suggestion.domain);
    let _ = writeln!(out, "{}", suggestion.message);
    if !suggestion.explanation.is_empty() {
        let _ = writeln!(out, "{}", suggestion.explanation);
    }
    if let Some(reason) = suggestion.improvement_reason.as_deref().filter(|r| !r.is_empty()) {
        let _ = writeln!(out, "Why: {reason}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "  Original: {}", suggestion.original_prompt);
    let _ = writeln!(out, "  Improved: {}", suggestion.improved_prompt);
    out
}

pub fn outcome(outcome: &DebateOutcome, verbose: bool) -> String {
    let mut out = String::new();
    match outcome.winner_score() {
        Some(score) => {
            let _ = writeln!(out, "Winner: {} ({score})", outcome.winner);
        }
        None => {
            let _ = writeln!(out, "Winner: {}", outcome.winner);
        }
    }
    if !outcome.winner_is_consistent() {
        let _ = writeln!(out, "  (winner not listed among the agents or scores)");
    }
    let _ = writeln!(out, "Domain: {}", outcome.domain);
    let _ = writeln!(out, "Prompt: {}", outcome.used_prompt);
    let _ = writeln!(out);
    let _ = writeln!(out, "Final answer:");
    let _ = writeln!(out, "{}", outcome.answer);
    let _ = writeln!(out);
    let _ = writeln!(out, "Judge reason:");
    let _ = writeln!(out, "{}", outcome.reason);

    let ranked = outcome.ranked_scoreboard();
    if !ranked.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Scoreboard:");
        for (name, score) in ranked {
            let _ = writeln!(out, "  {name:<20} {score}");
        }
    }

    if verbose {
        for agent in &outcome.agents {
            let _ = writeln!(out);
            let _ = writeln!(out, "--- {agent} ---");
            for (label, transcript) in [
                ("initial", &outcome.initial),
                ("critique", &outcome.critiques),
                ("defense", &outcome.defenses),
            ] {
                if let Some(text) = transcript.get(agent) {
                    let _ = writeln!(out, "[{label}]");
                    let _ = writeln!(out, "{text}");
                }
            }
        }
        if !outcome.raw_judge_transcript.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "--- judge ---");
            let _ = writeln!(out, "{}", outcome.raw_judge_transcript);
        }
    }
    out
}
