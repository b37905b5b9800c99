//! Switchboard command-line entry point.
//!
//! Usage:
//!   switchboard "How do I reset my password?"
//!   switchboard --vector-store-id vs_abc --vector-store-id vs_def
//!   switchboard --classifier keyword "create a ticket, monitor flickers"
//!
//! With a question, routes it once and prints the answer. Without one,
//! starts an interactive loop.

mod repl;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use switchboard_common::SwitchboardError;
use switchboard_coordinator::{ClassifierMode, IntentRouter, SwitchboardConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    name = "switchboard",
    version,
    about = "Route IT help requests to ServiceNow, internal documents or the web"
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Document repository to search (repeatable, replaces the configured list)
    #[arg(long = "vector-store-id", value_name = "ID")]
    vector_store_ids: Vec<String>,

    /// Classifier to use: llm or keyword
    #[arg(long, value_name = "MODE")]
    classifier: Option<ClassifierMode>,

    /// Question to route; omit to start the interactive loop
    question: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let router = match build_router(&cli) {
        Ok(router) => router,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(1);
        }
    };

    let question = cli.question.join(" ");
    if question.trim().is_empty() {
        return match repl::run(&router).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {e:#}");
                ExitCode::from(1)
            }
        };
    }

    match router.route(&question).await {
        Ok(response) => {
            println!("{response}");
            ExitCode::SUCCESS
        }
        Err(e) => ExitCode::from(report(&e)),
    }
}

fn build_router(cli: &Cli) -> anyhow::Result<IntentRouter> {
    let mut config = SwitchboardConfig::load(cli.config.as_deref())?;

    if !cli.vector_store_ids.is_empty() {
        config.search.vector_store_ids = cli.vector_store_ids.clone();
    }
    if let Some(mode) = cli.classifier {
        config.classifier.mode = mode;
    }

    Ok(IntentRouter::from_config(&config)?)
}

/// Print a routing failure and return the process exit code for it.
pub(crate) fn report(err: &SwitchboardError) -> u8 {
    eprintln!("Error: {err}");
    if err.is_ticket_failure() {
        eprintln!(
            "The ticket request was not retried automatically. \
             Check ServiceNow before trying again to avoid a duplicate incident."
        );
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeatable_vector_store_ids() {
        let cli = Cli::parse_from([
            "switchboard",
            "--vector-store-id",
            "vs_a",
            "--vector-store-id",
            "vs_b",
            "--classifier",
            "keyword",
            "How",
            "to",
            "print?",
        ]);
        assert_eq!(cli.vector_store_ids, vec!["vs_a", "vs_b"]);
        assert_eq!(cli.classifier, Some(ClassifierMode::Keyword));
        assert_eq!(cli.question.join(" "), "How to print?");
    }

    #[test]
    fn no_question_means_interactive() {
        let cli = Cli::parse_from(["switchboard"]);
        assert!(cli.question.is_empty());
        assert!(cli.config.is_none());
    }

    #[test]
    fn rejects_unknown_classifier() {
        assert!(Cli::try_parse_from(["switchboard", "--classifier", "dice"]).is_err());
    }

    #[test]
    fn ticket_failures_exit_with_two() {
        assert_eq!(report(&SwitchboardError::TicketCreation("401".into())), 2);
        assert_eq!(
            report(&SwitchboardError::ClassificationUnavailable("timeout".into())),
            1
        );
    }
}
