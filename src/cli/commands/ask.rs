//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::format_sources_for_display;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(video: &str, question: &str, show_sources: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidquery config path' to locate the configuration file.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(&settings)?;

    let spinner = Output::spinner("Reading the transcript...");

    match orchestrator.ask(video, question).await {
        Ok(answer) => {
            spinner.finish_and_clear();

            println!("\n{}\n", answer.text);

            if show_sources && !answer.sources.is_empty() {
                Output::header("Sources");
                println!("{}", format_sources_for_display(&answer.sources, 200));
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            if e.is_not_found() {
                Output::warning(&format!("{}", e));
            } else {
                Output::error(&format!("Failed to generate answer: {}", e));
            }
            return Err(e.into());
        }
    }

    Ok(())
}
