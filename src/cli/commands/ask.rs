//! Ask command implementation.

use super::require;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagSystem;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, max_rounds: Option<usize>, settings: Settings) -> Result<()> {
    require(Operation::Remote)?;

    let mut rag = RagSystem::from_settings(&settings)?;
    if let Some(rounds) = max_rounds {
        rag = rag.with_max_rounds(rounds);
    }

    let spinner = Output::spinner("Thinking...");
    let result = rag.query(question, None).await;
    spinner.finish_and_clear();

    match result {
        Ok(response) => {
            println!("\n{}\n", response.answer);
            Output::sources(&response.sources);
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
