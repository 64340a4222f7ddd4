//! Search command implementation.

use super::require;
use crate::agent::{CourseSearchTool, ToolOutput};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagSystem;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    course: Option<&str>,
    lesson: Option<i64>,
    settings: Settings,
) -> Result<()> {
    require(Operation::Remote)?;

    let rag = RagSystem::from_settings(&settings)?;
    let tool = CourseSearchTool::new(rag.index());

    let spinner = Output::spinner("Searching...");
    let mut sources = Vec::new();
    let result = tool.search(query, course, lesson, &mut sources).await;
    spinner.finish_and_clear();

    match result {
        Ok(ToolOutput::Found(text)) => {
            Output::success(&format!("Found {} passages", sources.len()));
            println!("\n{}", text);
            Output::sources(&sources);
        }
        Ok(ToolOutput::Miss(text)) => Output::warning(&text),
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
