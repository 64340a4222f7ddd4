//! Outline command implementation.

use super::require;
use crate::agent::{CourseOutlineTool, ToolOutput};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagSystem;
use anyhow::Result;

/// Run the outline command.
pub async fn run_outline(course: &str, settings: Settings) -> Result<()> {
    // Resolving a partial name embeds it.
    require(Operation::Remote)?;

    let rag = RagSystem::from_settings(&settings)?;
    let tool = CourseOutlineTool::new(rag.index());

    match tool.outline(course).await? {
        ToolOutput::Found(text) => println!("\n{}", text),
        ToolOutput::Miss(text) => Output::warning(&text),
    }

    Ok(())
}
