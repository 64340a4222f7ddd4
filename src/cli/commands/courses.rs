//! Courses command implementation.

use super::require;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagSystem;
use anyhow::Result;

/// Run the courses command.
pub async fn run_courses(settings: Settings) -> Result<()> {
    require(Operation::Catalog)?;

    let rag = RagSystem::from_settings(&settings)?;

    match rag.course_analytics().await {
        Ok(stats) if stats.total_courses == 0 => {
            Output::info("No courses indexed yet. Use 'lectern ingest <path>' to add some.");
        }
        Ok(stats) => {
            Output::header(&format!("Indexed Courses ({})", stats.total_courses));
            for title in &stats.course_titles {
                Output::list_item(title);
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list courses: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
