//! Ingest command implementation.

use super::require;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagSystem;
use anyhow::Result;
use std::path::Path;

/// Run the ingest command.
pub async fn run_ingest(path: &Path, clear: bool, settings: Settings) -> Result<()> {
    require(Operation::Remote)?;

    if !path.exists() {
        Output::error(&format!("Path not found: {}", path.display()));
        anyhow::bail!("Path not found: {}", path.display());
    }

    let rag = RagSystem::from_settings(&settings)?;

    if path.is_file() {
        if clear {
            Output::warning("--clear only applies to folders; ignoring it.");
        }
        let spinner = Output::spinner(&format!("Indexing {}...", path.display()));
        let result = rag.add_course_document(path).await;
        spinner.finish_and_clear();

        let (course, chunks) = result?;
        Output::success(&format!("Indexed '{}'", course.title));
        Output::kv("Lessons", &course.lessons.len().to_string());
        Output::kv("Chunks", &chunks.to_string());
        return Ok(());
    }

    let spinner = Output::spinner(&format!("Indexing courses in {}...", path.display()));
    let result = rag.add_course_folder(path, clear).await;
    spinner.finish_and_clear();

    let report = result?;
    Output::success(&format!(
        "Added {} courses ({} chunks)",
        report.courses_added, report.chunks_added
    ));
    if report.already_indexed > 0 {
        Output::kv("Already indexed", &report.already_indexed.to_string());
    }
    if report.failed > 0 {
        Output::warning(&format!(
            "{} documents could not be read; run with -v for details",
            report.failed
        ));
    }

    let stats = rag.course_analytics().await?;
    Output::kv("Total courses", &stats.total_courses.to_string());

    Ok(())
}
