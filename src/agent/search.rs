//! Content search tool: filtered semantic search over lesson chunks.

use super::tools::{parse_arguments, Tool, ToolOutput, ToolSchema};
use crate::course::UNKNOWN_COURSE;
use crate::error::Result;
use crate::index::{SearchFilter, SearchOutcome, SemanticIndex};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub const SEARCH_TOOL_NAME: &str = "search_course_content";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    course_name: Option<String>,
    #[serde(default)]
    lesson_number: Option<i64>,
}

/// Searches course content, optionally narrowed to a course and lesson.
pub struct CourseSearchTool {
    index: Arc<dyn SemanticIndex>,
}

impl CourseSearchTool {
    pub fn new(index: Arc<dyn SemanticIndex>) -> Self {
        Self { index }
    }

    /// Run a search with already-typed arguments.
    pub async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<i64>,
        sources: &mut Vec<String>,
    ) -> Result<ToolOutput> {
        let course_title = match course_name {
            Some(name) => match self.index.resolve_title(name).await? {
                Some(title) => Some(title),
                None => return Ok(ToolOutput::Miss(format!("No course found matching '{}'", name))),
            },
            None => None,
        };

        let filter = SearchFilter::new(course_title, lesson_number);
        debug!("Searching content with filter {:?}", filter);
        let outcome = self.index.search(query, &filter).await;

        if let Some(error) = &outcome.error {
            return Ok(ToolOutput::Miss(error.clone()));
        }

        if outcome.is_empty() {
            let mut message = "No relevant content found".to_string();
            if let Some(name) = course_name {
                message.push_str(&format!(" in course '{}'", name));
            }
            if let Some(lesson) = lesson_number {
                message.push_str(&format!(" in lesson {}", lesson));
            }
            return Ok(ToolOutput::Miss(message));
        }

        let (text, records) = self.format_results(&outcome).await?;
        *sources = records;
        Ok(ToolOutput::Found(text))
    }

    /// Render result blocks and the matching source records.
    async fn format_results(&self, outcome: &SearchOutcome) -> Result<(String, Vec<String>)> {
        let mut blocks = Vec::with_capacity(outcome.len());
        let mut records = Vec::with_capacity(outcome.len());

        for (document, metadata) in outcome.hits() {
            let title = metadata.course_title.as_deref().unwrap_or(UNKNOWN_COURSE);

            let (header, mut record) = match metadata.lesson_number {
                Some(lesson) => (
                    format!("[{} - Lesson {}]", title, lesson),
                    format!("{} - Lesson {}", title, lesson),
                ),
                None => (format!("[{}]", title), title.to_string()),
            };

            if let Some(lesson) = metadata.lesson_number.filter(|_| title != UNKNOWN_COURSE) {
                if let Some(link) = self.index.lesson_link(title, lesson).await? {
                    record.push('|');
                    record.push_str(&link);
                }
            }

            blocks.push(format!("{}\n{}", header, document));
            records.push(record);
        }

        Ok((blocks.join("\n\n"), records))
    }
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: SEARCH_TOOL_NAME.to_string(),
            description: "Search course materials with smart course name matching and lesson filtering"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, arguments: &Value, sources: &mut Vec<String>) -> Result<ToolOutput> {
        let args: SearchArgs = parse_arguments(SEARCH_TOOL_NAME, arguments)?;
        self.search(
            &args.query,
            args.course_name.as_deref(),
            args.lesson_number,
            sources,
        )
        .await
    }
}
