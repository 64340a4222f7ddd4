//! Course outline tool.

use super::tools::{parse_arguments, Tool, ToolOutput, ToolSchema};
use crate::error::Result;
use crate::index::SemanticIndex;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

#[derive(Debug, Deserialize)]
struct OutlineArgs {
    course_name: String,
}

/// Returns a course's title, link, instructor and lesson list.
///
/// Outlines describe structure rather than quote material, so this tool
/// never records sources.
pub struct CourseOutlineTool {
    index: Arc<dyn SemanticIndex>,
}

impl CourseOutlineTool {
    pub fn new(index: Arc<dyn SemanticIndex>) -> Self {
        Self { index }
    }

    pub async fn outline(&self, course_name: &str) -> Result<ToolOutput> {
        let not_found = || ToolOutput::Miss(format!("No course found matching '{}'", course_name));

        let Some(title) = self.index.resolve_title(course_name).await? else {
            return Ok(not_found());
        };

        Ok(match self.index.course_outline(&title).await? {
            Some(course) => ToolOutput::Found(course.format_outline()),
            None => not_found(),
        })
    }
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: OUTLINE_TOOL_NAME.to_string(),
            description: "Get a course outline: title, link, instructor and the complete lesson list"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work)"
                    }
                },
                "required": ["course_name"]
            }),
        }
    }

    async fn execute(&self, arguments: &Value, _sources: &mut Vec<String>) -> Result<ToolOutput> {
        let args: OutlineArgs = parse_arguments(OUTLINE_TOOL_NAME, arguments)?;
        self.outline(&args.course_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::{Course, Lesson};
    use crate::error::LecternError;
    use crate::index::stub::StubIndex;

    fn python_basics() -> Course {
        Course {
            title: "Python Basics".to_string(),
            link: Some("https://example.com/python".to_string()),
            instructor: Some("Ada".to_string()),
            lessons: vec![
                Lesson {
                    number: 0,
                    title: "Introduction".to_string(),
                    link: None,
                },
                Lesson {
                    number: 1,
                    title: "Variables".to_string(),
                    link: None,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_outline_resolves_fuzzy_name() {
        let index = StubIndex::new()
            .with_course(python_basics())
            .with_resolution("python", "Python Basics");
        let tool = CourseOutlineTool::new(Arc::new(index));

        let mut sources = Vec::new();
        let output = tool
            .execute(&json!({"course_name": "python"}), &mut sources)
            .await
            .unwrap();

        assert!(output.is_found());
        let text = output.text();
        assert!(text.contains("Course: Python Basics"));
        assert!(text.contains("Link: https://example.com/python"));
        assert!(text.contains("Instructor: Ada"));
        assert!(text.contains("0: Introduction\n1: Variables"));
    }

    #[tokio::test]
    async fn test_outline_never_records_sources() {
        let tool = CourseOutlineTool::new(Arc::new(StubIndex::new().with_course(python_basics())));

        let mut sources = vec!["Earlier - Lesson 1".to_string()];
        tool.execute(&json!({"course_name": "Python Basics"}), &mut sources)
            .await
            .unwrap();
        assert_eq!(sources, vec!["Earlier - Lesson 1".to_string()]);

        let mut fresh = Vec::new();
        tool.execute(&json!({"course_name": "Python Basics"}), &mut fresh)
            .await
            .unwrap();
        assert!(fresh.is_empty());
    }

    #[tokio::test]
    async fn test_outline_miss() {
        let tool = CourseOutlineTool::new(Arc::new(StubIndex::new()));
        let output = tool
            .execute(&json!({"course_name": "Cooking"}), &mut Vec::new())
            .await
            .unwrap();
        assert_eq!(
            output,
            ToolOutput::Miss("No course found matching 'Cooking'".to_string())
        );
    }

    #[tokio::test]
    async fn test_outline_requires_course_name() {
        let tool = CourseOutlineTool::new(Arc::new(StubIndex::new()));
        let result = tool.execute(&json!({}), &mut Vec::new()).await;
        assert!(matches!(result, Err(LecternError::InvalidInput(_))));
    }
}
