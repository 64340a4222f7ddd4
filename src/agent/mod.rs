//! Tool-calling agent over the course index.
//!
//! [`Agent`] drives the reasoning engine through bounded tool-calling rounds.
//! Tools are looked up by name in a [`ToolRegistry`]; anything a tool cites
//! for the current question is kept in a [`QueryContext`] owned by the caller.

mod outline;
mod runner;
mod search;
mod tools;

pub use outline::{CourseOutlineTool, OUTLINE_TOOL_NAME};
pub use runner::{
    Agent, Completion, Generation, Query, DEFAULT_MAX_ROUNDS, NO_ANSWER_FALLBACK,
    TOOL_FAILURE_APOLOGY,
};
pub use search::{CourseSearchTool, SEARCH_TOOL_NAME};
pub use tools::{QueryContext, Tool, ToolOutput, ToolRegistry, ToolSchema};

use crate::error::Result;
use crate::index::SemanticIndex;
use std::sync::Arc;

/// Registry with the content search and course outline tools.
pub fn course_tools(index: Arc<dyn SemanticIndex>) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(CourseSearchTool::new(index.clone())))?;
    registry.register(Arc::new(CourseOutlineTool::new(index)))?;
    Ok(registry)
}
