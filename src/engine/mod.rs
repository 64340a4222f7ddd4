//! Reasoning engine abstraction.
//!
//! The orchestration loop talks to the language model only through
//! [`ReasoningEngine`]. Conversation state is expressed as [`Turn`]s so the
//! loop never touches provider-specific message types.

mod openai;
#[cfg(test)]
pub(crate) mod scripted;

pub use openai::OpenAIEngine;

use crate::agent::ToolSchema;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Why the engine stopped producing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Other(String),
}

/// A tool call requested by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// One block of assistant output.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(String),
    ToolUse(ToolInvocation),
}

/// Output of one tool invocation, paired with the invocation id.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub invocation_id: String,
    pub content: String,
}

/// One entry of the conversation sent to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    User(String),
    Assistant(Vec<ContentBlock>),
    ToolResults(Vec<ToolResult>),
}

/// A single request to the engine.
#[derive(Debug, Clone, Copy)]
pub struct EngineRequest<'a> {
    pub system: &'a str,
    pub turns: &'a [Turn],
    /// Capability schemas; `None` forbids tool use for this call.
    pub tools: Option<&'a [ToolSchema]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineResponse {
    pub stop_reason: StopReason,
    pub content: Vec<ContentBlock>,
}

impl EngineResponse {
    /// A plain text response that ends the turn.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            stop_reason: StopReason::EndTurn,
            content: vec![ContentBlock::Text(text.into())],
        }
    }

    /// A response requesting the given tool invocations.
    pub fn tool_use(invocations: Vec<ToolInvocation>) -> Self {
        Self {
            stop_reason: StopReason::ToolUse,
            content: invocations.into_iter().map(ContentBlock::ToolUse).collect(),
        }
    }

    /// First text block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text(text) => Some(text.as_str()),
            ContentBlock::ToolUse(_) => None,
        })
    }

    /// Tool invocations in emitted order.
    pub fn invocations(&self) -> impl Iterator<Item = &ToolInvocation> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::ToolUse(invocation) => Some(invocation),
            ContentBlock::Text(_) => None,
        })
    }
}

/// Trait for reasoning engine implementations.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Run one completion.
    async fn complete(&self, request: EngineRequest<'_>) -> Result<EngineResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_accessors() {
        let response = EngineResponse {
            stop_reason: StopReason::ToolUse,
            content: vec![
                ContentBlock::Text("Let me look that up.".to_string()),
                ContentBlock::ToolUse(ToolInvocation {
                    id: "call_1".to_string(),
                    name: "search_course_content".to_string(),
                    arguments: json!({"query": "ownership"}),
                }),
                ContentBlock::ToolUse(ToolInvocation {
                    id: "call_2".to_string(),
                    name: "get_course_outline".to_string(),
                    arguments: json!({"course_name": "Rust"}),
                }),
            ],
        };

        assert_eq!(response.first_text(), Some("Let me look that up."));
        let ids: Vec<&str> = response.invocations().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["call_1", "call_2"]);
    }

    #[test]
    fn test_tool_use_response_has_no_text() {
        let response = EngineResponse::tool_use(vec![]);
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.first_text(), None);
    }
}
