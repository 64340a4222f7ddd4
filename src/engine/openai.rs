//! OpenAI chat-completions reasoning engine.

use super::{
    ContentBlock, EngineRequest, EngineResponse, ReasoningEngine, StopReason, ToolInvocation,
    Turn,
};
use crate::agent::ToolSchema;
use crate::config::ReasoningSettings;
use crate::error::{LecternError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolChoiceOption, ChatCompletionToolType,
    CreateChatCompletionRequestArgs, FinishReason, FunctionCall, FunctionObject,
};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Reasoning engine backed by the OpenAI chat completions API.
pub struct OpenAIEngine {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIEngine {
    /// Create an engine from the reasoning settings section.
    pub fn from_settings(settings: &ReasoningSettings) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(
                settings.request_timeout_secs,
            ))?,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Convert a tool call. Unparsable arguments are kept as the raw string so
    /// the tool rejects them.
    fn invocation(call: ChatCompletionMessageToolCall) -> ToolInvocation {
        let arguments = serde_json::from_str(&call.function.arguments).unwrap_or_else(|e| {
            warn!(
                "Failed to parse arguments for tool {}: {}",
                call.function.name, e
            );
            Value::String(call.function.arguments.clone())
        });
        ToolInvocation {
            id: call.id,
            name: call.function.name,
            arguments,
        }
    }

    fn build_messages(system: &str, turns: &[Turn]) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system.to_string())
                .build()
                .map_err(|e| LecternError::Reasoning(e.to_string()))?
                .into(),
        ];

        for turn in turns {
            match turn {
                Turn::User(text) => messages.push(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(text.clone())
                        .build()
                        .map_err(|e| LecternError::Reasoning(e.to_string()))?
                        .into(),
                ),
                Turn::Assistant(blocks) => {
                    messages.push(Self::assistant_message(blocks)?);
                }
                Turn::ToolResults(results) => {
                    for result in results {
                        messages.push(
                            ChatCompletionRequestToolMessageArgs::default()
                                .tool_call_id(&result.invocation_id)
                                .content(result.content.clone())
                                .build()
                                .map_err(|e| LecternError::Reasoning(e.to_string()))?
                                .into(),
                        );
                    }
                }
            }
        }

        Ok(messages)
    }

    fn assistant_message(blocks: &[ContentBlock]) -> Result<ChatCompletionRequestMessage> {
        let text: Vec<&str> = blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text(t) => Some(t.as_str()),
                ContentBlock::ToolUse(_) => None,
            })
            .collect();

        let tool_calls: Vec<ChatCompletionMessageToolCall> = blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse(invocation) => Some(ChatCompletionMessageToolCall {
                    id: invocation.id.clone(),
                    r#type: ChatCompletionToolType::Function,
                    function: FunctionCall {
                        name: invocation.name.clone(),
                        arguments: invocation.arguments.to_string(),
                    },
                }),
                ContentBlock::Text(_) => None,
            })
            .collect();

        let mut args = ChatCompletionRequestAssistantMessageArgs::default();
        if !text.is_empty() {
            args.content(text.join("\n"));
        }
        if !tool_calls.is_empty() {
            args.tool_calls(tool_calls);
        }

        Ok(args
            .build()
            .map_err(|e| LecternError::Reasoning(e.to_string()))?
            .into())
    }

    fn tool_definitions(schemas: &[ToolSchema]) -> Vec<ChatCompletionTool> {
        schemas
            .iter()
            .map(|schema| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: schema.name.clone(),
                    description: Some(schema.description.clone()),
                    parameters: Some(schema.parameters.clone()),
                    strict: None,
                },
            })
            .collect()
    }

    fn stop_reason(reason: Option<FinishReason>) -> StopReason {
        match reason {
            Some(FinishReason::Stop) => StopReason::EndTurn,
            Some(FinishReason::ToolCalls) | Some(FinishReason::FunctionCall) => {
                StopReason::ToolUse
            }
            Some(FinishReason::Length) => StopReason::MaxTokens,
            Some(FinishReason::ContentFilter) => StopReason::Other("content_filter".to_string()),
            None => StopReason::Other("unspecified".to_string()),
        }
    }
}

#[async_trait]
impl ReasoningEngine for OpenAIEngine {
    #[instrument(skip(self, request), fields(turns = request.turns.len(), tools = request.tools.is_some()))]
    async fn complete(&self, request: EngineRequest<'_>) -> Result<EngineResponse> {
        let messages = Self::build_messages(request.system, request.turns)?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_completion_tokens(self.max_tokens);
        if let Some(schemas) = request.tools {
            args.tools(Self::tool_definitions(schemas))
                .tool_choice(ChatCompletionToolChoiceOption::Auto);
        }
        let chat_request = args
            .build()
            .map_err(|e| LecternError::Reasoning(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| LecternError::OpenAI(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LecternError::Reasoning("No response from model".to_string()))?;

        let mut content = Vec::new();
        if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
            content.push(ContentBlock::Text(text));
        }
        for call in choice.message.tool_calls.unwrap_or_default() {
            content.push(ContentBlock::ToolUse(Self::invocation(call)));
        }

        let stop_reason = Self::stop_reason(choice.finish_reason);
        debug!("Engine stopped with {:?}", stop_reason);

        Ok(EngineResponse {
            stop_reason,
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ToolResult;
    use serde_json::json;

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(
            OpenAIEngine::stop_reason(Some(FinishReason::ToolCalls)),
            StopReason::ToolUse
        );
        assert_eq!(
            OpenAIEngine::stop_reason(Some(FinishReason::Stop)),
            StopReason::EndTurn
        );
        assert_eq!(
            OpenAIEngine::stop_reason(Some(FinishReason::Length)),
            StopReason::MaxTokens
        );
        assert!(matches!(
            OpenAIEngine::stop_reason(None),
            StopReason::Other(_)
        ));
    }

    #[test]
    fn test_tool_results_become_one_message_each() {
        let turns = vec![
            Turn::User("What is ownership?".to_string()),
            Turn::Assistant(vec![
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
            ]),
            Turn::ToolResults(vec![
                ToolResult {
                    invocation_id: "call_1".to_string(),
                    content: "found".to_string(),
                },
                ToolResult {
                    invocation_id: "call_2".to_string(),
                    content: "outline".to_string(),
                },
            ]),
        ];

        let messages = OpenAIEngine::build_messages("system", &turns).unwrap();
        // system + user + assistant + two tool messages
        assert_eq!(messages.len(), 5);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(messages[4], ChatCompletionRequestMessage::Tool(_)));
    }

    #[test]
    fn test_tool_definitions_carry_schema() {
        let schemas = vec![ToolSchema {
            name: "get_course_outline".to_string(),
            description: "Outline".to_string(),
            parameters: json!({"type": "object", "required": ["course_name"]}),
        }];

        let tools = OpenAIEngine::tool_definitions(&schemas);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].function.name, "get_course_outline");
        assert_eq!(
            tools[0].function.parameters.as_ref().unwrap()["required"][0],
            "course_name"
        );
    }

    fn tool_call(arguments: &str) -> ChatCompletionMessageToolCall {
        ChatCompletionMessageToolCall {
            id: "call_1".to_string(),
            r#type: ChatCompletionToolType::Function,
            function: FunctionCall {
                name: "search_course_content".to_string(),
                arguments: arguments.to_string(),
            },
        }
    }

    #[test]
    fn test_invocation_parses_arguments() {
        let invocation = OpenAIEngine::invocation(tool_call(r#"{"query": "ownership"}"#));
        assert_eq!(invocation.id, "call_1");
        assert_eq!(invocation.arguments, json!({"query": "ownership"}));
    }

    #[test]
    fn test_unparsable_arguments_are_kept_raw() {
        let invocation = OpenAIEngine::invocation(tool_call(""));
        assert_eq!(invocation.arguments, Value::String(String::new()));

        let invocation = OpenAIEngine::invocation(tool_call(r#"{"query": "own"#));
        assert_eq!(invocation.arguments, json!(r#"{"query": "own"#));
    }

    #[test]
    fn test_engine_from_settings() {
        let engine = OpenAIEngine::from_settings(&ReasoningSettings::default()).unwrap();
        assert_eq!(engine.model(), "gpt-4o-mini");
    }
}
