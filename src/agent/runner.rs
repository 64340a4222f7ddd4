//! Multi-round tool-calling loop.

use super::tools::{QueryContext, ToolRegistry};
use crate::config::Prompts;
use crate::engine::{
    EngineRequest, EngineResponse, ReasoningEngine, StopReason, ToolInvocation, ToolResult, Turn,
};
use crate::error::Result;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Answer returned when a tool fails hard.
pub const TOOL_FAILURE_APOLOGY: &str =
    "I encountered an error while searching for information. Please try again.";

/// Answer returned when the engine produced no text at all.
pub const NO_ANSWER_FALLBACK: &str = "No answer text was produced for this question.";

/// Default number of tool-calling rounds.
pub const DEFAULT_MAX_ROUNDS: usize = 2;

/// A single question put to the agent.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Text sent as the user turn.
    pub text: String,
    pub session_id: Option<String>,
    /// Prior conversation, appended to the system prompt.
    pub history: Option<String>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_history(mut self, history: Option<String>) -> Self {
        self.history = history;
        self
    }

    pub fn with_session(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }
}

/// How the loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// No tools were offered; a single engine call answered.
    Direct,
    /// The engine stopped without requesting tools.
    Natural,
    /// The round limit was reached and a tool-less call produced the answer.
    Synthesized,
    /// A tool failed hard.
    Failed,
}

/// Result of one orchestration run.
#[derive(Debug)]
pub struct Generation {
    pub answer: String,
    /// Turns sent to the engine, excluding the final response.
    pub transcript: Vec<Turn>,
    /// Rounds that executed tools.
    pub rounds: usize,
    pub completion: Completion,
}

/// Agent that drives the reasoning engine through tool-calling rounds.
pub struct Agent {
    engine: Arc<dyn ReasoningEngine>,
    system_prompt: String,
    max_rounds: usize,
}

impl Agent {
    /// Create an agent with the default prompt and round limit.
    pub fn new(engine: Arc<dyn ReasoningEngine>) -> Self {
        Self {
            engine,
            system_prompt: Prompts::default().system_prompt(DEFAULT_MAX_ROUNDS),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Set a custom system prompt.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Set the maximum number of tool-calling rounds. Zero answers without tools.
    pub fn with_max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = max;
        self
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    fn system_for(&self, query: &Query) -> String {
        match query.history.as_deref().filter(|h| !h.is_empty()) {
            Some(history) => format!("{}\n\nPrevious conversation:\n{}", self.system_prompt, history),
            None => self.system_prompt.clone(),
        }
    }

    /// Answer a query, executing tools from `tools` as the engine requests.
    ///
    /// Engine failures propagate as `Err`. Tool failures end the run with
    /// [`TOOL_FAILURE_APOLOGY`] and [`Completion::Failed`].
    #[instrument(skip_all, fields(session = query.session_id.as_deref().unwrap_or("none")))]
    pub async fn generate(
        &self,
        query: &Query,
        tools: Option<&ToolRegistry>,
        ctx: &mut QueryContext,
    ) -> Result<Generation> {
        let system = self.system_for(query);
        let mut turns = vec![Turn::User(query.text.clone())];

        let Some(registry) = tools.filter(|r| !r.is_empty()) else {
            debug!("No tools offered; answering directly");
            let response = self.call(&system, &turns, None).await?;
            return Ok(Self::finish(response, turns, 0, Completion::Direct));
        };

        let schemas = registry.definitions();
        let mut rounds = 0;

        while rounds < self.max_rounds {
            debug!("Round {} of {}", rounds + 1, self.max_rounds);
            let response = self.call(&system, &turns, Some(schemas.as_slice())).await?;

            let invocations: Vec<ToolInvocation> = response.invocations().cloned().collect();
            if response.stop_reason != StopReason::ToolUse || invocations.is_empty() {
                return Ok(Self::finish(response, turns, rounds, Completion::Natural));
            }

            turns.push(Turn::Assistant(response.content));

            let mut results = Vec::with_capacity(invocations.len());
            for invocation in invocations {
                match registry
                    .invoke(&invocation.name, &invocation.arguments, ctx)
                    .await
                {
                    Ok(output) => results.push(ToolResult {
                        invocation_id: invocation.id,
                        content: output.into_text(),
                    }),
                    Err(e) => {
                        error!("Tool {} failed: {}", invocation.name, e);
                        return Ok(Generation {
                            answer: TOOL_FAILURE_APOLOGY.to_string(),
                            transcript: turns,
                            rounds,
                            completion: Completion::Failed,
                        });
                    }
                }
            }

            turns.push(Turn::ToolResults(results));
            rounds += 1;
        }

        info!("Round limit reached after {} rounds; synthesizing", rounds);
        let response = self.call(&system, &turns, None).await?;
        Ok(Self::finish(response, turns, rounds, Completion::Synthesized))
    }

    async fn call(
        &self,
        system: &str,
        turns: &[Turn],
        tools: Option<&[super::ToolSchema]>,
    ) -> Result<EngineResponse> {
        self.engine
            .complete(EngineRequest {
                system,
                turns,
                tools,
            })
            .await
    }

    fn finish(
        response: EngineResponse,
        transcript: Vec<Turn>,
        rounds: usize,
        completion: Completion,
    ) -> Generation {
        let answer = response
            .first_text()
            .unwrap_or(NO_ANSWER_FALLBACK)
            .to_string();
        Generation {
            answer,
            transcript,
            rounds,
            completion,
        }
    }
}
