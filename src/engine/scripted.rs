//! Scripted engine that replays queued responses, for loop and facade tests.

use super::{EngineRequest, EngineResponse, ReasoningEngine, Turn};
use crate::error::{LecternError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// What the engine saw on one call.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub(crate) system: String,
    pub(crate) turns: Vec<Turn>,
    pub(crate) offered_tools: Option<Vec<String>>,
}

#[derive(Default)]
pub(crate) struct ScriptedEngine {
    responses: Mutex<VecDeque<Result<EngineResponse>>>,
    pub(crate) calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedEngine {
    pub(crate) fn new(responses: Vec<EngineResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            calls: Mutex::default(),
        }
    }

    /// An engine whose every call fails.
    pub(crate) fn failing() -> Self {
        Self::default()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn call(&self, n: usize) -> RecordedCall {
        self.calls.lock().unwrap()[n].clone()
    }
}

#[async_trait]
impl ReasoningEngine for ScriptedEngine {
    async fn complete(&self, request: EngineRequest<'_>) -> Result<EngineResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: request.system.to_string(),
            turns: request.turns.to_vec(),
            offered_tools: request
                .tools
                .map(|tools| tools.iter().map(|t| t.name.clone()).collect()),
        });

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LecternError::Reasoning("engine unavailable".to_string())))
    }
}
