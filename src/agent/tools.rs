//! Tool trait, per-query source accumulation, and the tool registry.

use crate::error::{LecternError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Capability schema advertised to the reasoning engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON-Schema object with `properties` and `required`.
    pub parameters: Value,
}

/// Expected outcome of a tool call, shown to the engine as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    /// The tool produced content.
    Found(String),
    /// Nothing matched: no course, no content, unknown tool, or an index-layer
    /// failure reported in the search outcome.
    Miss(String),
}

impl ToolOutput {
    pub fn text(&self) -> &str {
        match self {
            ToolOutput::Found(text) | ToolOutput::Miss(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ToolOutput::Found(text) | ToolOutput::Miss(text) => text,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ToolOutput::Found(_))
    }
}

/// A retrieval capability the engine can invoke by name.
///
/// Tools hold no per-query state. Anything a call wants to cite goes into the
/// `sources` slot handed to it for the current query.
#[async_trait]
pub trait Tool: Send + Sync {
    fn schema(&self) -> ToolSchema;

    /// Run the tool. `Err` is a hard failure that aborts the query.
    async fn execute(&self, arguments: &Value, sources: &mut Vec<String>) -> Result<ToolOutput>;
}

/// Mutable state owned by one top-level query.
#[derive(Debug, Default)]
pub struct QueryContext {
    sources: HashMap<String, Vec<String>>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, tool: &str) -> &mut Vec<String> {
        self.sources.entry(tool.to_string()).or_default()
    }

    fn recorded(&self, tool: &str) -> &[String] {
        self.sources.get(tool).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Deserialize tool arguments, mapping failures to [`LecternError::InvalidInput`].
pub(crate) fn parse_arguments<T: serde::de::DeserializeOwned>(
    tool: &str,
    arguments: &Value,
) -> Result<T> {
    serde_json::from_value(arguments.clone())
        .map_err(|e| LecternError::InvalidInput(format!("Invalid arguments for {}: {}", tool, e)))
}

/// Name-keyed directory of tools, in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<(ToolSchema, Arc<dyn Tool>)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its schema name.
    ///
    /// Registering an existing name replaces that tool in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let schema = tool.schema();
        if schema.name.trim().is_empty() {
            return Err(LecternError::Config(
                "tool schema must declare a name".to_string(),
            ));
        }

        debug!("Registering tool {}", schema.name);
        match self.tools.iter_mut().find(|(s, _)| s.name == schema.name) {
            Some(entry) => *entry = (schema, tool),
            None => self.tools.push((schema, tool)),
        }
        Ok(())
    }

    /// All schemas in registration order.
    pub fn definitions(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|(schema, _)| schema.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Dispatch an invocation. Unknown names yield a soft miss, not an error.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: &Value,
        ctx: &mut QueryContext,
    ) -> Result<ToolOutput> {
        let Some((_, tool)) = self.tools.iter().find(|(s, _)| s.name == name) else {
            return Ok(ToolOutput::Miss(format!("Tool '{}' not found", name)));
        };

        info!("Calling tool {} with {}", name, arguments);
        tool.execute(arguments, ctx.slot(name)).await
    }

    /// Sources recorded during the current query, in registration order.
    pub fn last_sources(&self, ctx: &QueryContext) -> Vec<String> {
        self.tools
            .iter()
            .flat_map(|(schema, _)| ctx.recorded(&schema.name).iter().cloned())
            .collect()
    }

    /// Clear every tool's recorded sources.
    pub fn reset_sources(&self, ctx: &mut QueryContext) {
        for (schema, _) in &self.tools {
            if let Some(slot) = ctx.sources.get_mut(&schema.name) {
                slot.clear();
            }
        }
    }

    /// Read then reset sources in one step.
    pub fn take_sources(&self, ctx: &mut QueryContext) -> Vec<String> {
        let sources = self.last_sources(ctx);
        self.reset_sources(ctx);
        sources
    }
}
