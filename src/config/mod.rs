//! Configuration module for Lectern.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::Prompts;
pub use settings::{
    EmbeddingSettings, GeneralSettings, IndexSettings, IngestSettings, PromptSettings,
    ReasoningSettings, SessionSettings, Settings,
};
