//! Lectern - question answering over course materials
//!
//! Lectern indexes course documents into a local semantic index and answers
//! questions about them with a tool-calling language model. Answers carry
//! citations to the lessons they were drawn from.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `course` - Course, lesson and chunk records
//! - `ingest` - Course document parsing and chunking
//! - `embedding` - Embedding generation
//! - `index` - Semantic index (course catalog and lesson content)
//! - `engine` - Reasoning engine abstraction and OpenAI implementation
//! - `agent` - Retrieval tools, tool registry and the tool-calling loop
//! - `session` - Conversation history
//! - `rag` - Facade tying the above together
//!
//! # Example
//!
//! ```rust,no_run
//! use lectern::config::Settings;
//! use lectern::rag::RagSystem;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let rag = RagSystem::from_settings(&settings)?;
//!
//!     let response = rag.query("What does lesson 1 of Python Basics cover?", None).await?;
//!     println!("{}", response.answer);
//!     for source in &response.sources {
//!         println!("  {}", source);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod course;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod index;
pub mod ingest;
pub mod openai;
pub mod rag;
pub mod session;

pub use error::{LecternError, Result};
