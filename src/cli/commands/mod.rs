//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod courses;
mod ingest;
mod outline;
mod search;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use courses::run_courses;
pub use ingest::run_ingest;
pub use outline::run_outline;
pub use search::run_search;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use anyhow::Result;

/// Run a pre-flight check, reporting failures to the user.
fn require(operation: Operation) -> Result<()> {
    if let Err(e) = preflight::check(operation) {
        Output::error(&e.to_string());
        return Err(e.into());
    }
    Ok(())
}
