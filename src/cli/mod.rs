//! CLI module for Lectern.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lectern - answers questions about your course materials
///
/// Ingest course documents into a local semantic index, then ask questions
/// that are answered with citations to the lessons they came from.
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index a course document or a folder of them
    Ingest {
        /// Course document (.txt/.md) or folder
        path: PathBuf,

        /// Clear the index before ingesting a folder
        #[arg(long)]
        clear: bool,
    },

    /// Ask a question about the indexed courses
    Ask {
        /// The question to ask
        question: String,

        /// Maximum tool-calling rounds (overrides config)
        #[arg(short = 'r', long)]
        max_rounds: Option<usize>,
    },

    /// Start an interactive chat session with conversation history
    Chat {
        /// Maximum tool-calling rounds (overrides config)
        #[arg(short = 'r', long)]
        max_rounds: Option<usize>,
    },

    /// Search course content directly, without the reasoning engine
    Search {
        /// Search query
        query: String,

        /// Restrict to a course (partial names work)
        #[arg(long)]
        course: Option<String>,

        /// Restrict to a lesson number
        #[arg(long)]
        lesson: Option<i64>,
    },

    /// Show a course outline
    Outline {
        /// Course name (partial names work)
        course: String,
    },

    /// List indexed courses
    Courses,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search_filters() {
        let cli = Cli::parse_from([
            "lectern", "search", "loops", "--course", "Python", "--lesson", "2",
        ]);
        match cli.command {
            Commands::Search {
                query,
                course,
                lesson,
            } => {
                assert_eq!(query, "loops");
                assert_eq!(course.as_deref(), Some("Python"));
                assert_eq!(lesson, Some(2));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ask_with_rounds_and_verbosity() {
        let cli = Cli::parse_from(["lectern", "-vv", "ask", "What is MCP?", "-r", "3"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::Ask { max_rounds: Some(3), .. }
        ));
    }
}
