//! CLI output formatting utilities.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print cited sources, one per line, with links dimmed.
    pub fn sources(sources: &[String]) {
        if sources.is_empty() {
            return;
        }
        Output::header("Sources");
        for source in sources {
            let (label, link) = split_source(source);
            match link {
                Some(link) => println!("  {} {} {}", style("*").cyan(), label, style(link).dim()),
                None => Output::list_item(label),
            }
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Split a source record into its label and optional link.
fn split_source(source: &str) -> (&str, Option<&str>) {
    match source.split_once('|') {
        Some((label, link)) if !link.is_empty() => (label, Some(link)),
        Some((label, _)) => (label, None),
        None => (source, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_source() {
        assert_eq!(
            split_source("Python Basics - Lesson 1|https://example.com/1"),
            ("Python Basics - Lesson 1", Some("https://example.com/1"))
        );
        assert_eq!(
            split_source("Python Basics - Lesson 2"),
            ("Python Basics - Lesson 2", None)
        );
        assert_eq!(split_source("Python Basics|"), ("Python Basics", None));
    }
}
