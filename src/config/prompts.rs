//! Prompt templates for Lectern.
//!
//! Prompts can be customized by placing a `prompts.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    /// System prompt sent with every reasoning-engine call.
    pub system: String,
    /// Wrapper applied to the user's question. Must contain `{{query}}`.
    pub query: String,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            system: r#"You are an assistant for course materials and educational content. You can search lesson content and look up course outlines.

Tool usage:
- You may call tools across up to {{max_rounds}} separate reasoning rounds. Use a later round when the first results show you what to look for next.
- Use 'search_course_content' for questions about what a course or lesson actually teaches.
- Use 'get_course_outline' for questions about course structure: lesson lists, course links, instructors, or what a course covers.
- Pass 'course_name' and 'lesson_number' when the question names them. Partial course names are fine.
- If the tools return nothing relevant, say so plainly and do not invent material.

Answering:
- General knowledge questions can be answered without tools.
- For outline questions, always include the course title, the course link, and the complete numbered lesson list.
- Answer directly. Do not describe your reasoning, the tools, or "the search results".
- Be brief, accurate, and instructive; add a short example when it helps understanding."#
                .to_string(),
            query: "Answer this question about course materials: {{query}}".to_string(),
            variables: HashMap::new(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string()).join("prompts.toml");
            if custom_path.exists() {
                let content = std::fs::read_to_string(&custom_path)?;
                prompts = toml::from_str(&content)?;
            }
        }

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if !prompts.query.contains("{{query}}") {
            return Err(crate::error::LecternError::Config(
                "query prompt must contain the {{query}} placeholder".to_string(),
            ));
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// The system prompt with the round limit filled in.
    pub fn system_prompt(&self, max_rounds: usize) -> String {
        let mut vars = HashMap::new();
        vars.insert("max_rounds".to_string(), max_rounds.to_string());
        self.render_with_custom(&self.system, &vars)
    }

    /// Wrap a user question with the query template.
    pub fn query_prompt(&self, question: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), question.to_string());
        self.render_with_custom(&self.query, &vars)
    }
}
