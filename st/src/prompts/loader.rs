//! Prompt Loader
//!
//! Renders the embedded templates with a Handlebars engine.

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;

/// Context for the prioritization prompt
#[derive(Debug, Clone, Serialize)]
pub struct PrioritizeContext {
    /// Tasks as `1. first`, `2. second`, ... joined by newlines
    pub task_list: String,
}

impl PrioritizeContext {
    pub fn new(tasks: &[String]) -> Self {
        let task_list = tasks
            .iter()
            .enumerate()
            .map(|(index, task)| format!("{}. {}", index + 1, task))
            .collect::<Vec<_>>()
            .join("\n");
        Self { task_list }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    hbs: Handlebars<'static>,
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptLoader {
    pub fn new() -> Self {
        let mut hbs = Handlebars::new();
        // Task text is sent to the model verbatim, not HTML
        hbs.register_escape_fn(handlebars::no_escape);
        Self { hbs }
    }

    fn load_template(&self, name: &str) -> Result<&'static str> {
        embedded::get_embedded(name).ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        let template = self.load_template(template_name)?;
        debug!(%template_name, "render: called");

        self.hbs
            .render_template(template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// Render the prioritization prompt for the given tasks, in order
    pub fn prioritize_prompt(&self, tasks: &[String]) -> Result<String> {
        self.render("prioritize", &PrioritizeContext::new(tasks))
    }
}
