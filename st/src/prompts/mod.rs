//! Prompt templates
//!
//! Templates are compiled into the binary and rendered with Handlebars.

mod embedded;
mod loader;

pub use loader::{PrioritizeContext, PromptLoader};
