//! SmartTasks - AI-assisted task prioritization
//!
//! A persistent task list (the `taskstore` crate) paired with a small HTTP
//! gateway that asks an LLM to assign each task a priority and a category.
//!
//! # Modules
//!
//! - [`gateway`] - axum server exposing `/api/health` and `/api/prioritize`
//! - [`llm`] - LLM client trait and the OpenAI, Groq, Gemini and Anthropic backends
//! - [`prompts`] - Embedded Handlebars prompt templates
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod gateway;
pub mod llm;
pub mod prompts;
