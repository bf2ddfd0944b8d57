//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// SmartTasks - AI-assisted task prioritization
#[derive(Parser)]
#[command(
    name = "st",
    about = "Keep a task list and let an LLM prioritize it",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the prioritization gateway
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Add a task
    Add {
        /// Task description
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Replace a task's description
    Edit {
        /// Task ID (or unique prefix)
        id: String,

        /// New description
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Remove a task
    #[command(alias = "remove")]
    Rm {
        /// Task ID (or unique prefix)
        id: String,
    },

    /// List tasks
    #[command(alias = "ls")]
    List,

    /// Remove all tasks and results
    Clear,

    /// Send the task list to the gateway and show the grouped result
    Prioritize,

    /// Show the last prioritization result
    Results,

    /// Check that the gateway is up
    Health,
}

/// Path of the log file written by `st`
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("smarttasks")
        .join("logs")
        .join("smarttasks.log")
}

/// Text appended to `--help`
pub fn generate_after_help() -> String {
    format!("Logs are written to: {}", get_log_path().display())
}
