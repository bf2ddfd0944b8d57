//! SmartTasks - AI-assisted task prioritization
//!
//! CLI entry point: manage the task list, run the gateway, and prioritize.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches};
use colored::{ColoredString, Colorize};
use eyre::{Context, Result};
use tracing::{debug, info};

use smarttasks::cli::{Cli, Command, generate_after_help, get_log_path};
use smarttasks::config::Config;
use smarttasks::gateway;
use taskstore::{FileStorage, HttpPrioritizer, Priority, TaskGroup, TaskStore};

/// Setup logging to file
fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Serve { port } => cmd_serve(config, port).await,
        Command::Add { text } => cmd_add(&config, &text.join(" ")),
        Command::Edit { id, text } => cmd_edit(&config, &id, &text.join(" ")),
        Command::Rm { id } => cmd_rm(&config, &id),
        Command::List => cmd_list(&config),
        Command::Clear => cmd_clear(&config),
        Command::Prioritize => cmd_prioritize(&config).await,
        Command::Results => cmd_results(&config),
        Command::Health => cmd_health(&config).await,
    }
}

fn open_client(config: &Config) -> Result<HttpPrioritizer> {
    HttpPrioritizer::with_timeout(
        config.client.api_url.clone(),
        Duration::from_millis(config.client.timeout_ms),
    )
    .context("Failed to create gateway client")
}

fn open_store(config: &Config) -> Result<TaskStore> {
    debug!(data_dir = ?config.storage.data_dir, "open_store: called");
    let storage = FileStorage::open(&config.storage.data_dir).context(format!(
        "Failed to open storage at {}",
        config.storage.data_dir.display()
    ))?;
    Ok(TaskStore::open(Box::new(storage), Arc::new(open_client(config)?)))
}

/// Resolve a full task id from a unique prefix
fn resolve_id(store: &TaskStore, prefix: &str) -> Result<String> {
    let matches: Vec<String> = store
        .tasks()
        .into_iter()
        .filter(|t| t.id.starts_with(prefix))
        .map(|t| t.id)
        .collect();

    match matches.as_slice() {
        [id] => Ok(id.clone()),
        [] => Err(eyre::eyre!("No task matches '{}'", prefix)),
        _ => Err(eyre::eyre!(
            "'{}' matches {} tasks; use a longer prefix",
            prefix,
            matches.len()
        )),
    }
}

fn priority_label(priority: Priority) -> ColoredString {
    let label = format!("{} Priority", priority);
    match priority {
        Priority::High => label.red().bold(),
        Priority::Medium => label.yellow().bold(),
        Priority::Low => label.green().bold(),
    }
}

fn print_groups(groups: &[TaskGroup]) {
    for group in groups {
        println!("{} ({})", priority_label(group.priority), group.tasks.len());
        for task in &group.tasks {
            println!("  • {} {}", task.task, format!("[{}]", task.category).dimmed());
        }
    }
}

async fn cmd_serve(mut config: Config, port: Option<u16>) -> Result<()> {
    debug!(?port, "cmd_serve: called");
    if let Some(port) = port {
        config.server.port = port;
    }
    println!(
        "{} Gateway on http://{} (AI service: {})",
        "→".cyan(),
        config.server.addr(),
        config.llm.provider
    );
    gateway::run(&config).await
}

fn cmd_add(config: &Config, text: &str) -> Result<()> {
    debug!(%text, "cmd_add: called");
    let store = open_store(config)?;
    let task = store.add_task(text)?;
    println!("{} Added {}", "✓".green(), task.id.cyan());
    Ok(())
}

fn cmd_edit(config: &Config, prefix: &str, text: &str) -> Result<()> {
    debug!(%prefix, %text, "cmd_edit: called");
    let store = open_store(config)?;
    let id = resolve_id(&store, prefix)?;
    store.edit_task(&id, text)?;
    println!("{} Updated {}", "✓".green(), id.cyan());
    Ok(())
}

fn cmd_rm(config: &Config, prefix: &str) -> Result<()> {
    debug!(%prefix, "cmd_rm: called");
    let store = open_store(config)?;
    let id = resolve_id(&store, prefix)?;
    store.remove_task(&id);
    println!("{} Removed {}", "✓".green(), id.cyan());
    Ok(())
}

fn cmd_list(config: &Config) -> Result<()> {
    debug!("cmd_list: called");
    let store = open_store(config)?;
    let tasks = store.tasks();
    if tasks.is_empty() {
        println!("No tasks yet. Add one with `st add <text>`.");
        return Ok(());
    }

    for task in &tasks {
        println!("{}  {}", task.id.dimmed(), task.text);
    }
    println!("{} task(s)", tasks.len());
    Ok(())
}

fn cmd_clear(config: &Config) -> Result<()> {
    debug!("cmd_clear: called");
    open_store(config)?.clear_all();
    println!("{} Cleared all tasks and results", "✓".green());
    Ok(())
}

async fn cmd_prioritize(config: &Config) -> Result<()> {
    debug!("cmd_prioritize: called");
    let store = open_store(config)?;
    let count = store.prioritize().await?;
    println!("{} Prioritized {} task(s)", "✓".green(), count);
    print_groups(&store.grouped());
    Ok(())
}

fn cmd_results(config: &Config) -> Result<()> {
    debug!("cmd_results: called");
    let groups = open_store(config)?.grouped();
    if groups.is_empty() {
        println!("No prioritized tasks yet. Run `st prioritize`.");
        return Ok(());
    }
    print_groups(&groups);
    Ok(())
}

async fn cmd_health(config: &Config) -> Result<()> {
    debug!("cmd_health: called");
    let health = open_client(config)?.check_health().await?;
    println!(
        "{} {} at {} (AI service: {})",
        "✓".green(),
        health.status,
        config.client.api_url,
        health.ai_service.cyan()
    );
    Ok(())
}
