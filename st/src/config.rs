//! SmartTasks configuration types and loading

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Main SmartTasks configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Gateway listen address
    pub server: ServerConfig,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Gateway client used by the CLI
    pub client: ClientConfig,

    /// Durable slot storage
    pub storage: StorageConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        self.llm.resolve()?;

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(eyre::eyre!(
                "llm.temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(eyre::eyre!("llm.max-tokens must be greater than zero"));
        }
        if self.llm.timeout_ms == 0 || self.client.timeout_ms == 0 {
            return Err(eyre::eyre!("timeout-ms values must be greater than zero"));
        }
        Ok(())
    }

    /// Whether a credential is present for any provider
    pub fn credentials_configured(&self) -> bool {
        Provider::ALL
            .iter()
            .any(|&p| std::env::var(self.llm.provider_config(p).api_key_env(p)).is_ok_and(|v| !v.trim().is_empty()))
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file_chain(config_path)?;
        config.server.apply_port_override(std::env::var("PORT").ok().as_deref())?;
        Ok(config)
    }

    fn load_file_chain(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidate_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Project-local `.smarttasks.yml`, then `~/.config/smarttasks/smarttasks.yml`
    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".smarttasks.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("smarttasks").join("smarttasks.yml"));
        }
        paths
    }

    /// Read only `log-level`, before logging is initialized
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        #[derive(Deserialize)]
        struct LogLevelOnly {
            #[serde(rename = "log-level")]
            log_level: Option<String>,
        }

        let path = match config_path {
            Some(path) => path.clone(),
            None => Self::candidate_paths().into_iter().find(|p| p.exists())?,
        };
        let content = fs::read_to_string(path).ok()?;
        serde_yaml::from_str::<LogLevelOnly>(&content).ok()?.log_level
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Gateway listen address
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// Apply a `PORT` value on top of the file setting
    pub fn apply_port_override(&mut self, port: Option<&str>) -> Result<()> {
        if let Some(port) = port.map(str::trim).filter(|p| !p.is_empty()) {
            debug!(%port, "apply_port_override: overriding port");
            self.port = port.parse().context(format!("Invalid PORT value '{}'", port))?;
        }
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAi,
    Gemini,
    Anthropic,
    Groq,
}

impl Provider {
    pub const ALL: [Provider; 4] = [Provider::OpenAi, Provider::Gemini, Provider::Anthropic, Provider::Groq];

    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Gemini => "gemini",
            Provider::Anthropic => "anthropic",
            Provider::Groq => "groq",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-3.5-turbo",
            Provider::Gemini => "gemini-pro",
            Provider::Anthropic => "claude-3-sonnet-20240229",
            Provider::Groq => "llama-3.1-8b-instant",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com",
            Provider::Gemini => "https://generativelanguage.googleapis.com",
            Provider::Anthropic => "https://api.anthropic.com",
            Provider::Groq => "https://api.groq.com/openai",
        }
    }

    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Groq => "GROQ_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        Provider::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| eyre::eyre!("Unknown LLM provider: '{}'. Supported: openai, gemini, anthropic, groq", s))
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: openai, gemini, anthropic or groq
    pub provider: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    pub temperature: f32,

    /// Outbound request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    pub openai: ProviderConfig,
    pub gemini: ProviderConfig,
    pub anthropic: ProviderConfig,
    pub groq: ProviderConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            max_tokens: 1000,
            temperature: 0.3,
            timeout_ms: 60_000,
            openai: ProviderConfig::default(),
            gemini: ProviderConfig::default(),
            anthropic: ProviderConfig::default(),
            groq: ProviderConfig::default(),
        }
    }
}

impl LlmConfig {
    pub fn provider_config(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Gemini => &self.gemini,
            Provider::Anthropic => &self.anthropic,
            Provider::Groq => &self.groq,
        }
    }

    /// Resolve the selected provider, filling unset fields from its defaults
    pub fn resolve(&self) -> Result<ResolvedLlmConfig> {
        let provider: Provider = self.provider.parse()?;
        let overrides = self.provider_config(provider);
        debug!(%provider, "resolve: called");

        Ok(ResolvedLlmConfig {
            provider,
            model: overrides.model(provider).to_string(),
            base_url: overrides.base_url(provider).trim_end_matches('/').to_string(),
            api_key_env: overrides.api_key_env(provider).to_string(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout_ms: self.timeout_ms,
        })
    }
}

/// Per-provider overrides; unset fields fall back to the provider defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub model: Option<String>,

    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: Option<String>,
}

impl ProviderConfig {
    pub fn model(&self, provider: Provider) -> &str {
        self.model.as_deref().unwrap_or(provider.default_model())
    }

    pub fn base_url(&self, provider: Provider) -> &str {
        self.base_url.as_deref().unwrap_or(provider.default_base_url())
    }

    pub fn api_key_env(&self, provider: Provider) -> &str {
        self.api_key_env.as_deref().unwrap_or(provider.default_api_key_env())
    }
}

/// Fully resolved settings for the selected provider
#[derive(Debug, Clone)]
pub struct ResolvedLlmConfig {
    pub provider: Provider,
    pub model: String,
    pub base_url: String,
    pub api_key_env: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_ms: u64,
}

impl ResolvedLlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| eyre::eyre!("API key not found. Set the {} environment variable.", self.api_key_env))
    }
}

/// Gateway client settings used by the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Gateway base URL
    #[serde(rename = "api-url")]
    pub api_url: String,

    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            timeout_ms: taskstore::DEFAULT_CLIENT_TIMEOUT_MS,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the durable slots
    #[serde(rename = "data-dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: taskstore::FileStorage::default_dir(),
        }
    }
}
