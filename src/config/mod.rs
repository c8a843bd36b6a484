//! Configuration loading and validation.
//!
//! Behavior knobs live in a TOML file with per-field defaults; secrets are
//! resolved from environment variables named *by* the config, never stored
//! in it. A handful of rate-limit knobs can also be overridden directly
//! from the environment for deployments that only get env vars.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::riot::budget::WindowLimit;
use crate::riot::retry::RetryPolicy;
use crate::riot::RiotClientConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("missing secret: environment variable {0} is not set")]
    MissingSecret(String),
}

/// Riot API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiotConfig {
    /// Platform region, e.g. "na1"
    #[serde(default = "default_region")]
    pub region: String,

    /// Regional routing value for match-v5, e.g. "americas"
    #[serde(default = "default_routing")]
    pub routing: String,

    /// Environment variable holding the API key
    #[serde(default = "default_riot_key_env")]
    pub api_key_env: String,

    /// Burst limit
    #[serde(default = "default_burst_requests")]
    pub burst_requests_per_window: u32,

    #[serde(default = "default_burst_window")]
    pub burst_window_seconds: u64,

    /// Sustained limit
    #[serde(default = "default_requests")]
    pub requests_per_window: u32,

    #[serde(default = "default_window")]
    pub window_seconds: u64,

    /// Total attempts per request, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Network timeout per request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// How long a caller may wait for a rate-limit slot
    #[serde(default = "default_budget_wait")]
    pub budget_wait_timeout_seconds: u64,
}

fn default_region() -> String {
    "na1".to_string()
}

fn default_routing() -> String {
    "americas".to_string()
}

fn default_riot_key_env() -> String {
    "RIOT_API_KEY".to_string()
}

// Riot development-key limits.
fn default_burst_requests() -> u32 {
    20
}

fn default_burst_window() -> u64 {
    1
}

fn default_requests() -> u32 {
    100
}

fn default_window() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    5
}

fn default_request_timeout() -> u64 {
    10
}

fn default_budget_wait() -> u64 {
    120
}

impl Default for RiotConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            routing: default_routing(),
            api_key_env: default_riot_key_env(),
            burst_requests_per_window: default_burst_requests(),
            burst_window_seconds: default_burst_window(),
            requests_per_window: default_requests(),
            window_seconds: default_window(),
            max_retries: default_max_retries(),
            request_timeout_seconds: default_request_timeout(),
            budget_wait_timeout_seconds: default_budget_wait(),
        }
    }
}

impl RiotConfig {
    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.api_key_env)
            .map_err(|_| ConfigError::MissingSecret(self.api_key_env.clone()))
    }

    /// The budget windows this config describes: burst first, sustained
    /// second.
    pub fn window_limits(&self) -> Vec<WindowLimit> {
        vec![
            WindowLimit::new(self.burst_requests_per_window, self.burst_window_seconds),
            WindowLimit::new(self.requests_per_window, self.window_seconds),
        ]
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
    }

    pub fn client_config(&self) -> RiotClientConfig {
        RiotClientConfig {
            region: self.region.clone(),
            routing: self.routing.clone(),
            retry: self.retry_policy(),
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
            budget_wait_timeout: Duration::from_secs(self.budget_wait_timeout_seconds),
        }
    }
}

/// Hosted-model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,

    #[serde(default = "default_ai_model")]
    pub model: String,

    /// Environment variable holding the model API key
    #[serde(default = "default_ai_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_ai_timeout")]
    pub timeout_seconds: u64,
}

fn default_ai_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_ai_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_ai_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_ai_timeout() -> u64 {
    120
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: default_ai_base_url(),
            model: default_ai_model(),
            api_key_env: default_ai_key_env(),
            timeout_seconds: default_ai_timeout(),
        }
    }
}

/// Report run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Challenger players sampled per run
    #[serde(default = "default_top_players")]
    pub top_players: usize,

    #[serde(default = "default_matches_per_player")]
    pub matches_per_player: u32,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./reports")
}

fn default_top_players() -> usize {
    10
}

fn default_matches_per_player() -> u32 {
    5
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            top_players: default_top_players(),
            matches_per_player: default_matches_per_player(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub riot: RiotConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file, apply environment overrides,
    /// and validate.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&contents)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults (plus environment overrides) when no config file exists.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            let mut config = AppConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }

    /// Rate-limit and retry knobs can be overridden straight from the
    /// environment.
    fn apply_env_overrides(&mut self) {
        if let Some(requests) = env_parse("RIOT_REQUESTS_PER_WINDOW") {
            self.riot.requests_per_window = requests;
        }
        if let Some(window) = env_parse("RIOT_WINDOW_SECONDS") {
            self.riot.window_seconds = window;
        }
        if let Some(retries) = env_parse("RIOT_MAX_RETRIES") {
            self.riot.max_retries = retries;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.riot.burst_requests_per_window == 0 || self.riot.requests_per_window == 0 {
            return Err(ConfigError::Validation(
                "rate limit window capacity must be greater than 0".to_string(),
            ));
        }
        if self.riot.burst_window_seconds == 0 || self.riot.window_seconds == 0 {
            return Err(ConfigError::Validation(
                "rate limit window duration must be greater than 0".to_string(),
            ));
        }
        if self.riot.max_retries == 0 {
            return Err(ConfigError::Validation(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.riot.request_timeout_seconds == 0 || self.ai.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "timeouts must be greater than 0".to_string(),
            ));
        }
        if self.report.top_players == 0 {
            return Err(ConfigError::Validation(
                "top_players must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
