//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys) are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub forecast: ForecastConfig,
    pub trading: TradingConfig,
    pub markets: MarketsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    pub name: String,
    /// Directory where command results are written.
    pub results_dir: String,
    /// Local cache directories cleared at the start of every session.
    #[serde(default)]
    pub cache_dirs: Vec<String>,
    /// Total session attempts before giving up.
    pub max_attempts: u32,
    /// Base backoff between attempts (ms).
    pub base_backoff_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    pub model: String,
    pub api_key_env: String,
    pub max_tokens: u32,
    /// Per-forecast deadline in seconds.
    pub timeout_secs: u64,
    /// Maximum forecasts in flight during batch scoring.
    pub concurrency: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TradingConfig {
    pub bankroll: f64,
    pub stake_fraction: f64,
    pub min_stake: f64,
    /// Edge (percentage points) required for a BUY signal.
    pub min_edge: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketsConfig {
    /// YES price band for tradeable markets (0–100).
    pub min_price: f64,
    pub max_price: f64,
    /// Maximum tolerated spread in percentage points.
    pub max_spread: f64,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
