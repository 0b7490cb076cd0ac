use crate::classifier::{Category, FilterCriteria, ServerScope};
use crate::error::LogwatchError;
use crate::scheduler::{RefreshPresets, RefreshRate, DEFAULT_FAST_INTERVAL_MS, DEFAULT_NORMAL_INTERVAL_MS};
use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(name = "proxy-logwatch", version, about)]
pub struct Cli {
    /// Path to configuration file
    #[clap(long, default_value = "./config.toml")]
    pub config: PathBuf,

    /// Override dashboard API base URL
    #[clap(long)]
    pub api_base: Option<String>,

    /// Override session token
    #[clap(long)]
    pub token: Option<String>,

    /// Start with the fast auto-refresh cadence
    #[clap(long)]
    pub fast: bool,

    /// Override initial log category (all, playback, error)
    #[clap(long)]
    pub category: Option<String>,

    /// Override initial server scope
    #[clap(long)]
    pub server: Option<String>,

    /// Disable colored level output
    #[clap(long)]
    pub no_color: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_base: String,
    pub token: String,
    #[serde(default)]
    pub refresh: RefreshRate,
    #[serde(default = "default_fast_interval_ms")]
    pub fast_interval_ms: u64,
    #[serde(default = "default_normal_interval_ms")]
    pub normal_interval_ms: u64,
    #[serde(default)]
    pub category: Category,
    #[serde(default = "default_server")]
    pub server: String,
    #[serde(default)]
    pub no_color: bool,
}

fn default_fast_interval_ms() -> u64 {
    DEFAULT_FAST_INTERVAL_MS
}

fn default_normal_interval_ms() -> u64 {
    DEFAULT_NORMAL_INTERVAL_MS
}

fn default_server() -> String {
    "all".to_string()
}

impl Config {
    pub fn presets(&self) -> RefreshPresets {
        RefreshPresets {
            fast: Duration::from_millis(self.fast_interval_ms),
            normal: Duration::from_millis(self.normal_interval_ms),
        }
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new(self.category, ServerScope::from(self.server.as_str()))
    }

    fn validate(&self) -> Result<(), LogwatchError> {
        if self.token.trim().is_empty() {
            return Err(LogwatchError::ConfigError("token must not be empty".to_string()));
        }
        if self.fast_interval_ms == 0 || self.normal_interval_ms == 0 {
            return Err(LogwatchError::ConfigError(
                "refresh intervals must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).context("Failed to parse config file")
}

pub fn load_config(cli: &Cli) -> Result<Config> {
    let config_content = fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read config file: {:?}", cli.config))?;

    let mut config = parse_config(&config_content)?;
    apply_overrides(&mut config, cli)?;
    config.validate()?;

    Ok(config)
}

fn apply_overrides(config: &mut Config, cli: &Cli) -> Result<()> {
    if let Some(ref api_base) = cli.api_base {
        config.api_base = api_base.clone();
    }

    if let Some(ref token) = cli.token {
        config.token = token.clone();
    }

    if cli.fast {
        config.refresh = RefreshRate::Fast;
    }

    if let Some(ref category) = cli.category {
        config.category = category.parse().context("Invalid --category")?;
    }

    if let Some(ref server) = cli.server {
        config.server = server.clone();
    }

    if cli.no_color {
        config.no_color = true;
    }

    Ok(())
}
