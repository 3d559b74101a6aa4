//! Configuration management for notifyhub
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer serialized defaults, a `notifyhub.toml` file,
//! `NOTIFYHUB_` environment variables and command-line flags, in that order.

use crate::cli::Cli;
use crate::core::BackendConfig;
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration file read when `--config` is not given. Optional.
pub const DEFAULT_CONFIG_FILE: &str = "notifyhub.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging filter for the application (e.g. "info", "notifyhub=debug").
    pub log_level: String,
    /// Log metrics to the console periodically.
    #[serde(default)]
    pub log_metrics: bool,
    /// How often metrics are logged, in seconds.
    pub metrics_interval_seconds: u64,
    pub dispatch: DispatchConfig,
    pub output: OutputConfig,
    pub email: EmailConfig,
    pub sms: SmsConfig,
    pub push: PushConfig,
    pub chat: ChatConfig,
}

/// Dispatcher settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct DispatchConfig {
    /// Send to all backends in parallel, one task per backend.
    pub concurrent: bool,
}

/// The format for command output.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    PlainText,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "JSON"),
            OutputFormat::PlainText => write!(f, "Plain Text"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Email backend settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    /// Longest accepted message, in characters.
    pub max_message_len: usize,
    /// Simulated transport latency.
    pub latency_ms: u64,
    /// Probability (0.0 to 1.0) that a simulated transport attempt fails.
    pub failure_rate: f64,
    pub delivery: BackendConfig,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            username: "notifications@example.com".to_string(),
            max_message_len: 1000,
            latency_ms: 100,
            failure_rate: 0.1,
            delivery: BackendConfig::default(),
        }
    }
}

/// SMS backend settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SmsConfig {
    pub enabled: bool,
    pub provider: String,
    pub api_key: String,
    pub max_message_len: usize,
    /// Shortest accepted phone number, in characters.
    pub min_destination_len: usize,
    pub latency_ms: u64,
    pub failure_rate: f64,
    pub delivery: BackendConfig,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "twilio".to_string(),
            api_key: String::new(),
            max_message_len: 160,
            min_destination_len: 10,
            latency_ms: 50,
            failure_rate: 0.05,
            delivery: BackendConfig {
                auto_retry: false,
                ..BackendConfig::default()
            },
        }
    }
}

/// Push backend settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PushConfig {
    pub enabled: bool,
    pub app_id: String,
    pub latency_ms: u64,
    pub failure_rate: f64,
    pub delivery: BackendConfig,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            app_id: "notifyhub".to_string(),
            latency_ms: 20,
            failure_rate: 0.0,
            delivery: BackendConfig::default(),
        }
    }
}

/// Chat backend settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    pub enabled: bool,
    pub webhook_url: String,
    pub channel: String,
    pub latency_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            webhook_url: "https://hooks.slack.com/services/example".to_string(),
            channel: "#general".to_string(),
            latency_ms: 10,
        }
    }
}

impl Config {
    /// Loads the configuration by layering defaults, the TOML file,
    /// environment variables and command-line flags.
    ///
    /// Environment variables use the `NOTIFYHUB_` prefix and `__` between
    /// nested keys, e.g. `NOTIFYHUB_SMS__FAILURE_RATE=0.5`.
    pub fn load(cli: &Cli) -> Result<Self> {
        let path = match &cli.config {
            Some(path) => {
                if !path.exists() {
                    bail!("configuration file not found: {}", path.display());
                }
                path.clone()
            }
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("NOTIFYHUB_").split("__"))
            .merge(cli.clone())
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings no backend can work with.
    pub fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("email", self.email.failure_rate),
            ("sms", self.sms.failure_rate),
            ("push", self.push.failure_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                bail!("{}.failure_rate must be between 0.0 and 1.0, got {}", name, rate);
            }
        }
        if self.metrics_interval_seconds == 0 {
            bail!("metrics_interval_seconds must be greater than zero");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_metrics: false,
            metrics_interval_seconds: 10,
            dispatch: DispatchConfig::default(),
            output: OutputConfig::default(),
            email: EmailConfig::default(),
            sms: SmsConfig::default(),
            push: PushConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}
