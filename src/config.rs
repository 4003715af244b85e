use std::collections::HashMap;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::clients::schedule_client::{DEFAULT_FETCH_TIMEOUT, DEFAULT_SCHEDULE_URL};
use crate::service::event_cache::DEFAULT_CACHE_TTL;
use crate::service::status_formatter::RenderMode;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config line {line}: {content}")]
    Parse { line: usize, content: String },
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Key/value pairs from an optional dotenv-style file. Lookups fall back to
/// the process environment.
#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ConfigError::Parse {
                    line: idx + 1,
                    content: line.to_string(),
                });
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .cloned()
            .or_else(|| env::var(key).ok())
            .filter(|value| !value.trim().is_empty())
    }
}

/// Typed runtime settings for the webhook server.
#[derive(Debug, Clone)]
pub struct Settings {
    pub public_key: String,
    pub bind_addr: SocketAddr,
    pub schedule_url: String,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
    pub render_mode: RenderMode,
}

impl Settings {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let public_key = config
            .get("DISCORD_PUBLIC_KEY")
            .ok_or(ConfigError::Missing("DISCORD_PUBLIC_KEY"))?;
        let bind_addr = config
            .get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::Invalid {
                key: "BIND_ADDR",
                message: err.to_string(),
            })?;
        Ok(Self {
            public_key,
            bind_addr,
            schedule_url: schedule_url(config),
            cache_ttl: seconds(config, "CACHE_TTL_SECS", DEFAULT_CACHE_TTL)?,
            fetch_timeout: seconds(config, "FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT)?,
            render_mode: render_mode(config)?,
        })
    }
}

/// Credentials for the one-shot command registration.
#[derive(Debug, Clone)]
pub struct RegistrationSettings {
    pub bot_token: String,
    pub application_id: u64,
    pub guild_id: u64,
}

impl RegistrationSettings {
    pub const REQUIRED: [&'static str; 3] = ["DISCORD_BOT_TOKEN", "DISCORD_APP_ID", "DISCORD_GUILD_ID"];

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let bot_token = config
            .get("DISCORD_BOT_TOKEN")
            .ok_or(ConfigError::Missing("DISCORD_BOT_TOKEN"))?;
        Ok(Self {
            bot_token,
            application_id: snowflake(config, "DISCORD_APP_ID")?,
            guild_id: snowflake(config, "DISCORD_GUILD_ID")?,
        })
    }
}

pub fn schedule_url(config: &AppConfig) -> String {
    config
        .get("SCHEDULE_URL")
        .unwrap_or_else(|| DEFAULT_SCHEDULE_URL.to_string())
}

pub fn render_mode(config: &AppConfig) -> Result<RenderMode, ConfigError> {
    match config.get("RENDER_MODE") {
        Some(value) => value.parse().map_err(|message| ConfigError::Invalid {
            key: "RENDER_MODE",
            message,
        }),
        None => Ok(RenderMode::default()),
    }
}

pub fn seconds(
    config: &AppConfig,
    key: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let Some(value) = config.get(key) else {
        return Ok(default);
    };
    let secs = value
        .trim()
        .parse::<u64>()
        .map_err(|err| ConfigError::Invalid {
            key,
            message: err.to_string(),
        })?;
    let duration = Duration::from_secs(secs);
    chrono::Duration::from_std(duration).map_err(|_| ConfigError::Invalid {
        key,
        message: format!("{secs} seconds is out of range"),
    })?;
    Ok(duration)
}

fn snowflake(config: &AppConfig, key: &'static str) -> Result<u64, ConfigError> {
    let value = config.get(key).ok_or(ConfigError::Missing(key))?;
    value.trim().parse::<u64>().map_err(|err| ConfigError::Invalid {
        key,
        message: err.to_string(),
    })
}
