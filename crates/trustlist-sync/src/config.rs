//! Worker configuration from `TRUSTLIST_*` environment variables

use std::time::Duration;
use thiserror::Error;
use tracing::Level;

const PREFIX: &str = "TRUSTLIST_";

/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required variable TRUSTLIST_{0}")]
    Missing(&'static str),

    #[error("Invalid value for TRUSTLIST_{name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// ISO 3166 alpha-2 code of this gateway
    pub origin_country: String,
    /// Gateway base URL; `None` runs against the in-process mock
    pub gateway_url: Option<String>,
    pub gateway_timeout: Option<Duration>,
    /// Base64 Ed25519 seed used to sign outbound payloads
    pub signing_key: Option<String>,
    pub signing_kid: String,
    pub upload_interval: Duration,
    pub download_interval: Duration,
    pub lock_at_most: Duration,
    pub lock_at_least: Duration,
    pub purge_url: Option<String>,
    pub purge_targets: Vec<String>,
    pub database_url: Option<String>,
    pub port: u16,
    pub instance_id: String,
    pub log_level: Level,
}

impl WorkerConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which receives full variable names
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{}{}", PREFIX, name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let origin_country = get("ORIGIN_COUNTRY")
            .ok_or(ConfigError::Missing("ORIGIN_COUNTRY"))?
            .to_uppercase();
        if origin_country.len() != 2 || !origin_country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::Invalid {
                name: "ORIGIN_COUNTRY",
                reason: format!("'{}' is not a two-letter country code", origin_country),
            });
        }

        let secs = |name: &'static str, default: Option<u64>| -> Result<Option<Duration>, ConfigError> {
            match get(name) {
                Some(raw) => raw
                    .parse::<u64>()
                    .map(|s| Some(Duration::from_secs(s)))
                    .map_err(|e| ConfigError::Invalid {
                        name,
                        reason: e.to_string(),
                    }),
                None => Ok(default.map(Duration::from_secs)),
            }
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: e.to_string(),
            })?,
            None => 8080,
        };

        let log_level = match get("LOG_LEVEL") {
            Some(raw) => raw.parse::<Level>().map_err(|e| ConfigError::Invalid {
                name: "LOG_LEVEL",
                reason: e.to_string(),
            })?,
            None => Level::INFO,
        };

        let purge_targets = get("PURGE_TARGETS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            gateway_url: get("GATEWAY_URL"),
            gateway_timeout: secs("GATEWAY_TIMEOUT_SECS", None)?,
            signing_key: get("SIGNING_KEY"),
            signing_kid: get("SIGNING_KID")
                .unwrap_or_else(|| format!("{}-worker", origin_country.to_lowercase())),
            upload_interval: secs("UPLOAD_INTERVAL_SECS", Some(300))?.unwrap_or_default(),
            download_interval: secs("DOWNLOAD_INTERVAL_SECS", Some(3600))?.unwrap_or_default(),
            lock_at_most: secs("LOCK_AT_MOST_SECS", Some(600))?.unwrap_or_default(),
            lock_at_least: secs("LOCK_AT_LEAST_SECS", Some(10))?.unwrap_or_default(),
            purge_url: get("PURGE_URL"),
            purge_targets,
            database_url: get("DATABASE_URL"),
            port,
            instance_id: get("INSTANCE_ID").unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            log_level,
            origin_country,
        })
    }
}
