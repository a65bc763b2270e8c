use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Runtime settings. Layered as defaults, then an optional TOML file, then
/// environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    /// Number of snapshots kept in the live activity log.
    pub history_limit: usize,
    /// Display name for the local session.
    pub operator: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            history_limit: 5,
            operator: "Admin".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `EQUIPLOG_*` overrides read through `lookup`. `DATABASE_URL` is
    /// honoured when `EQUIPLOG_DATABASE_URL` is unset.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("EQUIPLOG_DATABASE_URL").or_else(|| lookup("DATABASE_URL")) {
            self.database_url = Some(url);
        }

        if let Some(value) = lookup("EQUIPLOG_BIND") {
            self.bind_addr = value.parse().map_err(|err: std::net::AddrParseError| {
                ConfigError::InvalidValue {
                    key: "EQUIPLOG_BIND",
                    value: value.clone(),
                    reason: err.to_string(),
                }
            })?;
        }

        if let Some(value) = lookup("EQUIPLOG_HISTORY_LIMIT") {
            let limit: usize = value.parse().map_err(|err: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    key: "EQUIPLOG_HISTORY_LIMIT",
                    value: value.clone(),
                    reason: err.to_string(),
                }
            })?;
            if limit == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "EQUIPLOG_HISTORY_LIMIT",
                    value,
                    reason: "must be at least 1".to_string(),
                });
            }
            self.history_limit = limit;
        }

        if let Some(value) = lookup("EQUIPLOG_OPERATOR") {
            self.operator = value;
        }

        Ok(())
    }
}
