use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    Disable,
    #[default]
    Prefer,
    Require,
}

impl std::fmt::Display for SslMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SslMode::Disable => write!(f, "disable"),
            SslMode::Prefer => write!(f, "prefer"),
            SslMode::Require => write!(f, "require"),
        }
    }
}

impl std::str::FromStr for SslMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            other => Err(AppError::Config(format!("Unsupported sslmode: {}", other))),
        }
    }
}

/// Where the hosted database lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub ssl_mode: SslMode,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            host: "localhost".to_string(),
            port: 5432,
            database: "stockroom".to_string(),
            username: "postgres".to_string(),
            password: String::new(),
            ssl_mode: SslMode::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DatabaseTarget {
    Url(String),
    Parts(ConnectionConfig),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseTarget,
    pub data_dir: PathBuf,
    pub admin_email: String,
    pub statement_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database = match get("STOCKROOM_DATABASE_URL") {
            Some(url) => DatabaseTarget::Url(url),
            None => {
                let defaults = ConnectionConfig::default();
                let port = match get("STOCKROOM_DB_PORT") {
                    Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                        AppError::Config(format!("STOCKROOM_DB_PORT is not a port: {}", raw))
                    })?,
                    None => defaults.port,
                };
                let ssl_mode = match get("STOCKROOM_DB_SSLMODE") {
                    Some(raw) => raw.parse()?,
                    None => defaults.ssl_mode,
                };
                DatabaseTarget::Parts(ConnectionConfig {
                    host: get("STOCKROOM_DB_HOST").unwrap_or(defaults.host),
                    port,
                    database: get("STOCKROOM_DB_NAME").unwrap_or(defaults.database),
                    username: get("STOCKROOM_DB_USER").unwrap_or(defaults.username),
                    password: lookup("STOCKROOM_DB_PASSWORD").unwrap_or_default(),
                    ssl_mode,
                })
            }
        };

        let admin_email = get("STOCKROOM_ADMIN_EMAIL")
            .map(|e| e.trim().to_string())
            .ok_or_else(|| AppError::Config("STOCKROOM_ADMIN_EMAIL must be set".to_string()))?;

        let statement_timeout_secs = match get("STOCKROOM_STATEMENT_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                AppError::Config(format!(
                    "STOCKROOM_STATEMENT_TIMEOUT_SECS is not a number: {}",
                    raw
                ))
            })?,
            None => 10,
        };

        Ok(AppConfig {
            database,
            data_dir: get("STOCKROOM_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./.stockroom")),
            admin_email,
            statement_timeout_secs,
        })
    }
}
