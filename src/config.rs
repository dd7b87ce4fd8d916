//! # Configuration Module
//!
//! Environment-driven configuration, resolved once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Required | Default | Meaning |
//! |---|---|---|---|
//! | `ENV` | yes | | `dev`, `stage`, `prod` or any other name |
//! | `APP_NAME` | no | `app` | service name, also the log file prefix |
//! | `LOG_DIR` | no | `logs` | directory for rotated log files |
//! | `LOG_LEVEL` | no | `info` | `EnvFilter` directive |
//! | `LOG_FORMAT` | no | `pretty` | `pretty` or `json` (file output) |
//!
//! A `.env` file in the working directory is loaded first when present;
//! variables already set in the process win.
//!
//! ```rust
//! use expressive::config::{AppConfig, Env};
//!
//! let config = AppConfig::from_lookup(|name| match name {
//!     "ENV" => Some("prod".to_string()),
//!     _ => None,
//! })
//! .unwrap();
//! assert_eq!(config.env, Env::Prod);
//! assert_eq!(config.log_dir.to_str(), Some("logs"));
//! ```

use crate::logging::{LogConfig, LogFormat};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

/// Deployment environment, from `ENV`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Env {
    Dev,
    Stage,
    Prod,
    Other(String),
}

impl Env {
    #[must_use]
    pub fn is_dev(&self) -> bool {
        matches!(self, Env::Dev)
    }

    #[must_use]
    pub fn is_prod(&self) -> bool {
        matches!(self, Env::Prod)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Env::Dev => "dev",
            Env::Stage => "stage",
            Env::Prod => "prod",
            Env::Other(name) => name,
        }
    }
}

impl FromStr for Env {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Env::Dev,
            "stage" | "staging" => Env::Stage,
            "prod" | "production" => Env::Prod,
            other => Env::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is absent or empty
    Missing { name: String },
    /// A variable is set to something unusable
    Invalid { name: String, value: String },
    /// The `.env` file exists but could not be read
    Dotenv(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing { name } => write!(f, "Missing config '{name}'"),
            ConfigError::Invalid { name, value } => {
                write!(f, "Invalid value '{value}' for config '{name}'")
            }
            ConfigError::Dotenv(reason) => write!(f, "Failed to load .env file: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load `./.env` (or the nearest one up the tree) if there is one.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!(path = %path.display(), "Loaded .env file");
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(ConfigError::Dotenv(e.to_string())),
    }
}

/// Read a required process environment variable.
pub fn get_env_var(name: &str) -> Result<String, ConfigError> {
    require(name, std::env::var(name).ok())
}

fn require(name: &str, value: Option<String>) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::Missing {
            name: name.to_string(),
        })
}

/// Process-wide settings, built once at startup and passed around explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub env: Env,
    pub app_name: String,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load `.env`, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv()?;
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name → value lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str, default: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let env = match require("ENV", lookup("ENV"))?.parse::<Env>() {
            Ok(env) => env,
            Err(never) => match never {},
        };
        let log_format_raw = optional("LOG_FORMAT", "pretty");
        let log_format = log_format_raw
            .parse::<LogFormat>()
            .map_err(|_| ConfigError::Invalid {
                name: "LOG_FORMAT".to_string(),
                value: log_format_raw.clone(),
            })?;

        Ok(Self {
            env,
            app_name: optional("APP_NAME", "app"),
            log_dir: PathBuf::from(optional("LOG_DIR", "logs")),
            log_level: optional("LOG_LEVEL", "info"),
            log_format,
        })
    }

    /// Logger settings derived from this configuration.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            env: self.env.clone(),
            name: self.app_name.clone(),
            directory: self.log_dir.clone(),
            level: self.log_level.clone(),
            format: self.log_format,
        }
    }
}
