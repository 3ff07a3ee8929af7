// ABOUTME: Environment-based server configuration for deployment settings
// ABOUTME: Typed database URL, log level, environment mode, and lifecycle timing knobs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

//! Environment-based configuration
//!
//! All configuration comes from environment variables with defaults; there
//! are no configuration files. Validation happens once at load so a
//! misconfigured deployment fails at startup, not mid-request.

use std::env;
use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::constants::{env_config, invitations, retention};
use crate::services::RelationshipConfig;

/// Strongly typed log level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Standard operational logging
    #[default]
    Info,
    /// Verbose diagnostic logging
    Debug,
    /// Maximum verbosity
    Trace,
}

impl LogLevel {
    /// Convert to a `tracing` level
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string, falling back to `Info` for unrecognized values
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Deployment environment type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated test runs
    Testing,
}

impl Environment {
    /// Parse from string, falling back to `Development` for unrecognized values
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Whether this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Type-safe database configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DatabaseUrl {
    /// Process-local in-memory store, lost on restart
    Memory,
    /// SQLite database file (`sqlite::memory:` for an in-memory SQLite)
    SQLite {
        /// Database file path
        path: PathBuf,
    },
}

impl DatabaseUrl {
    /// Parse and validate a database URL
    ///
    /// # Errors
    ///
    /// Returns an error for PostgreSQL URLs (this service only ships the
    /// memory and SQLite backends) and for unrecognized formats.
    pub fn parse_url(s: &str) -> Result<Self> {
        if s == "memory" {
            Ok(Self::Memory)
        } else if let Some(path) = s.strip_prefix("sqlite:") {
            if path.is_empty() {
                return Err(anyhow::anyhow!("SQLite database path cannot be empty"));
            }
            Ok(Self::SQLite {
                path: PathBuf::from(path),
            })
        } else if s.starts_with("postgresql://") || s.starts_with("postgres://") {
            Err(anyhow::anyhow!(
                "PostgreSQL is not supported; set DATABASE_URL to memory or sqlite:path/to/relationships.db"
            ))
        } else {
            Err(anyhow::anyhow!(
                "Unsupported DATABASE_URL format '{s}'; expected memory or sqlite:path/to/relationships.db"
            ))
        }
    }

    /// Render back to the connection string the store factory consumes
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::Memory => "memory".to_owned(),
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
        }
    }

    /// Whether this is the in-memory backend
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from("./data/relationships.db"),
        }
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Log level
    pub log_level: LogLevel,
    /// Deployment environment
    pub environment: Environment,
    /// Relationship store location
    pub database_url: DatabaseUrl,
    /// Hours a fresh invitation stays claimable
    pub invitation_ttl_hours: i64,
    /// Days an ended relationship is retained before purge
    pub ended_retention_days: i64,
    /// Seconds between background expiry sweeps
    pub sweep_interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable fails to parse or validation rejects
    /// the resulting configuration.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            http_port: env_config::http_port(),
            log_level: LogLevel::from_str_or_default(&env_config::log_level()),
            environment: Environment::from_str_or_default(&env_config::environment()),
            database_url: DatabaseUrl::parse_url(&env_config::database_url())?,
            invitation_ttl_hours: env_var_or(
                "INVITATION_TTL_HOURS",
                &invitations::DEFAULT_TTL_HOURS.to_string(),
            )?
            .parse()
            .context("Invalid INVITATION_TTL_HOURS value")?,
            ended_retention_days: env_var_or(
                "ENDED_RETENTION_DAYS",
                &retention::DEFAULT_ENDED_RETENTION_DAYS.to_string(),
            )?
            .parse()
            .context("Invalid ENDED_RETENTION_DAYS value")?,
            sweep_interval_secs: env_var_or(
                "EXPIRY_SWEEP_INTERVAL_SECS",
                &retention::DEFAULT_SWEEP_INTERVAL_SECS.to_string(),
            )?
            .parse()
            .context("Invalid EXPIRY_SWEEP_INTERVAL_SECS value")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive timing knobs.
    pub fn validate(&self) -> Result<()> {
        if self.invitation_ttl_hours <= 0 {
            return Err(anyhow::anyhow!("INVITATION_TTL_HOURS must be positive"));
        }
        if self.ended_retention_days <= 0 {
            return Err(anyhow::anyhow!("ENDED_RETENTION_DAYS must be positive"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(anyhow::anyhow!(
                "EXPIRY_SWEEP_INTERVAL_SECS must be at least 1"
            ));
        }
        Ok(())
    }

    /// The lifecycle timing knobs as the service layer consumes them
    #[must_use]
    pub fn relationship_config(&self) -> RelationshipConfig {
        RelationshipConfig {
            invitation_ttl: Duration::hours(self.invitation_ttl_hours),
            ended_retention: Duration::days(self.ended_retention_days),
        }
    }

    /// Interval between background expiry sweeps
    #[must_use]
    pub const fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }

    /// Configuration summary for startup logging
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "LiftLink Relationship Service Configuration:\n\
             - HTTP Port: {}\n\
             - Log Level: {}\n\
             - Environment: {}\n\
             - Database: {}\n\
             - Invitation TTL: {} h\n\
             - Ended Retention: {} d\n\
             - Expiry Sweep Interval: {} s",
            self.http_port,
            self.log_level,
            self.environment,
            self.database_url,
            self.invitation_ttl_hours,
            self.ended_retention_days,
            self.sweep_interval_secs
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> Result<String> {
    Ok(env::var(key).unwrap_or_else(|_| default.to_owned()))
}
