// ABOUTME: Shared constants and defaults for the relationship service
// ABOUTME: Invitation code shape, lifecycle timing defaults, and network defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

//! Application constants grouped by domain.

/// Invitation code generation parameters
pub mod invitations {
    /// Number of characters in a generated invitation code
    pub const CODE_LENGTH: usize = 6;

    /// Characters an invitation code may contain (uppercase letters and digits)
    pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    /// Default invitation lifetime in hours
    pub const DEFAULT_TTL_HOURS: i64 = 24;
}

/// Retention and background expiry defaults
pub mod retention {
    /// Default number of days an ended relationship stays stored before purge
    pub const DEFAULT_ENDED_RETENTION_DAYS: i64 = 60;

    /// Default interval between background expiry sweeps, in seconds
    pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
}

/// Network defaults
pub mod network {
    /// Default HTTP port for the relationship API
    pub const DEFAULT_HTTP_PORT: u16 = 8080;
}

/// Server identity
pub mod server {
    /// Server version from Cargo.toml
    pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Service name reported by monitoring endpoints
    pub const SERVER_NAME: &str = "liftlink-server";
}

/// Environment variable access with defaults
pub mod env_config {
    use std::env;

    /// HTTP server port from environment or default
    #[must_use]
    pub fn http_port() -> u16 {
        env::var("HTTP_PORT")
            .unwrap_or_else(|_| super::network::DEFAULT_HTTP_PORT.to_string())
            .parse()
            .unwrap_or(super::network::DEFAULT_HTTP_PORT)
    }

    /// Database URL from environment or default
    #[must_use]
    pub fn database_url() -> String {
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./data/relationships.db".into())
    }

    /// Log level from environment or default
    #[must_use]
    pub fn log_level() -> String {
        env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into())
    }

    /// Log output format from environment or default
    #[must_use]
    pub fn log_format() -> String {
        env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".into())
    }

    /// Deployment environment name from environment or default
    #[must_use]
    pub fn environment() -> String {
        env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
    }
}
