// ABOUTME: Configuration module for centralized server settings
// ABOUTME: Environment variable loading with typed database URL and timing knobs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

//! Configuration for the relationship service
//!
//! Everything is loaded from environment variables at startup; see
//! [`environment::ServerConfig::from_env`].

/// Environment and server configuration
pub mod environment;

pub use environment::{DatabaseUrl, Environment, LogLevel, ServerConfig};
