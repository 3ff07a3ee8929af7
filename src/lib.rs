// ABOUTME: Main library entry point for the LiftLink relationship service
// ABOUTME: Provides the coach-athlete relationship lifecycle over pluggable stores and a REST API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

//! # LiftLink Relationship Service
//!
//! The system of record for coach-athlete relationships on the LiftLink
//! powerlifting platform. A relationship begins as a coach's invitation
//! (claimable by code) or as a direct pairing, moves to active on claim or
//! acceptance, and ends into a retained tombstone that ages out of the store.
//!
//! ## Features
//!
//! - **Invitation codes**: 6-character claim codes with a 24-hour window
//! - **Single state machine**: pending, active, ended, enforced by
//!   conditional writes
//! - **One active coach**: an athlete holds at most one active relationship
//! - **Pluggable stores**: in-memory for tests and demos, `SQLite` for
//!   deployments
//! - **Background expiry**: expired invitations and aged-out ended records
//!   are swept on an interval
//!
//! ## Quick Start
//!
//! 1. Point `DATABASE_URL` at `memory` or `sqlite:path/to/relationships.db`
//! 2. Start the API with `liftlink-server`
//! 3. Issue an invitation via `POST /api/relationships/invitations`
//!
//! ## Architecture
//!
//! The service follows a modular architecture:
//! - **Models**: The relationship record and its status enum
//! - **Store**: Persistence trait with memory and `SQLite` backends
//! - **Services**: The lifecycle state machine over any store
//! - **Routes**: Thin axum handlers mapping HTTP to lifecycle calls
//! - **Config**: Environment-driven configuration
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use liftlink::config::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Load configuration
//!     let config = ServerConfig::from_env()?;
//!
//!     println!(
//!         "LiftLink relationship service configured with port: HTTP={}",
//!         config.http_port
//!     );
//!
//!     Ok(())
//! }
//! ```

/// Configuration management loaded from the environment
pub mod config;

/// Application constants and configuration defaults
pub mod constants;

/// Unified error handling with stable error codes and HTTP responses
pub mod errors;

/// Production logging and structured output
pub mod logging;

/// Common data models for coaching relationships
pub mod models;

/// HTTP routes for the relationship API
pub mod routes;

/// Server assembly, shared resources, and the background expiry sweeper
pub mod server;

/// Domain service layer enforcing the relationship state machine
pub mod services;

/// Relationship persistence trait and its backends
pub mod store;
