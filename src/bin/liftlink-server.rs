// ABOUTME: Server binary for the LiftLink coach-athlete relationship service
// ABOUTME: Loads environment configuration, connects the store, and serves the relationship API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

//! # LiftLink Relationship Service Binary
//!
//! This binary starts the coach-athlete relationship API: it loads
//! configuration from the environment, initializes logging and the
//! relationship store, and serves HTTP with the background expiry sweeper
//! running alongside.

use anyhow::Result;
use clap::Parser;
use liftlink::{
    config::ServerConfig,
    logging,
    server::{run_server, ServerResources},
    store::{RelationshipStore, Store},
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "liftlink-server")]
#[command(about = "LiftLink relationship service - coach-athlete lifecycle API")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle container environments where clap may not work properly
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Argument parsing failed: {e}");
            eprintln!("Falling back to environment configuration only");
            Args { http_port: None }
        }
    };

    // Load configuration from environment
    let mut config = ServerConfig::from_env()?;

    // Override port if specified
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    // Initialize logging before anything chatty happens
    logging::init_from_env()?;

    info!("Starting LiftLink Relationship Service");
    info!("{}", config.summary());

    // Connect the relationship store and apply its schema
    let store = Store::new(&config.database_url.to_connection_string()).await?;
    store.migrate().await?;
    info!("Relationship store ready: {}", store.backend_info());

    let resources = Arc::new(ServerResources::new(store, config));

    display_available_endpoints(&resources.config);

    info!("Ready to serve coaching relationships");

    if let Err(e) = run_server(resources).await {
        error!("Server error: {e}");
        return Err(e);
    }

    Ok(())
}

/// Display all available API endpoints with their ports
fn display_available_endpoints(config: &ServerConfig) {
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());

    info!("=== Available API Endpoints ===");
    display_relationship_endpoints(&host, config.http_port);
    display_monitoring_endpoints(&host, config.http_port);
    info!("=== End of Endpoint List ===");
}

#[allow(clippy::cognitive_complexity)]
fn display_relationship_endpoints(host: &str, port: u16) {
    info!("Relationships:");
    info!("   Create Invitation: POST http://{host}:{port}/api/relationships/invitations");
    info!("   Lookup Invitation: GET  http://{host}:{port}/api/relationships/invitations/{{code}}");
    info!("   Cancel Invitation: DELETE http://{host}:{port}/api/relationships/invitations/{{id}}");
    info!("   Claim Invitation:  POST http://{host}:{port}/api/relationships/claims");
    info!("   Create Direct:     POST http://{host}:{port}/api/relationships");
    info!("   Get Relationship:  GET  http://{host}:{port}/api/relationships/{{id}}");
    info!("   Accept:            POST http://{host}:{port}/api/relationships/{{id}}/accept");
    info!("   End:               POST http://{host}:{port}/api/relationships/{{id}}/end");
    info!("   Coach Listing:     GET  http://{host}:{port}/api/coaches/{{coach_id}}/relationships");
    info!("   Athlete Listing:   GET  http://{host}:{port}/api/athletes/{{athlete_id}}/relationships");
    info!("   Active Coach:      GET  http://{host}:{port}/api/athletes/{{athlete_id}}/coach");
}

fn display_monitoring_endpoints(host: &str, port: u16) {
    info!("Monitoring:");
    info!("   Health Check:      GET  http://{host}:{port}/health");
    info!("   Readiness Check:   GET  http://{host}:{port}/ready");
}
