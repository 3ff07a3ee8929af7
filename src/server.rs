// ABOUTME: HTTP server assembly, shared resource container, and background expiry sweeper
// ABOUTME: Builds the merged axum router and serves it with graceful shutdown on SIGINT/SIGTERM
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

//! Server bootstrap
//!
//! [`ServerResources`] is the dependency container handed to every route
//! module: the relationship store, the lifecycle service wrapping it, and the
//! loaded configuration. [`run_server`] wires the routers together, spawns the
//! expiry sweeper, and serves until a shutdown signal arrives.

use crate::config::ServerConfig;
use crate::routes::{HealthRoutes, RelationshipRoutes};
use crate::services::RelationshipLifecycle;
use crate::store::{RelationshipStore, Store};
use anyhow::Result;
use axum::Router;
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Centralized resource container for dependency injection
///
/// Holds the shared server resources so route handlers and background tasks
/// work against the same store and lifecycle instances.
#[derive(Clone)]
pub struct ServerResources {
    /// Relationship store backend
    pub store: Arc<Store>,
    /// Lifecycle service enforcing the relationship state machine
    pub lifecycle: RelationshipLifecycle<Store>,
    /// Loaded server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Create new server resources with proper Arc sharing
    #[must_use]
    pub fn new(store: Store, config: ServerConfig) -> Self {
        let store = Arc::new(store);
        let lifecycle = RelationshipLifecycle::new(store.clone(), config.relationship_config());

        Self {
            store,
            lifecycle,
            config: Arc::new(config),
        }
    }
}

/// Build the full application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(RelationshipRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until a shutdown signal arrives
///
/// Spawns the background expiry sweeper, binds the configured port, and
/// serves the merged router with graceful shutdown.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails while
/// serving.
pub async fn run_server(resources: Arc<ServerResources>) -> Result<()> {
    let port = resources.config.http_port;
    let sweeper = spawn_expiry_sweeper(&resources);
    let app = router(resources);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Server shut down cleanly");
    Ok(())
}

/// Spawn the background task that removes expired records
///
/// Unclaimed invitations past their claim window and ended relationships past
/// their retention window stay visible to reads until this sweeper deletes
/// them; the sweep interval bounds how long that grace period lasts.
pub fn spawn_expiry_sweeper(resources: &Arc<ServerResources>) -> tokio::task::JoinHandle<()> {
    let store = resources.store.clone();
    let sweep_interval = resources.config.sweep_interval();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            match store.purge_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(purged) => debug!("Expiry sweep removed {purged} records"),
                Err(e) => warn!("Expiry sweep failed: {e}"),
            }
        }
    })
}

/// Resolve when SIGINT or SIGTERM is received
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down gracefully"),
        () = terminate => info!("Received SIGTERM, shutting down gracefully"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseUrl, Environment, LogLevel};
    use crate::store::MemoryStore;

    fn test_config() -> ServerConfig {
        ServerConfig {
            http_port: 0,
            log_level: LogLevel::Info,
            environment: Environment::Testing,
            database_url: DatabaseUrl::Memory,
            invitation_ttl_hours: 24,
            ended_retention_days: 60,
            sweep_interval_secs: 60,
        }
    }

    #[tokio::test]
    async fn test_router_builds_without_route_conflicts() {
        let resources = Arc::new(ServerResources::new(
            Store::Memory(MemoryStore::new()),
            test_config(),
        ));
        // Router construction panics on conflicting route registrations.
        let _ = router(resources);
    }

    #[tokio::test]
    async fn test_resources_share_one_store() {
        let resources = ServerResources::new(Store::Memory(MemoryStore::new()), test_config());

        let invitation = resources
            .lifecycle
            .create_invitation("coach-1")
            .await
            .unwrap();
        let fetched = resources
            .store
            .get(&invitation.relationship_id)
            .await
            .unwrap();
        assert!(fetched.is_some());
    }
}
