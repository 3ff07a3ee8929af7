// ABOUTME: Health check route handlers for service monitoring and status endpoints
// ABOUTME: Provides liveness and store-backed readiness endpoints for monitoring infrastructure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

//! Health check routes for service monitoring
//!
//! This module provides health and readiness endpoints for monitoring and
//! load balancer health checks. `/health` reports process liveness only;
//! `/ready` additionally verifies that the relationship store answers.

use crate::constants::server::{SERVER_NAME, SERVER_VERSION};
use crate::server::ServerResources;
use crate::store::RelationshipStore;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .route("/ready", get(Self::handle_ready))
            .with_state(resources)
    }

    /// Handle GET /health - process liveness
    async fn handle_health() -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "status": "healthy",
            "service": SERVER_NAME,
            "version": SERVER_VERSION,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
    }

    /// Handle GET /ready - store-backed readiness
    ///
    /// Issues a cheap point read against the store; any successful answer
    /// (including "no such record") means the backend is reachable.
    async fn handle_ready(State(resources): State<Arc<ServerResources>>) -> Response {
        match resources.store.get("readiness-probe").await {
            Ok(_) => (
                StatusCode::OK,
                Json(serde_json::json!({
                    "status": "ready",
                    "backend": resources.store.backend_info(),
                    "timestamp": chrono::Utc::now().to_rfc3339()
                })),
            )
                .into_response(),
            Err(e) => {
                tracing::warn!("Readiness probe failed: {e}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(serde_json::json!({
                        "status": "unavailable",
                        "backend": resources.store.backend_info(),
                        "timestamp": chrono::Utc::now().to_rfc3339()
                    })),
                )
                    .into_response()
            }
        }
    }
}
