// ABOUTME: Route module organization for LiftLink relationship service HTTP endpoints
// ABOUTME: Provides centralized route definitions organized by domain with clean separation of concerns
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

//! Route module for the relationship service
//!
//! Each domain module contains only route definitions and thin handler
//! functions that delegate to the service layer.

/// Health check and readiness routes
pub mod health;
/// Coach-athlete relationship lifecycle routes
pub mod relationships;

/// Health check route handlers
pub use health::HealthRoutes;
/// Relationship route handlers
pub use relationships::{
    ClaimInvitationBody, CreateInvitationBody, CreateRelationshipBody, ListRelationshipsResponse,
    RelationshipResponse, RelationshipRoutes,
};
