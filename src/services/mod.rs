// ABOUTME: Domain service layer holding the relationship lifecycle state machine
// ABOUTME: Protocol-agnostic business logic kept out of the route handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

//! Domain service layer
//!
//! Business logic lives here, behind plain function calls, so the route
//! handlers stay a thin request/response mapping. Handlers and background
//! tasks share the same lifecycle rules through this module.

/// Relationship lifecycle: invitations, claims, direct creation, termination
pub mod relationships;

pub use relationships::{RelationshipConfig, RelationshipLifecycle};
