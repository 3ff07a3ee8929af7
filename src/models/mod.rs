// ABOUTME: Core data models for the relationship service
// ABOUTME: Re-exports the relationship entity and its status enum
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

//! # Data Models
//!
//! The relationship record is the sole entity this service owns. Everything
//! else on the platform (accounts, workouts, training blocks) lives in other
//! services and is referenced here only by opaque string identifiers.

pub mod relationship;

pub use relationship::{Relationship, RelationshipStatus};
