// ABOUTME: Storage abstraction for relationship records
// ABOUTME: Store contract with in-memory and SQLite backends behind a factory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

//! # Relationship Store
//!
//! Durable storage of relationship records: point lookups by identifier,
//! secondary lookups by coach, athlete, pair, and invitation code, a
//! conditional update for race-safe transitions, and bulk removal of expired
//! records for the background sweeper.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::StoreError;
use crate::models::{Relationship, RelationshipStatus};

pub mod factory;
pub mod memory;
pub mod sqlite;

pub use factory::{detect_store_type, Store, StoreType};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Result of a conditional status-guarded update
///
/// Exactly one of two concurrent transitions on the same record observes
/// [`TransitionOutcome::Applied`]; the loser sees the state left behind by
/// the winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The stored record matched an expected status and was replaced
    Applied,
    /// No record exists under the identifier
    Missing,
    /// The record exists but its status was outside the expected set
    StatusMismatch(RelationshipStatus),
}

/// Core storage abstraction trait
///
/// All storage backends implement this trait to provide a consistent
/// interface for the lifecycle layer. Reads do not filter out records whose
/// `expires_at` has passed; expired records stay visible until the background
/// sweep removes them, and callers needing strict expiry semantics check the
/// wall clock themselves.
#[async_trait]
pub trait RelationshipStore: Send + Sync + Clone {
    /// Set up backend schema; idempotent
    async fn migrate(&self) -> Result<(), StoreError>;

    /// Persist a new record; fails if the identifier is already taken
    async fn insert(&self, relationship: &Relationship) -> Result<(), StoreError>;

    /// Point lookup by identifier
    async fn get(&self, relationship_id: &str) -> Result<Option<Relationship>, StoreError>;

    /// Immediate point delete; returns whether a record was removed
    async fn delete(&self, relationship_id: &str) -> Result<bool, StoreError>;

    /// All relationships for a coach, optionally filtered by status;
    /// store-native order
    async fn list_by_coach(
        &self,
        coach_id: &str,
        status: Option<RelationshipStatus>,
    ) -> Result<Vec<Relationship>, StoreError>;

    /// All relationships for an athlete, optionally filtered by status;
    /// store-native order
    async fn list_by_athlete(
        &self,
        athlete_id: &str,
        status: Option<RelationshipStatus>,
    ) -> Result<Vec<Relationship>, StoreError>;

    /// Lookup by invitation code
    async fn find_by_invitation_code(
        &self,
        code: &str,
    ) -> Result<Option<Relationship>, StoreError>;

    /// Lookup by exact (coach, athlete) pair and status
    async fn find_pair(
        &self,
        coach_id: &str,
        athlete_id: &str,
        status: RelationshipStatus,
    ) -> Result<Option<Relationship>, StoreError>;

    /// Replace the record under `next.relationship_id` only if its current
    /// status is in `expected`
    async fn update_if_status(
        &self,
        expected: &[RelationshipStatus],
        next: &Relationship,
    ) -> Result<TransitionOutcome, StoreError>;

    /// Remove every record whose `expires_at` is at or before `now`;
    /// returns the number removed
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
