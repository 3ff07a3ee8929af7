// ABOUTME: In-memory relationship store backed by DashMap
// ABOUTME: Per-record entry locking makes conditional transitions race-safe
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{RelationshipStore, TransitionOutcome};
use crate::errors::StoreError;
use crate::models::{Relationship, RelationshipStatus};

/// In-memory store for local development and tests
///
/// Records live in a concurrent hash map keyed by relationship id. Secondary
/// lookups scan the map; list results come back in map iteration order, which
/// satisfies the store-native ordering contract. The conditional update runs
/// under the map's per-key entry lock, so two concurrent transitions on the
/// same record serialize and exactly one wins.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<DashMap<String, Relationship>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, including expired-but-unswept ones
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn matches_status(relationship: &Relationship, status: Option<RelationshipStatus>) -> bool {
        status.map_or(true, |wanted| relationship.status == wanted)
    }
}

#[async_trait]
impl RelationshipStore for MemoryStore {
    async fn migrate(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert(&self, relationship: &Relationship) -> Result<(), StoreError> {
        match self.records.entry(relationship.relationship_id.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(relationship.clone());
                Ok(())
            }
            Entry::Occupied(_) => Err(StoreError::query(format!(
                "relationship {} already exists",
                relationship.relationship_id
            ))),
        }
    }

    async fn get(&self, relationship_id: &str) -> Result<Option<Relationship>, StoreError> {
        Ok(self
            .records
            .get(relationship_id)
            .map(|entry| entry.value().clone()))
    }

    async fn delete(&self, relationship_id: &str) -> Result<bool, StoreError> {
        Ok(self.records.remove(relationship_id).is_some())
    }

    async fn list_by_coach(
        &self,
        coach_id: &str,
        status: Option<RelationshipStatus>,
    ) -> Result<Vec<Relationship>, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|entry| {
                entry.value().coach_id == coach_id && Self::matches_status(entry.value(), status)
            })
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn list_by_athlete(
        &self,
        athlete_id: &str,
        status: Option<RelationshipStatus>,
    ) -> Result<Vec<Relationship>, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|entry| {
                entry.value().athlete_id.as_deref() == Some(athlete_id)
                    && Self::matches_status(entry.value(), status)
            })
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn find_by_invitation_code(
        &self,
        code: &str,
    ) -> Result<Option<Relationship>, StoreError> {
        Ok(self
            .records
            .iter()
            .find(|entry| entry.value().invitation_code.as_deref() == Some(code))
            .map(|entry| entry.value().clone()))
    }

    async fn find_pair(
        &self,
        coach_id: &str,
        athlete_id: &str,
        status: RelationshipStatus,
    ) -> Result<Option<Relationship>, StoreError> {
        Ok(self
            .records
            .iter()
            .find(|entry| {
                let relationship = entry.value();
                relationship.coach_id == coach_id
                    && relationship.athlete_id.as_deref() == Some(athlete_id)
                    && relationship.status == status
            })
            .map(|entry| entry.value().clone()))
    }

    async fn update_if_status(
        &self,
        expected: &[RelationshipStatus],
        next: &Relationship,
    ) -> Result<TransitionOutcome, StoreError> {
        match self.records.entry(next.relationship_id.clone()) {
            Entry::Occupied(mut entry) => {
                let current = entry.get().status;
                if expected.contains(&current) {
                    entry.insert(next.clone());
                    Ok(TransitionOutcome::Applied)
                } else {
                    Ok(TransitionOutcome::StatusMismatch(current))
                }
            }
            Entry::Vacant(_) => Ok(TransitionOutcome::Missing),
        }
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut purged = 0_u64;
        self.records.retain(|_, relationship| {
            if relationship.is_expired(now) {
                purged += 1;
                false
            } else {
                true
            }
        });
        Ok(purged)
    }
}
