// ABOUTME: Store factory with backend selection from the database URL
// ABOUTME: Unified enum over the in-memory and SQLite relationship stores
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

//! Store factory for creating relationship store backends
//!
//! Detects the backend from the configured database URL and hands back a
//! single dispatching handle the rest of the service works against.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::memory::MemoryStore;
use super::sqlite::SqliteStore;
use super::{RelationshipStore, TransitionOutcome};
use crate::errors::StoreError;
use crate::models::{Relationship, RelationshipStatus};

/// Supported store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    /// Process-local map, lost on restart
    Memory,
    /// Embedded SQLite database file (or `sqlite::memory:`)
    Sqlite,
}

/// Store instance wrapper that delegates to the selected backend
#[derive(Debug, Clone)]
pub enum Store {
    /// In-memory backend
    Memory(MemoryStore),
    /// SQLite backend
    Sqlite(SqliteStore),
}

impl Store {
    /// Create a store from a database URL
    ///
    /// # Errors
    ///
    /// Returns an error if the URL format is unsupported or the backend
    /// fails to initialize.
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        debug!("Detecting store type from URL: {database_url}");
        let store_type = detect_store_type(database_url)?;
        info!("Detected store type: {store_type:?}");

        match store_type {
            StoreType::Memory => Ok(Self::Memory(MemoryStore::new())),
            StoreType::Sqlite => {
                let store = SqliteStore::new(database_url).await?;
                Ok(Self::Sqlite(store))
            }
        }
    }

    /// Descriptive string for the current backend
    #[must_use]
    pub const fn backend_info(&self) -> &'static str {
        match self {
            Self::Memory(_) => "Memory (volatile, single process)",
            Self::Sqlite(_) => "SQLite (embedded file database)",
        }
    }

    /// The backend type enum
    #[must_use]
    pub const fn store_type(&self) -> StoreType {
        match self {
            Self::Memory(_) => StoreType::Memory,
            Self::Sqlite(_) => StoreType::Sqlite,
        }
    }
}

/// Automatically detect the store backend from a database URL
///
/// # Errors
///
/// Returns an error for PostgreSQL URLs (not supported by this service) and
/// for any format that is neither `memory` nor `sqlite:`.
pub fn detect_store_type(database_url: &str) -> Result<StoreType, StoreError> {
    if database_url == "memory" {
        Ok(StoreType::Memory)
    } else if database_url.starts_with("sqlite:") {
        Ok(StoreType::Sqlite)
    } else if database_url.starts_with("postgresql://") || database_url.starts_with("postgres://") {
        Err(StoreError::connection(
            "PostgreSQL is not supported by this service. \
             Supported formats: memory, sqlite:path/to/relationships.db",
        ))
    } else {
        Err(StoreError::connection(format!(
            "Unsupported database URL format: {database_url}. \
             Supported formats: memory, sqlite:path/to/relationships.db"
        )))
    }
}

#[async_trait]
impl RelationshipStore for Store {
    async fn migrate(&self) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.migrate().await,
            Self::Sqlite(store) => store.migrate().await,
        }
    }

    async fn insert(&self, relationship: &Relationship) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.insert(relationship).await,
            Self::Sqlite(store) => store.insert(relationship).await,
        }
    }

    async fn get(&self, relationship_id: &str) -> Result<Option<Relationship>, StoreError> {
        match self {
            Self::Memory(store) => store.get(relationship_id).await,
            Self::Sqlite(store) => store.get(relationship_id).await,
        }
    }

    async fn delete(&self, relationship_id: &str) -> Result<bool, StoreError> {
        match self {
            Self::Memory(store) => store.delete(relationship_id).await,
            Self::Sqlite(store) => store.delete(relationship_id).await,
        }
    }

    async fn list_by_coach(
        &self,
        coach_id: &str,
        status: Option<RelationshipStatus>,
    ) -> Result<Vec<Relationship>, StoreError> {
        match self {
            Self::Memory(store) => store.list_by_coach(coach_id, status).await,
            Self::Sqlite(store) => store.list_by_coach(coach_id, status).await,
        }
    }

    async fn list_by_athlete(
        &self,
        athlete_id: &str,
        status: Option<RelationshipStatus>,
    ) -> Result<Vec<Relationship>, StoreError> {
        match self {
            Self::Memory(store) => store.list_by_athlete(athlete_id, status).await,
            Self::Sqlite(store) => store.list_by_athlete(athlete_id, status).await,
        }
    }

    async fn find_by_invitation_code(
        &self,
        code: &str,
    ) -> Result<Option<Relationship>, StoreError> {
        match self {
            Self::Memory(store) => store.find_by_invitation_code(code).await,
            Self::Sqlite(store) => store.find_by_invitation_code(code).await,
        }
    }

    async fn find_pair(
        &self,
        coach_id: &str,
        athlete_id: &str,
        status: RelationshipStatus,
    ) -> Result<Option<Relationship>, StoreError> {
        match self {
            Self::Memory(store) => store.find_pair(coach_id, athlete_id, status).await,
            Self::Sqlite(store) => store.find_pair(coach_id, athlete_id, status).await,
        }
    }

    async fn update_if_status(
        &self,
        expected: &[RelationshipStatus],
        next: &Relationship,
    ) -> Result<TransitionOutcome, StoreError> {
        match self {
            Self::Memory(store) => store.update_if_status(expected, next).await,
            Self::Sqlite(store) => store.update_if_status(expected, next).await,
        }
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        match self {
            Self::Memory(store) => store.purge_expired(now).await,
            Self::Sqlite(store) => store.purge_expired(now).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_store_type() {
        assert_eq!(detect_store_type("memory").unwrap(), StoreType::Memory);
        assert_eq!(
            detect_store_type("sqlite:./data/relationships.db").unwrap(),
            StoreType::Sqlite
        );
        assert_eq!(
            detect_store_type("sqlite::memory:").unwrap(),
            StoreType::Sqlite
        );
        assert!(detect_store_type("postgresql://localhost/liftlink").is_err());
        assert!(detect_store_type("mysql://localhost/liftlink").is_err());
    }

    #[tokio::test]
    async fn test_factory_builds_memory_store() {
        let store = Store::new("memory").await.unwrap();
        assert_eq!(store.store_type(), StoreType::Memory);
        assert!(store.backend_info().contains("Memory"));
    }
}
