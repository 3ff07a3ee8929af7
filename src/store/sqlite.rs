// ABOUTME: SQLite relationship store built on an sqlx connection pool
// ABOUTME: Schema migration, indexed lookups, and a status-guarded conditional update
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{RelationshipStore, TransitionOutcome};
use crate::errors::StoreError;
use crate::models::{Relationship, RelationshipStatus};

/// SQLite-backed relationship store
///
/// Timestamps are persisted in two shapes: `created_at` as RFC 3339 text and
/// `expires_at` as integer epoch seconds, the unit the expiry sweep compares
/// against. The conditional update is a single `UPDATE .. WHERE status IN`
/// statement checked through `rows_affected`, so concurrent transitions on
/// one record resolve inside the database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to the database, creating the file if needed, and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or the schema
    /// cannot be created.
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options)
            .await
            .map_err(|e| StoreError::connection(format!("Failed to open {database_url}: {e}")))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Wrap an existing pool without running migrations
    #[must_use]
    pub const fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Reference to the underlying pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn row_to_relationship(row: &SqliteRow) -> Result<Relationship, StoreError> {
        let relationship_id: String = row.try_get("relationship_id")?;
        let coach_id: String = row.try_get("coach_id")?;
        let athlete_id: Option<String> = row.try_get("athlete_id")?;
        let status_str: String = row.try_get("status")?;
        let created_at_str: Option<String> = row.try_get("created_at")?;
        let invitation_code: Option<String> = row.try_get("invitation_code")?;
        let expires_at_secs: Option<i64> = row.try_get("expires_at")?;

        let status: RelationshipStatus = status_str
            .parse()
            .map_err(|_| StoreError::corrupt(format!("unknown status '{status_str}'")))?;

        let created_at = created_at_str
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| StoreError::corrupt(format!("invalid created_at '{s}': {e}")))
            })
            .transpose()?;

        let expires_at = expires_at_secs
            .map(|secs| {
                DateTime::from_timestamp(secs, 0)
                    .ok_or_else(|| StoreError::corrupt(format!("invalid expires_at {secs}")))
            })
            .transpose()?;

        Ok(Relationship {
            relationship_id,
            coach_id,
            athlete_id,
            status,
            created_at,
            invitation_code,
            expires_at,
        })
    }
}

#[async_trait]
impl RelationshipStore for SqliteStore {
    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS relationships (
                relationship_id TEXT PRIMARY KEY,
                coach_id TEXT NOT NULL,
                athlete_id TEXT,
                status TEXT NOT NULL,
                created_at TEXT,
                invitation_code TEXT,
                expires_at INTEGER
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::query(format!("Failed to create relationships table: {e}")))?;

        let indexes = [
            "CREATE INDEX IF NOT EXISTS idx_relationships_coach ON relationships(coach_id)",
            "CREATE INDEX IF NOT EXISTS idx_relationships_athlete ON relationships(athlete_id)",
            "CREATE INDEX IF NOT EXISTS idx_relationships_pair ON relationships(coach_id, athlete_id)",
            "CREATE INDEX IF NOT EXISTS idx_relationships_code ON relationships(invitation_code)",
            "CREATE INDEX IF NOT EXISTS idx_relationships_expiry ON relationships(expires_at)",
        ];
        for statement in indexes {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::query(format!("Failed to create index: {e}")))?;
        }

        Ok(())
    }

    async fn insert(&self, relationship: &Relationship) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO relationships (
                relationship_id, coach_id, athlete_id, status,
                created_at, invitation_code, expires_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&relationship.relationship_id)
        .bind(&relationship.coach_id)
        .bind(relationship.athlete_id.as_deref())
        .bind(relationship.status.as_str())
        .bind(relationship.created_at.map(|dt| dt.to_rfc3339()))
        .bind(relationship.invitation_code.as_deref())
        .bind(relationship.expires_at.map(|dt| dt.timestamp()))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::query(format!("Failed to insert relationship: {e}")))?;

        Ok(())
    }

    async fn get(&self, relationship_id: &str) -> Result<Option<Relationship>, StoreError> {
        let row = sqlx::query(
            r"
            SELECT relationship_id, coach_id, athlete_id, status,
                   created_at, invitation_code, expires_at
            FROM relationships
            WHERE relationship_id = $1
            ",
        )
        .bind(relationship_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::query(format!("Failed to get relationship: {e}")))?;

        row.map(|r| Self::row_to_relationship(&r)).transpose()
    }

    async fn delete(&self, relationship_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM relationships WHERE relationship_id = $1")
            .bind(relationship_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::query(format!("Failed to delete relationship: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_coach(
        &self,
        coach_id: &str,
        status: Option<RelationshipStatus>,
    ) -> Result<Vec<Relationship>, StoreError> {
        let rows = match status {
            Some(wanted) => {
                sqlx::query(
                    r"
                    SELECT relationship_id, coach_id, athlete_id, status,
                           created_at, invitation_code, expires_at
                    FROM relationships
                    WHERE coach_id = $1 AND status = $2
                    ",
                )
                .bind(coach_id)
                .bind(wanted.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r"
                    SELECT relationship_id, coach_id, athlete_id, status,
                           created_at, invitation_code, expires_at
                    FROM relationships
                    WHERE coach_id = $1
                    ",
                )
                .bind(coach_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| StoreError::query(format!("Failed to list coach relationships: {e}")))?;

        rows.iter().map(Self::row_to_relationship).collect()
    }

    async fn list_by_athlete(
        &self,
        athlete_id: &str,
        status: Option<RelationshipStatus>,
    ) -> Result<Vec<Relationship>, StoreError> {
        let rows = match status {
            Some(wanted) => {
                sqlx::query(
                    r"
                    SELECT relationship_id, coach_id, athlete_id, status,
                           created_at, invitation_code, expires_at
                    FROM relationships
                    WHERE athlete_id = $1 AND status = $2
                    ",
                )
                .bind(athlete_id)
                .bind(wanted.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r"
                    SELECT relationship_id, coach_id, athlete_id, status,
                           created_at, invitation_code, expires_at
                    FROM relationships
                    WHERE athlete_id = $1
                    ",
                )
                .bind(athlete_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| StoreError::query(format!("Failed to list athlete relationships: {e}")))?;

        rows.iter().map(Self::row_to_relationship).collect()
    }

    async fn find_by_invitation_code(
        &self,
        code: &str,
    ) -> Result<Option<Relationship>, StoreError> {
        let row = sqlx::query(
            r"
            SELECT relationship_id, coach_id, athlete_id, status,
                   created_at, invitation_code, expires_at
            FROM relationships
            WHERE invitation_code = $1
            ",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::query(format!("Failed to look up invitation code: {e}")))?;

        row.map(|r| Self::row_to_relationship(&r)).transpose()
    }

    async fn find_pair(
        &self,
        coach_id: &str,
        athlete_id: &str,
        status: RelationshipStatus,
    ) -> Result<Option<Relationship>, StoreError> {
        let row = sqlx::query(
            r"
            SELECT relationship_id, coach_id, athlete_id, status,
                   created_at, invitation_code, expires_at
            FROM relationships
            WHERE coach_id = $1 AND athlete_id = $2 AND status = $3
            ",
        )
        .bind(coach_id)
        .bind(athlete_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::query(format!("Failed to look up pair: {e}")))?;

        row.map(|r| Self::row_to_relationship(&r)).transpose()
    }

    async fn update_if_status(
        &self,
        expected: &[RelationshipStatus],
        next: &Relationship,
    ) -> Result<TransitionOutcome, StoreError> {
        if !expected.is_empty() {
            // Placeholders must appear in ascending order in the SQL text;
            // SQLite numbers $N parameters by first occurrence and sqlx binds
            // sequentially.
            let placeholders = (0..expected.len())
                .map(|i| format!("${}", i + 8))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "UPDATE relationships \
                 SET coach_id = $1, athlete_id = $2, status = $3, \
                     created_at = $4, invitation_code = $5, expires_at = $6 \
                 WHERE relationship_id = $7 AND status IN ({placeholders})",
            );

            let mut query = sqlx::query(&sql)
                .bind(&next.coach_id)
                .bind(next.athlete_id.as_deref())
                .bind(next.status.as_str())
                .bind(next.created_at.map(|dt| dt.to_rfc3339()))
                .bind(next.invitation_code.as_deref())
                .bind(next.expires_at.map(|dt| dt.timestamp()))
                .bind(&next.relationship_id);
            for status in expected {
                query = query.bind(status.as_str());
            }

            let result = query
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::query(format!("Failed conditional update: {e}")))?;

            if result.rows_affected() > 0 {
                return Ok(TransitionOutcome::Applied);
            }
        }

        // Lost or inapplicable: report the state that blocked the write.
        match self.get(&next.relationship_id).await? {
            Some(current) => Ok(TransitionOutcome::StatusMismatch(current.status)),
            None => Ok(TransitionOutcome::Missing),
        }
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM relationships WHERE expires_at IS NOT NULL AND expires_at <= $1",
        )
        .bind(now.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::query(format!("Failed to purge expired relationships: {e}")))?;

        Ok(result.rows_affected())
    }
}
