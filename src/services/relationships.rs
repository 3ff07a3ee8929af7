// ABOUTME: Relationship lifecycle state machine for coach-athlete pairings
// ABOUTME: Invitation issue/claim/cancel, direct creation, acceptance, and termination
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

//! Coach-athlete relationship lifecycle
//!
//! All state transitions go through this component. Every transition is a
//! single conditional store write (update only if the current status matches
//! the expected pre-transition status), so two concurrent claims on one code,
//! or a claim racing the expiry sweeper, produce exactly one winner. State
//! lives entirely in the injected store handle; this component holds no
//! mutable state of its own and performs no retries.
//!
//! The one-active-coach-per-athlete rule is enforced by a check-then-act
//! sequence (list active, then create/claim) without a cross-record
//! transactional guard, so it stays best-effort under concurrency: a second
//! concurrent claim by the same athlete through a different code can race
//! past the check.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::{debug, info};

use crate::constants::{invitations, retention};
use crate::errors::{RelationshipError, RelationshipResult};
use crate::models::{Relationship, RelationshipStatus};
use crate::store::{RelationshipStore, TransitionOutcome};

/// Timing knobs for the relationship lifecycle
#[derive(Debug, Clone)]
pub struct RelationshipConfig {
    /// How long a freshly issued invitation stays claimable
    pub invitation_ttl: Duration,
    /// How long an ended relationship stays stored before the sweeper purges it
    pub ended_retention: Duration,
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            invitation_ttl: Duration::hours(invitations::DEFAULT_TTL_HOURS),
            ended_retention: Duration::days(retention::DEFAULT_ENDED_RETENTION_DAYS),
        }
    }
}

/// Relationship lifecycle operations over an injected store handle
#[derive(Debug, Clone)]
pub struct RelationshipLifecycle<S> {
    store: Arc<S>,
    config: RelationshipConfig,
}

impl<S: RelationshipStore> RelationshipLifecycle<S> {
    /// Create a lifecycle component backed by the given store
    #[must_use]
    pub const fn new(store: Arc<S>, config: RelationshipConfig) -> Self {
        Self { store, config }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Issue a fresh invitation from a coach
    ///
    /// Persists a pending record with a generated 6-character code and
    /// `expires_at` one invitation TTL from now. The record carries no
    /// athlete and no `created_at` until the code is claimed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank coach id, or `StoreUnavailable` if
    /// the store write fails.
    pub async fn create_invitation(&self, coach_id: &str) -> RelationshipResult<Relationship> {
        if coach_id.trim().is_empty() {
            return Err(RelationshipError::invalid_input("Coach ID cannot be empty"));
        }

        let now = whole_second_now();
        let code = generate_invitation_code();
        let invitation =
            Relationship::new_invitation(coach_id, code, now + self.config.invitation_ttl);
        self.store.insert(&invitation).await?;

        info!(
            "Created invitation {} for coach {coach_id}",
            invitation.relationship_id
        );
        Ok(invitation)
    }

    /// Claim an invitation code on behalf of an athlete
    ///
    /// Preconditions are checked in a fixed order, first failure wins:
    /// the athlete must not already have an active coach (`AlreadyCoached`),
    /// the code must resolve to a stored record (`InvalidCode`), and the
    /// record's expiry must be in the future against wall-clock time
    /// (`ExpiredCode`). The expiry check is explicit rather than trusting
    /// absence-on-miss: an expired record may still be visible until the
    /// background sweeper removes it.
    ///
    /// On success the record becomes active with the athlete and
    /// `created_at` set and the code and expiry cleared. The transition is
    /// conditional on the record still being pending, so the loser of a
    /// concurrent claim gets `InvalidCode` or `NotApplicable`.
    ///
    /// # Errors
    ///
    /// `AlreadyCoached`, `InvalidCode`, `ExpiredCode`, `NotApplicable`,
    /// `InvalidInput` for a blank athlete id, or `StoreUnavailable`.
    pub async fn claim_invitation(
        &self,
        code: &str,
        athlete_id: &str,
    ) -> RelationshipResult<Relationship> {
        if athlete_id.trim().is_empty() {
            return Err(RelationshipError::invalid_input(
                "Athlete ID cannot be empty",
            ));
        }

        let now = whole_second_now();

        if let Some(existing) = self.active_coach_for_athlete(athlete_id).await? {
            debug!(
                "Claim by athlete {athlete_id} rejected: already coached by {}",
                existing.coach_id
            );
            return Err(RelationshipError::already_coached(athlete_id));
        }

        let record = self
            .store
            .find_by_invitation_code(code)
            .await?
            .ok_or_else(|| RelationshipError::invalid_code(code))?;

        if record.is_expired(now) {
            let expired_at = record.expires_at.unwrap_or(now);
            return Err(RelationshipError::expired_code(code, expired_at));
        }

        let next = record.into_claimed(athlete_id, now);
        match self
            .store
            .update_if_status(&[RelationshipStatus::Pending], &next)
            .await?
        {
            TransitionOutcome::Applied => {
                info!(
                    "Athlete {athlete_id} claimed invitation {} from coach {}",
                    next.relationship_id, next.coach_id
                );
                Ok(next)
            }
            // The record vanished between lookup and update: either the
            // sweeper purged it or a concurrent cancel deleted it.
            TransitionOutcome::Missing => Err(RelationshipError::invalid_code(code)),
            TransitionOutcome::StatusMismatch(current) => Err(RelationshipError::not_applicable(
                next.relationship_id,
                current,
            )),
        }
    }

    /// Create a relationship directly when both parties are already linked
    /// out-of-band
    ///
    /// Idempotent against an existing active pair: if this coach and athlete
    /// already have an active relationship, that record is returned unchanged
    /// and nothing is created. Otherwise a new pending record with both ids
    /// is persisted, awaiting a separate [`accept`](Self::accept). A pending
    /// (not yet accepted) pair does not suppress creation, so repeated calls
    /// before acceptance produce duplicate pending records.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for blank ids, or `StoreUnavailable`.
    pub async fn create_direct(
        &self,
        coach_id: &str,
        athlete_id: &str,
    ) -> RelationshipResult<Relationship> {
        if coach_id.trim().is_empty() {
            return Err(RelationshipError::invalid_input("Coach ID cannot be empty"));
        }
        if athlete_id.trim().is_empty() {
            return Err(RelationshipError::invalid_input(
                "Athlete ID cannot be empty",
            ));
        }

        if let Some(existing) = self
            .store
            .find_pair(coach_id, athlete_id, RelationshipStatus::Active)
            .await?
        {
            debug!(
                "Direct creation matched existing active relationship {}",
                existing.relationship_id
            );
            return Ok(existing);
        }

        let relationship = Relationship::new_direct(coach_id, athlete_id, whole_second_now());
        self.store.insert(&relationship).await?;

        info!(
            "Created direct relationship {} between coach {coach_id} and athlete {athlete_id}",
            relationship.relationship_id
        );
        Ok(relationship)
    }

    /// Accept a pending direct-created relationship
    ///
    /// Valid only for the direct-creation flavor of pending: a record that
    /// already carries an athlete. An unclaimed invitation has no athlete
    /// and must go through [`claim_invitation`](Self::claim_invitation), so
    /// accepting it reports `NotApplicable`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the id does not resolve, `NotApplicable` if the current
    /// status disallows the transition, or `StoreUnavailable`.
    pub async fn accept(&self, relationship_id: &str) -> RelationshipResult<Relationship> {
        let record = self
            .store
            .get(relationship_id)
            .await?
            .ok_or_else(|| RelationshipError::not_found(relationship_id))?;

        if record.athlete_id.is_none() {
            return Err(RelationshipError::not_applicable(
                relationship_id,
                record.status,
            ));
        }

        let next = record.into_active();
        match self
            .store
            .update_if_status(&[RelationshipStatus::Pending], &next)
            .await?
        {
            TransitionOutcome::Applied => {
                info!("Accepted relationship {relationship_id}");
                Ok(next)
            }
            TransitionOutcome::Missing => Err(RelationshipError::not_found(relationship_id)),
            TransitionOutcome::StatusMismatch(current) => Err(RelationshipError::not_applicable(
                relationship_id,
                current,
            )),
        }
    }

    /// Terminate a pending or active relationship
    ///
    /// The record becomes ended with `expires_at` one retention window from
    /// now; the background sweeper purges it after that. Ending an
    /// already-ended relationship reports `NotApplicable` rather than
    /// failing, so termination is idempotent from the caller's view.
    ///
    /// # Errors
    ///
    /// `NotFound` if the id does not resolve, `NotApplicable` if already
    /// ended, or `StoreUnavailable`.
    pub async fn end(&self, relationship_id: &str) -> RelationshipResult<Relationship> {
        let record = self
            .store
            .get(relationship_id)
            .await?
            .ok_or_else(|| RelationshipError::not_found(relationship_id))?;

        let retain_until = whole_second_now() + self.config.ended_retention;
        let next = record.into_ended(retain_until);
        match self
            .store
            .update_if_status(
                &[RelationshipStatus::Pending, RelationshipStatus::Active],
                &next,
            )
            .await?
        {
            TransitionOutcome::Applied => {
                info!("Ended relationship {relationship_id}");
                Ok(next)
            }
            TransitionOutcome::Missing => Err(RelationshipError::not_found(relationship_id)),
            TransitionOutcome::StatusMismatch(current) => Err(RelationshipError::not_applicable(
                relationship_id,
                current,
            )),
        }
    }

    /// Cancel an unclaimed invitation, deleting it immediately
    ///
    /// This is the one path that hard-deletes a record; every other removal
    /// happens through the store's background expiry. Only an unclaimed
    /// pending invitation can be cancelled.
    ///
    /// # Errors
    ///
    /// `NotFound` if the id does not resolve (including a cancel racing the
    /// sweeper), `NotApplicable` if the record is not an unclaimed
    /// invitation, or `StoreUnavailable`.
    pub async fn cancel_invitation(&self, relationship_id: &str) -> RelationshipResult<()> {
        let record = self
            .store
            .get(relationship_id)
            .await?
            .ok_or_else(|| RelationshipError::not_found(relationship_id))?;

        if !record.is_unclaimed_invitation() {
            return Err(RelationshipError::not_applicable(
                relationship_id,
                record.status,
            ));
        }

        if self.store.delete(relationship_id).await? {
            info!("Cancelled invitation {relationship_id}");
            Ok(())
        } else {
            Err(RelationshipError::not_found(relationship_id))
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Fetch one relationship by identifier
    ///
    /// Records past their expiry but not yet swept are still returned.
    ///
    /// # Errors
    ///
    /// `NotFound` if the id does not resolve, or `StoreUnavailable`.
    pub async fn get(&self, relationship_id: &str) -> RelationshipResult<Relationship> {
        self.store
            .get(relationship_id)
            .await?
            .ok_or_else(|| RelationshipError::not_found(relationship_id))
    }

    /// List a coach's relationships, optionally filtered by status
    ///
    /// No ordering is guaranteed beyond store-native order; callers needing
    /// determinism sort by `created_at` themselves.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if the store lookup fails.
    pub async fn list_for_coach(
        &self,
        coach_id: &str,
        status: Option<RelationshipStatus>,
    ) -> RelationshipResult<Vec<Relationship>> {
        Ok(self.store.list_by_coach(coach_id, status).await?)
    }

    /// List an athlete's relationships, optionally filtered by status
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if the store lookup fails.
    pub async fn list_for_athlete(
        &self,
        athlete_id: &str,
        status: Option<RelationshipStatus>,
    ) -> RelationshipResult<Vec<Relationship>> {
        Ok(self.store.list_by_athlete(athlete_id, status).await?)
    }

    /// The athlete's current active relationship, if any
    ///
    /// An athlete has at most one active coach, so at most one record is
    /// expected; if that rule was ever raced past, the first match in
    /// store-native order is returned.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if the store lookup fails.
    pub async fn active_coach_for_athlete(
        &self,
        athlete_id: &str,
    ) -> RelationshipResult<Option<Relationship>> {
        Ok(self
            .store
            .list_by_athlete(athlete_id, Some(RelationshipStatus::Active))
            .await?
            .into_iter()
            .next())
    }

    /// Look up a claimable invitation by its code
    ///
    /// Reads as absent unless the record is a pending, unclaimed, unexpired
    /// invitation. An expired record the sweeper has not removed yet is
    /// filtered out here; a claim attempt on it still reports `ExpiredCode`.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if the store lookup fails.
    pub async fn find_invitation(&self, code: &str) -> RelationshipResult<Option<Relationship>> {
        let now = whole_second_now();
        let found = self.store.find_by_invitation_code(code).await?;
        Ok(found.filter(|record| record.is_unclaimed_invitation() && !record.is_expired(now)))
    }
}

/// Generate a 6-character invitation code from uppercase letters and digits
///
/// Codes are drawn uniformly; the 36^6 space makes collisions negligible and
/// they are not checked against existing codes.
fn generate_invitation_code() -> String {
    let mut rng = rand::thread_rng();
    (0..invitations::CODE_LENGTH)
        .map(|_| {
            let index = rng.gen_range(0..invitations::CODE_ALPHABET.len());
            char::from(invitations::CODE_ALPHABET[index])
        })
        .collect()
}

/// Wall-clock now truncated to whole seconds, the resolution of the store's
/// epoch-second expiry column
fn whole_second_now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::store::MemoryStore;

    fn lifecycle() -> RelationshipLifecycle<MemoryStore> {
        RelationshipLifecycle::new(Arc::new(MemoryStore::new()), RelationshipConfig::default())
    }

    #[test]
    fn test_generated_codes_use_expected_shape() {
        for _ in 0..100 {
            let code = generate_invitation_code();
            assert_eq!(code.len(), invitations::CODE_LENGTH);
            assert!(code.bytes().all(|b| invitations::CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_generated_codes_do_not_repeat_in_practice() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_invitation_code()).collect();
        assert!(codes.len() > 990, "expected near-zero collisions in 36^6 space");
    }

    #[test]
    fn test_default_config_windows() {
        let config = RelationshipConfig::default();
        assert_eq!(config.invitation_ttl, Duration::hours(24));
        assert_eq!(config.ended_retention, Duration::days(60));
    }

    #[test]
    fn test_whole_second_now_has_no_subsecond_part() {
        let now = whole_second_now();
        assert_eq!(now.timestamp_subsec_nanos(), 0);
    }

    #[tokio::test]
    async fn test_create_invitation_persists_pending_record() {
        let lifecycle = lifecycle();
        let invitation = lifecycle.create_invitation("coach-1").await.unwrap();

        assert!(invitation.is_unclaimed_invitation());
        invitation.check_invariants().unwrap();

        let fetched = lifecycle.get(&invitation.relationship_id).await.unwrap();
        assert_eq!(fetched, invitation);
    }

    #[tokio::test]
    async fn test_blank_identifiers_are_rejected() {
        let lifecycle = lifecycle();

        assert!(matches!(
            lifecycle.create_invitation("  ").await,
            Err(RelationshipError::InvalidInput { .. })
        ));
        assert!(matches!(
            lifecycle.create_direct("coach-1", "").await,
            Err(RelationshipError::InvalidInput { .. })
        ));
        assert!(matches!(
            lifecycle.claim_invitation("AB12CD", "").await,
            Err(RelationshipError::InvalidInput { .. })
        ));
    }
}
