// ABOUTME: Integration tests for the relationship lifecycle state machine
// ABOUTME: Covers invitations, claims, direct creation, acceptance, ending, and concurrent claims
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

// Test files: allow missing_docs (rustc lint) and unwrap (valid in tests)
#![allow(missing_docs, clippy::unwrap_used)]

use chrono::{Duration, Utc};
use liftlink::errors::RelationshipError;
use liftlink::models::{Relationship, RelationshipStatus};
use liftlink::services::{RelationshipConfig, RelationshipLifecycle};
use liftlink::store::{MemoryStore, RelationshipStore};
use std::sync::Arc;

fn test_lifecycle() -> (RelationshipLifecycle<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let lifecycle = RelationshipLifecycle::new(store.clone(), RelationshipConfig::default());
    (lifecycle, store)
}

// ============================================================================
// Invitation Flow
// ============================================================================

#[tokio::test]
async fn test_create_invitation_then_claim() {
    let (lifecycle, _store) = test_lifecycle();

    let invitation = lifecycle.create_invitation("coach-1").await.unwrap();
    assert_eq!(invitation.coach_id, "coach-1");
    assert_eq!(invitation.status, RelationshipStatus::Pending);
    assert!(invitation.athlete_id.is_none());
    assert!(invitation.created_at.is_none());
    invitation.check_invariants().unwrap();

    let code = invitation.invitation_code.clone().unwrap();
    assert_eq!(code.len(), 6);

    let window = invitation.expires_at.unwrap() - Utc::now();
    assert!(window <= Duration::hours(24));
    assert!(window > Duration::hours(23));

    let claimed = lifecycle.claim_invitation(&code, "athlete-1").await.unwrap();
    assert_eq!(claimed.relationship_id, invitation.relationship_id);
    assert_eq!(claimed.status, RelationshipStatus::Active);
    assert_eq!(claimed.athlete_id.as_deref(), Some("athlete-1"));
    assert!(claimed.created_at.is_some());
    assert!(claimed.invitation_code.is_none());
    assert!(claimed.expires_at.is_none());
    claimed.check_invariants().unwrap();
}

#[tokio::test]
async fn test_claim_unknown_code() {
    let (lifecycle, _store) = test_lifecycle();

    let err = lifecycle
        .claim_invitation("BADCOD", "athlete-1")
        .await
        .unwrap_err();
    assert!(matches!(err, RelationshipError::InvalidCode { .. }));
}

#[tokio::test]
async fn test_claim_expired_code() {
    let (lifecycle, store) = test_lifecycle();

    // The record sits in the store past its claim window, as it does during
    // the grace period before the background sweep removes it.
    let expired =
        Relationship::new_invitation("coach-1", "EXPIRD", Utc::now() - Duration::seconds(1));
    store.insert(&expired).await.unwrap();

    let err = lifecycle
        .claim_invitation("EXPIRD", "athlete-1")
        .await
        .unwrap_err();
    assert!(matches!(err, RelationshipError::ExpiredCode { .. }));

    // Expiry was decided against the clock, not inferred from absence.
    let still_there = store.get(&expired.relationship_id).await.unwrap();
    assert!(still_there.is_some());
}

#[tokio::test]
async fn test_claim_while_already_coached() {
    let (lifecycle, _store) = test_lifecycle();

    let first = lifecycle.create_invitation("coach-1").await.unwrap();
    lifecycle
        .claim_invitation(&first.invitation_code.unwrap(), "athlete-1")
        .await
        .unwrap();

    let second = lifecycle.create_invitation("coach-2").await.unwrap();
    let second_code = second.invitation_code.unwrap();
    let err = lifecycle
        .claim_invitation(&second_code, "athlete-1")
        .await
        .unwrap_err();
    assert!(matches!(err, RelationshipError::AlreadyCoached { .. }));

    // The rejected claim left the invitation untouched for someone else.
    let claimed = lifecycle
        .claim_invitation(&second_code, "athlete-2")
        .await
        .unwrap();
    assert_eq!(claimed.status, RelationshipStatus::Active);
}

#[tokio::test]
async fn test_concurrent_claims_exactly_one_wins() {
    let (lifecycle, _store) = test_lifecycle();

    let invitation = lifecycle.create_invitation("coach-1").await.unwrap();
    let code = invitation.invitation_code.unwrap();

    let (first, second) = tokio::join!(
        lifecycle.claim_invitation(&code, "athlete-1"),
        lifecycle.claim_invitation(&code, "athlete-2"),
    );

    let wins = usize::from(first.is_ok()) + usize::from(second.is_ok());
    assert_eq!(wins, 1, "exactly one concurrent claim must win");

    let winner = if first.is_ok() { &first } else { &second };
    assert_eq!(
        winner.as_ref().unwrap().status,
        RelationshipStatus::Active,
        "the winning claim activates the relationship"
    );

    // The loser observes the consumed code as unknown or the record as
    // already transitioned, depending on interleaving.
    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(
        loser.unwrap_err(),
        RelationshipError::InvalidCode { .. } | RelationshipError::NotApplicable { .. }
    ));
}

// ============================================================================
// Invitation Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancel_unclaimed_invitation() {
    let (lifecycle, _store) = test_lifecycle();

    let invitation = lifecycle.create_invitation("coach-1").await.unwrap();
    lifecycle
        .cancel_invitation(&invitation.relationship_id)
        .await
        .unwrap();

    let err = lifecycle
        .get(&invitation.relationship_id)
        .await
        .unwrap_err();
    assert!(matches!(err, RelationshipError::NotFound { .. }));
}

#[tokio::test]
async fn test_cancel_claimed_invitation_rejected() {
    let (lifecycle, _store) = test_lifecycle();

    let invitation = lifecycle.create_invitation("coach-1").await.unwrap();
    lifecycle
        .claim_invitation(&invitation.invitation_code.clone().unwrap(), "athlete-1")
        .await
        .unwrap();

    let err = lifecycle
        .cancel_invitation(&invitation.relationship_id)
        .await
        .unwrap_err();
    assert!(matches!(err, RelationshipError::NotApplicable { .. }));
}

#[tokio::test]
async fn test_cancel_direct_relationship_rejected() {
    let (lifecycle, _store) = test_lifecycle();

    // Direct records are never claimable invitations, pending or not.
    let direct = lifecycle
        .create_direct("coach-1", "athlete-1")
        .await
        .unwrap();
    let err = lifecycle
        .cancel_invitation(&direct.relationship_id)
        .await
        .unwrap_err();
    assert!(matches!(err, RelationshipError::NotApplicable { .. }));
}

// ============================================================================
// Direct Creation and Acceptance
// ============================================================================

#[tokio::test]
async fn test_create_direct_then_accept() {
    let (lifecycle, _store) = test_lifecycle();

    let direct = lifecycle
        .create_direct("coach-1", "athlete-1")
        .await
        .unwrap();
    assert_eq!(direct.status, RelationshipStatus::Pending);
    assert_eq!(direct.athlete_id.as_deref(), Some("athlete-1"));
    assert!(direct.created_at.is_some());
    assert!(direct.invitation_code.is_none());
    direct.check_invariants().unwrap();

    let accepted = lifecycle.accept(&direct.relationship_id).await.unwrap();
    assert_eq!(accepted.status, RelationshipStatus::Active);
    accepted.check_invariants().unwrap();
}

#[tokio::test]
async fn test_create_direct_idempotent_once_active() {
    let (lifecycle, _store) = test_lifecycle();

    let first = lifecycle
        .create_direct("coach-1", "athlete-1")
        .await
        .unwrap();
    lifecycle.accept(&first.relationship_id).await.unwrap();

    let again = lifecycle
        .create_direct("coach-1", "athlete-1")
        .await
        .unwrap();
    assert_eq!(again.relationship_id, first.relationship_id);
    assert_eq!(again.status, RelationshipStatus::Active);

    let all = lifecycle.list_for_coach("coach-1", None).await.unwrap();
    assert_eq!(all.len(), 1, "no duplicate record for an active pair");
}

#[tokio::test]
async fn test_create_direct_twice_while_pending_duplicates() {
    let (lifecycle, _store) = test_lifecycle();

    let first = lifecycle
        .create_direct("coach-2", "athlete-2")
        .await
        .unwrap();
    assert_eq!(first.status, RelationshipStatus::Pending);

    // Only an active pair short-circuits; a pending one does not, so the
    // second call produces a second pending record. Documented behavior.
    let second = lifecycle
        .create_direct("coach-2", "athlete-2")
        .await
        .unwrap();
    assert_eq!(second.status, RelationshipStatus::Pending);
    assert_ne!(first.relationship_id, second.relationship_id);

    let pending = lifecycle
        .list_for_coach("coach-2", Some(RelationshipStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 2);
}

#[tokio::test]
async fn test_accept_pure_invitation_rejected() {
    let (lifecycle, _store) = test_lifecycle();

    // An unclaimed invitation has no athlete to accept it.
    let invitation = lifecycle.create_invitation("coach-1").await.unwrap();
    let err = lifecycle
        .accept(&invitation.relationship_id)
        .await
        .unwrap_err();
    assert!(matches!(err, RelationshipError::NotApplicable { .. }));
}

#[tokio::test]
async fn test_accept_missing_relationship() {
    let (lifecycle, _store) = test_lifecycle();

    let err = lifecycle.accept("no-such-id").await.unwrap_err();
    assert!(matches!(err, RelationshipError::NotFound { .. }));
}

// ============================================================================
// Ending
// ============================================================================

#[tokio::test]
async fn test_end_active_relationship() {
    let (lifecycle, _store) = test_lifecycle();

    let direct = lifecycle
        .create_direct("coach-1", "athlete-1")
        .await
        .unwrap();
    lifecycle.accept(&direct.relationship_id).await.unwrap();

    let ended = lifecycle.end(&direct.relationship_id).await.unwrap();
    assert_eq!(ended.status, RelationshipStatus::Ended);
    ended.check_invariants().unwrap();

    let retention = ended.expires_at.unwrap() - Utc::now();
    assert!(retention <= Duration::days(60));
    assert!(retention > Duration::days(59));
}

#[tokio::test]
async fn test_end_pending_relationship() {
    let (lifecycle, _store) = test_lifecycle();

    let direct = lifecycle
        .create_direct("coach-1", "athlete-1")
        .await
        .unwrap();
    let ended = lifecycle.end(&direct.relationship_id).await.unwrap();
    assert_eq!(ended.status, RelationshipStatus::Ended);
}

#[tokio::test]
async fn test_end_is_terminal() {
    let (lifecycle, _store) = test_lifecycle();

    let direct = lifecycle
        .create_direct("coach-1", "athlete-1")
        .await
        .unwrap();
    lifecycle.accept(&direct.relationship_id).await.unwrap();
    lifecycle.end(&direct.relationship_id).await.unwrap();

    let end_again = lifecycle.end(&direct.relationship_id).await.unwrap_err();
    assert!(matches!(end_again, RelationshipError::NotApplicable { .. }));

    let accept_after = lifecycle.accept(&direct.relationship_id).await.unwrap_err();
    assert!(matches!(
        accept_after,
        RelationshipError::NotApplicable { .. }
    ));

    let record = lifecycle.get(&direct.relationship_id).await.unwrap();
    assert_eq!(record.status, RelationshipStatus::Ended);
}

#[tokio::test]
async fn test_end_missing_relationship() {
    let (lifecycle, _store) = test_lifecycle();

    let err = lifecycle.end("no-such-id").await.unwrap_err();
    assert!(matches!(err, RelationshipError::NotFound { .. }));
}

#[tokio::test]
async fn test_ended_athlete_can_be_coached_again() {
    let (lifecycle, _store) = test_lifecycle();

    let direct = lifecycle
        .create_direct("coach-1", "athlete-1")
        .await
        .unwrap();
    lifecycle.accept(&direct.relationship_id).await.unwrap();
    lifecycle.end(&direct.relationship_id).await.unwrap();

    // The ended record no longer counts against the one-coach rule.
    let invitation = lifecycle.create_invitation("coach-2").await.unwrap();
    let claimed = lifecycle
        .claim_invitation(&invitation.invitation_code.unwrap(), "athlete-1")
        .await
        .unwrap();
    assert_eq!(claimed.status, RelationshipStatus::Active);
    assert_eq!(claimed.coach_id, "coach-2");
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_list_for_coach_with_status_filter() {
    let (lifecycle, _store) = test_lifecycle();

    lifecycle.create_invitation("coach-1").await.unwrap();
    let direct = lifecycle
        .create_direct("coach-1", "athlete-1")
        .await
        .unwrap();
    lifecycle.accept(&direct.relationship_id).await.unwrap();

    let all = lifecycle.list_for_coach("coach-1", None).await.unwrap();
    assert_eq!(all.len(), 2);

    let active = lifecycle
        .list_for_coach("coach-1", Some(RelationshipStatus::Active))
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].relationship_id, direct.relationship_id);

    let ended = lifecycle
        .list_for_coach("coach-1", Some(RelationshipStatus::Ended))
        .await
        .unwrap();
    assert!(ended.is_empty());
}

#[tokio::test]
async fn test_list_for_athlete() {
    let (lifecycle, _store) = test_lifecycle();

    let direct = lifecycle
        .create_direct("coach-1", "athlete-1")
        .await
        .unwrap();
    lifecycle
        .create_direct("coach-2", "athlete-1")
        .await
        .unwrap();

    let all = lifecycle.list_for_athlete("athlete-1", None).await.unwrap();
    assert_eq!(all.len(), 2);

    lifecycle.accept(&direct.relationship_id).await.unwrap();
    let active = lifecycle
        .list_for_athlete("athlete-1", Some(RelationshipStatus::Active))
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].coach_id, "coach-1");
}

#[tokio::test]
async fn test_active_coach_for_athlete() {
    let (lifecycle, _store) = test_lifecycle();

    let none = lifecycle
        .active_coach_for_athlete("athlete-1")
        .await
        .unwrap();
    assert!(none.is_none());

    let direct = lifecycle
        .create_direct("coach-1", "athlete-1")
        .await
        .unwrap();
    lifecycle.accept(&direct.relationship_id).await.unwrap();

    let active = lifecycle
        .active_coach_for_athlete("athlete-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.coach_id, "coach-1");
}

#[tokio::test]
async fn test_find_invitation_skips_expired_and_claimed() {
    let (lifecycle, store) = test_lifecycle();

    let live = lifecycle.create_invitation("coach-1").await.unwrap();
    let live_code = live.invitation_code.clone().unwrap();
    assert!(lifecycle.find_invitation(&live_code).await.unwrap().is_some());

    let expired =
        Relationship::new_invitation("coach-1", "OLDONE", Utc::now() - Duration::seconds(1));
    store.insert(&expired).await.unwrap();
    assert!(lifecycle.find_invitation("OLDONE").await.unwrap().is_none());

    lifecycle
        .claim_invitation(&live_code, "athlete-1")
        .await
        .unwrap();
    assert!(lifecycle.find_invitation(&live_code).await.unwrap().is_none());
}

// ============================================================================
// Input Validation
// ============================================================================

#[tokio::test]
async fn test_blank_identifiers_rejected() {
    let (lifecycle, _store) = test_lifecycle();

    let err = lifecycle.create_invitation("  ").await.unwrap_err();
    assert!(matches!(err, RelationshipError::InvalidInput { .. }));

    let err = lifecycle.claim_invitation("ABC123", "").await.unwrap_err();
    assert!(matches!(err, RelationshipError::InvalidInput { .. }));

    let err = lifecycle.create_direct("", "athlete-1").await.unwrap_err();
    assert!(matches!(err, RelationshipError::InvalidInput { .. }));

    let err = lifecycle.create_direct("coach-1", " ").await.unwrap_err();
    assert!(matches!(err, RelationshipError::InvalidInput { .. }));
}

// ============================================================================
// Expiry Sweep Interaction
// ============================================================================

#[tokio::test]
async fn test_purge_removes_expired_records_only() {
    let (lifecycle, store) = test_lifecycle();

    let live = lifecycle.create_invitation("coach-1").await.unwrap();
    let expired_invitation =
        Relationship::new_invitation("coach-2", "OLDINV", Utc::now() - Duration::hours(1));
    store.insert(&expired_invitation).await.unwrap();

    let stale_ended = Relationship::new_direct("coach-3", "athlete-3", Utc::now())
        .into_ended(Utc::now() - Duration::days(1));
    store.insert(&stale_ended).await.unwrap();

    let purged = store.purge_expired(Utc::now()).await.unwrap();
    assert_eq!(purged, 2);

    assert!(store.get(&live.relationship_id).await.unwrap().is_some());
    assert!(store
        .get(&expired_invitation.relationship_id)
        .await
        .unwrap()
        .is_none());
    assert!(store.get(&stale_ended.relationship_id).await.unwrap().is_none());
}
