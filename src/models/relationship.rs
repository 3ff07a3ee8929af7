// ABOUTME: Coach-athlete relationship entity and its status state machine
// ABOUTME: Invitation, direct-creation, activation, and termination record shapes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::RelationshipError;

// ============================================================================
// Enums
// ============================================================================

/// Status of a coach-athlete relationship
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    /// Unclaimed invitation, or a direct creation awaiting athlete acceptance
    #[default]
    Pending,
    /// Coach and athlete are linked
    Active,
    /// Relationship terminated; terminal state
    Ended,
}

impl Display for RelationshipStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Active => write!(f, "active"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

impl FromStr for RelationshipStatus {
    type Err = RelationshipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "ended" => Ok(Self::Ended),
            _ => Err(RelationshipError::invalid_input(format!(
                "Invalid relationship status: {s}"
            ))),
        }
    }
}

impl RelationshipStatus {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }

    /// Whether this status admits no further transitions
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended)
    }
}

// ============================================================================
// Structs
// ============================================================================

/// A coach-athlete relationship record
///
/// Created either as an invitation (coach only, carrying a claimable code with
/// an expiry) or directly with both parties known. Mutated only by the
/// lifecycle operations; `ended` records are never hard-deleted by application
/// code and instead age out through the store's background expiry, except for
/// the explicit cancellation of an unclaimed invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique identifier, assigned at creation, immutable
    pub relationship_id: String,
    /// Coaching account; present for all relationships
    pub coach_id: String,
    /// Athlete account; absent while the record is an unclaimed invitation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub athlete_id: Option<String>,
    /// Current lifecycle status
    pub status: RelationshipStatus,
    /// When the relationship proper came into existence; absent for a pure
    /// invitation until it is claimed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Claimable code; present only while pending and unclaimed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_code: Option<String>,
    /// Absolute expiry consumed by the store's background removal; whole
    /// epoch seconds, absent while active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Relationship {
    /// Create an unclaimed invitation issued by a coach
    #[must_use]
    pub fn new_invitation(
        coach_id: impl Into<String>,
        invitation_code: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            relationship_id: Uuid::new_v4().to_string(),
            coach_id: coach_id.into(),
            athlete_id: None,
            status: RelationshipStatus::Pending,
            created_at: None,
            invitation_code: Some(invitation_code.into()),
            expires_at: Some(expires_at),
        }
    }

    /// Create a direct relationship with both parties known, awaiting acceptance
    #[must_use]
    pub fn new_direct(
        coach_id: impl Into<String>,
        athlete_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            relationship_id: Uuid::new_v4().to_string(),
            coach_id: coach_id.into(),
            athlete_id: Some(athlete_id.into()),
            status: RelationshipStatus::Pending,
            created_at: Some(created_at),
            invitation_code: None,
            expires_at: None,
        }
    }

    /// The record after a successful invitation claim: active, athlete set,
    /// code and expiry cleared
    #[must_use]
    pub fn into_claimed(mut self, athlete_id: impl Into<String>, claimed_at: DateTime<Utc>) -> Self {
        self.athlete_id = Some(athlete_id.into());
        self.status = RelationshipStatus::Active;
        self.created_at = self.created_at.or(Some(claimed_at));
        self.invitation_code = None;
        self.expires_at = None;
        self
    }

    /// The record after acceptance of a direct creation
    #[must_use]
    pub fn into_active(mut self) -> Self {
        self.status = RelationshipStatus::Active;
        self.invitation_code = None;
        self.expires_at = None;
        self
    }

    /// The record after termination, retained until `retain_until` for
    /// audit/undo and then purged by the store
    #[must_use]
    pub fn into_ended(mut self, retain_until: DateTime<Utc>) -> Self {
        self.status = RelationshipStatus::Ended;
        self.invitation_code = None;
        self.expires_at = Some(retain_until);
        self
    }

    /// Whether this record is an unclaimed invitation
    #[must_use]
    pub fn is_unclaimed_invitation(&self) -> bool {
        self.status == RelationshipStatus::Pending
            && self.athlete_id.is_none()
            && self.invitation_code.is_some()
    }

    /// Whether this record's expiry has passed relative to `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Audit the structural invariants of this record
    ///
    /// Returns the first violated rule as an error message. Used by tests to
    /// confirm that constructors and transitions keep records well-formed.
    pub fn check_invariants(&self) -> Result<(), String> {
        let code_present = self.invitation_code.is_some();
        let unclaimed_pending =
            self.status == RelationshipStatus::Pending && self.athlete_id.is_none();
        if code_present != unclaimed_pending {
            return Err(format!(
                "invitation_code must be present exactly on unclaimed pending records (status {}, athlete {:?}, code {:?})",
                self.status, self.athlete_id, self.invitation_code
            ));
        }

        if self.status == RelationshipStatus::Active && self.athlete_id.is_none() {
            return Err("active relationship is missing athlete_id".to_owned());
        }

        let expiring = code_present || self.status == RelationshipStatus::Ended;
        if self.expires_at.is_some() != expiring {
            return Err(format!(
                "expires_at must be present exactly on unclaimed invitations and ended records (status {}, expires_at {:?})",
                self.status, self.expires_at
            ));
        }

        if self.created_at.is_some() != self.athlete_id.is_some() {
            return Err(format!(
                "created_at must be present exactly when athlete_id is (created_at {:?}, athlete {:?})",
                self.created_at, self.athlete_id
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn whole_second_now() -> DateTime<Utc> {
        DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap()
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            RelationshipStatus::Pending,
            RelationshipStatus::Active,
            RelationshipStatus::Ended,
        ] {
            let parsed: RelationshipStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
            assert_eq!(status.to_string(), status.as_str());
        }
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        assert!("archived".parse::<RelationshipStatus>().is_err());
        assert!("".parse::<RelationshipStatus>().is_err());
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        let parsed: RelationshipStatus = "PENDING".parse().unwrap();
        assert_eq!(parsed, RelationshipStatus::Pending);
    }

    #[test]
    fn test_new_invitation_shape() {
        let expires_at = whole_second_now() + Duration::hours(24);
        let invitation = Relationship::new_invitation("coach-1", "AB12CD", expires_at);

        assert_eq!(invitation.coach_id, "coach-1");
        assert_eq!(invitation.status, RelationshipStatus::Pending);
        assert!(invitation.athlete_id.is_none());
        assert!(invitation.created_at.is_none());
        assert_eq!(invitation.invitation_code.as_deref(), Some("AB12CD"));
        assert_eq!(invitation.expires_at, Some(expires_at));
        assert!(invitation.is_unclaimed_invitation());
        invitation.check_invariants().unwrap();
    }

    #[test]
    fn test_new_direct_shape() {
        let now = whole_second_now();
        let relationship = Relationship::new_direct("coach-1", "athlete-1", now);

        assert_eq!(relationship.status, RelationshipStatus::Pending);
        assert_eq!(relationship.athlete_id.as_deref(), Some("athlete-1"));
        assert_eq!(relationship.created_at, Some(now));
        assert!(relationship.invitation_code.is_none());
        assert!(relationship.expires_at.is_none());
        assert!(!relationship.is_unclaimed_invitation());
        relationship.check_invariants().unwrap();
    }

    #[test]
    fn test_claim_clears_code_and_expiry() {
        let now = whole_second_now();
        let invitation = Relationship::new_invitation("coach-1", "AB12CD", now + Duration::hours(24));
        let claimed = invitation.into_claimed("athlete-1", now);

        assert_eq!(claimed.status, RelationshipStatus::Active);
        assert_eq!(claimed.athlete_id.as_deref(), Some("athlete-1"));
        assert_eq!(claimed.created_at, Some(now));
        assert!(claimed.invitation_code.is_none());
        assert!(claimed.expires_at.is_none());
        claimed.check_invariants().unwrap();
    }

    #[test]
    fn test_ended_record_carries_retention_expiry() {
        let now = whole_second_now();
        let retain_until = now + Duration::days(60);
        let relationship = Relationship::new_direct("coach-1", "athlete-1", now)
            .into_active()
            .into_ended(retain_until);

        assert_eq!(relationship.status, RelationshipStatus::Ended);
        assert_eq!(relationship.expires_at, Some(retain_until));
        relationship.check_invariants().unwrap();
    }

    #[test]
    fn test_ending_unclaimed_invitation_keeps_invariants() {
        let now = whole_second_now();
        let invitation = Relationship::new_invitation("coach-1", "AB12CD", now + Duration::hours(24));
        let ended = invitation.into_ended(now + Duration::days(60));

        assert_eq!(ended.status, RelationshipStatus::Ended);
        assert!(ended.invitation_code.is_none());
        assert!(ended.athlete_id.is_none());
        ended.check_invariants().unwrap();
    }

    #[test]
    fn test_expiry_check_is_inclusive() {
        let now = whole_second_now();
        let invitation = Relationship::new_invitation("coach-1", "AB12CD", now);

        assert!(invitation.is_expired(now));
        assert!(invitation.is_expired(now + Duration::seconds(1)));
        assert!(!invitation.is_expired(now - Duration::seconds(1)));
    }

    #[test]
    fn test_serde_round_trip_preserves_fields() {
        let now = whole_second_now();
        let original = Relationship::new_invitation("coach-1", "XY99ZZ", now + Duration::hours(24));
        let json = serde_json::to_string(&original).unwrap();
        let restored: Relationship = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, original);

        let active = Relationship::new_direct("coach-2", "athlete-2", now).into_active();
        let json = serde_json::to_string(&active).unwrap();
        let restored: Relationship = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, active);
    }

    #[test]
    fn test_absent_optionals_are_omitted_from_json() {
        let now = whole_second_now();
        let invitation = Relationship::new_invitation("coach-1", "XY99ZZ", now + Duration::hours(1));
        let json = serde_json::to_string(&invitation).unwrap();
        assert!(!json.contains("athlete_id"));
        assert!(!json.contains("created_at"));
        assert!(json.contains("invitation_code"));
    }
}
