// ABOUTME: Route handlers for the coach-athlete relationship REST API
// ABOUTME: Provides REST endpoints for invitations, claims, direct creation, and lifecycle transitions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

//! Relationship routes
//!
//! This module exposes the relationship lifecycle over HTTP. Handlers stay
//! thin: they translate bodies and path segments, delegate to
//! [`RelationshipLifecycle`](crate::services::RelationshipLifecycle), and map
//! the returned record or error into a response. All domain rules live in the
//! service layer.

use crate::{
    errors::RelationshipError,
    models::{Relationship, RelationshipStatus},
    server::ServerResources,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Response for a single relationship
#[derive(Debug, Serialize, Deserialize)]
pub struct RelationshipResponse {
    /// Unique identifier
    pub relationship_id: String,
    /// Coaching account
    pub coach_id: String,
    /// Athlete account; absent while the invitation is unclaimed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub athlete_id: Option<String>,
    /// Current lifecycle status
    pub status: String,
    /// When the relationship came into existence; absent for an unclaimed invitation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Claimable code; present only while the invitation is unclaimed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_code: Option<String>,
    /// When the record becomes eligible for background removal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

impl From<Relationship> for RelationshipResponse {
    fn from(relationship: Relationship) -> Self {
        Self {
            relationship_id: relationship.relationship_id,
            coach_id: relationship.coach_id,
            athlete_id: relationship.athlete_id,
            status: relationship.status.as_str().to_owned(),
            created_at: relationship.created_at.map(|dt| dt.to_rfc3339()),
            invitation_code: relationship.invitation_code,
            expires_at: relationship.expires_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Response for listing relationships
#[derive(Debug, Serialize, Deserialize)]
pub struct ListRelationshipsResponse {
    /// Relationships matching the filter
    pub relationships: Vec<RelationshipResponse>,
    /// Total count of relationships returned
    pub total: u32,
    /// Metadata
    pub metadata: RelationshipsMetadata,
}

/// Metadata for relationship list responses
#[derive(Debug, Serialize, Deserialize)]
pub struct RelationshipsMetadata {
    /// Response timestamp
    pub timestamp: String,
    /// API version
    pub api_version: String,
}

/// Query parameters for listing relationships
#[derive(Debug, Deserialize, Default)]
pub struct ListRelationshipsQuery {
    /// Filter by lifecycle status (`pending`, `active`, or `ended`)
    pub status: Option<String>,
}

/// Request body for creating an invitation
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateInvitationBody {
    /// Coach issuing the invitation
    pub coach_id: String,
}

/// Request body for claiming an invitation
#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimInvitationBody {
    /// Code the athlete received from the coach
    pub invitation_code: String,
    /// Athlete claiming the invitation
    pub athlete_id: String,
}

/// Request body for creating a relationship directly, both parties known
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRelationshipBody {
    /// Coaching account
    pub coach_id: String,
    /// Athlete account
    pub athlete_id: String,
}

/// Relationship routes handler
pub struct RelationshipRoutes;

impl RelationshipRoutes {
    /// Create all relationship routes
    ///
    /// The `/api/relationships/invitations/:code` path serves two methods:
    /// GET looks up a pending invitation by its claim code, DELETE cancels
    /// an unclaimed invitation by its relationship id.
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/relationships/invitations",
                post(Self::handle_create_invitation),
            )
            .route(
                "/api/relationships/invitations/:code",
                get(Self::handle_get_invitation).delete(Self::handle_cancel_invitation),
            )
            .route("/api/relationships/claims", post(Self::handle_claim))
            .route("/api/relationships", post(Self::handle_create_direct))
            .route("/api/relationships/:id", get(Self::handle_get))
            .route("/api/relationships/:id/accept", post(Self::handle_accept))
            .route("/api/relationships/:id/end", post(Self::handle_end))
            .route(
                "/api/coaches/:coach_id/relationships",
                get(Self::handle_list_for_coach),
            )
            .route(
                "/api/athletes/:athlete_id/relationships",
                get(Self::handle_list_for_athlete),
            )
            .route(
                "/api/athletes/:athlete_id/coach",
                get(Self::handle_active_coach),
            )
            .with_state(resources)
    }

    /// Build metadata for list responses
    fn build_metadata() -> RelationshipsMetadata {
        RelationshipsMetadata {
            timestamp: Utc::now().to_rfc3339(),
            api_version: "1.0".to_owned(),
        }
    }

    /// Parse an optional `status` query value into a typed filter
    fn parse_status_filter(
        raw: Option<&str>,
    ) -> Result<Option<RelationshipStatus>, RelationshipError> {
        match raw {
            Some(value) => Ok(Some(value.parse()?)),
            None => Ok(None),
        }
    }

    /// Handle POST /api/relationships/invitations - Issue an invitation code
    async fn handle_create_invitation(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<CreateInvitationBody>,
    ) -> Result<Response, RelationshipError> {
        let invitation = resources.lifecycle.create_invitation(&body.coach_id).await?;

        let response: RelationshipResponse = invitation.into();
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle GET /api/relationships/invitations/:code - Look up a pending invitation
    ///
    /// Expired or already claimed invitations are reported as unknown codes.
    async fn handle_get_invitation(
        State(resources): State<Arc<ServerResources>>,
        Path(code): Path<String>,
    ) -> Result<Response, RelationshipError> {
        let invitation = resources
            .lifecycle
            .find_invitation(&code)
            .await?
            .ok_or_else(|| RelationshipError::invalid_code(&code))?;

        let response: RelationshipResponse = invitation.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle DELETE /api/relationships/invitations/:id - Cancel an unclaimed invitation
    async fn handle_cancel_invitation(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, RelationshipError> {
        resources.lifecycle.cancel_invitation(&id).await?;

        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    /// Handle POST /api/relationships/claims - Claim an invitation code
    async fn handle_claim(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<ClaimInvitationBody>,
    ) -> Result<Response, RelationshipError> {
        let relationship = resources
            .lifecycle
            .claim_invitation(&body.invitation_code, &body.athlete_id)
            .await?;

        let response: RelationshipResponse = relationship.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/relationships - Create a relationship with both parties known
    async fn handle_create_direct(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<CreateRelationshipBody>,
    ) -> Result<Response, RelationshipError> {
        let relationship = resources
            .lifecycle
            .create_direct(&body.coach_id, &body.athlete_id)
            .await?;

        // A fresh direct creation is always pending; an already active pair is
        // handed back unchanged instead of duplicated.
        let status_code = if relationship.status == RelationshipStatus::Active {
            StatusCode::OK
        } else {
            StatusCode::CREATED
        };

        let response: RelationshipResponse = relationship.into();
        Ok((status_code, Json(response)).into_response())
    }

    /// Handle GET /api/relationships/:id - Fetch a single relationship
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, RelationshipError> {
        let relationship = resources.lifecycle.get(&id).await?;

        let response: RelationshipResponse = relationship.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/relationships/:id/accept - Athlete accepts a pending relationship
    async fn handle_accept(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, RelationshipError> {
        let relationship = resources.lifecycle.accept(&id).await?;

        let response: RelationshipResponse = relationship.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/relationships/:id/end - End a pending or active relationship
    async fn handle_end(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, RelationshipError> {
        let relationship = resources.lifecycle.end(&id).await?;

        let response: RelationshipResponse = relationship.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/coaches/:coach_id/relationships - List a coach's relationships
    async fn handle_list_for_coach(
        State(resources): State<Arc<ServerResources>>,
        Path(coach_id): Path<String>,
        Query(query): Query<ListRelationshipsQuery>,
    ) -> Result<Response, RelationshipError> {
        let status = Self::parse_status_filter(query.status.as_deref())?;
        let relationships = resources.lifecycle.list_for_coach(&coach_id, status).await?;

        let response = ListRelationshipsResponse {
            total: u32::try_from(relationships.len()).unwrap_or(0),
            relationships: relationships.into_iter().map(Into::into).collect(),
            metadata: Self::build_metadata(),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/athletes/:athlete_id/relationships - List an athlete's relationships
    async fn handle_list_for_athlete(
        State(resources): State<Arc<ServerResources>>,
        Path(athlete_id): Path<String>,
        Query(query): Query<ListRelationshipsQuery>,
    ) -> Result<Response, RelationshipError> {
        let status = Self::parse_status_filter(query.status.as_deref())?;
        let relationships = resources
            .lifecycle
            .list_for_athlete(&athlete_id, status)
            .await?;

        let response = ListRelationshipsResponse {
            total: u32::try_from(relationships.len()).unwrap_or(0),
            relationships: relationships.into_iter().map(Into::into).collect(),
            metadata: Self::build_metadata(),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/athletes/:athlete_id/coach - Current active coaching relationship
    async fn handle_active_coach(
        State(resources): State<Arc<ServerResources>>,
        Path(athlete_id): Path<String>,
    ) -> Result<Response, RelationshipError> {
        let relationship = resources
            .lifecycle
            .active_coach_for_athlete(&athlete_id)
            .await?
            .ok_or_else(|| RelationshipError::not_found(&athlete_id))?;

        let response: RelationshipResponse = relationship.into();
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
