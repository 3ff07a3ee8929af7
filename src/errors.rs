// ABOUTME: Failure taxonomy for relationship lifecycle operations
// ABOUTME: Typed domain errors, store errors, and their HTTP response mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLink Barbell Systems

//! # Error Handling
//!
//! Every lifecycle operation returns a typed [`RelationshipError`] so callers
//! can branch on the failure kind without string matching. Store-level
//! failures propagate unchanged as [`RelationshipError::StoreUnavailable`];
//! the lifecycle performs no retries itself.

use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::RelationshipStatus;

/// Failures raised by the storage backends
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Could not reach or open the backing store
    #[error("store connection failed: {message}")]
    Connection {
        /// Human-readable connection failure detail
        message: String,
    },

    /// A query or write against the store failed
    #[error("store query failed: {message}")]
    Query {
        /// Human-readable query failure detail
        message: String,
    },

    /// A stored record could not be decoded back into a relationship
    #[error("stored record is malformed: {message}")]
    Corrupt {
        /// What part of the record failed to decode
        message: String,
    },
}

impl StoreError {
    /// Connection-level failure
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Query-level failure
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Malformed stored record
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::connection(error.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::corrupt(error.to_string())
            }
            other => Self::query(other.to_string()),
        }
    }
}

/// Typed failure reasons for relationship lifecycle operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RelationshipError {
    /// The invitation code does not resolve to any invitation
    #[error("invitation code '{code}' is not recognized")]
    InvalidCode {
        /// The code the caller presented
        code: String,
    },

    /// The code resolved but its expiry timestamp is in the past
    #[error("invitation code '{code}' expired at {expired_at}")]
    ExpiredCode {
        /// The code the caller presented
        code: String,
        /// When the invitation expired
        expired_at: DateTime<Utc>,
    },

    /// The athlete already holds an active relationship with some coach
    #[error("athlete '{athlete_id}' already has an active coach")]
    AlreadyCoached {
        /// The athlete that attempted the claim or creation
        athlete_id: String,
    },

    /// The referenced relationship does not exist
    #[error("relationship '{relationship_id}' was not found")]
    NotFound {
        /// The identifier the caller presented
        relationship_id: String,
    },

    /// The record exists but its current status disallows the transition
    #[error("relationship '{relationship_id}' is {status} and the requested transition does not apply")]
    NotApplicable {
        /// The identifier the caller presented
        relationship_id: String,
        /// The status observed when the transition was rejected
        status: RelationshipStatus,
    },

    /// Request shape validation failed at the routing boundary
    #[error("invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the request
        message: String,
    },

    /// The backing store could not serve the operation
    #[error("relationship store unavailable")]
    StoreUnavailable {
        /// The underlying store failure
        #[from]
        source: StoreError,
    },
}

impl RelationshipError {
    /// Unknown invitation code
    pub fn invalid_code(code: impl Into<String>) -> Self {
        Self::InvalidCode { code: code.into() }
    }

    /// Expired invitation code
    pub fn expired_code(code: impl Into<String>, expired_at: DateTime<Utc>) -> Self {
        Self::ExpiredCode {
            code: code.into(),
            expired_at,
        }
    }

    /// Athlete already has an active coach
    pub fn already_coached(athlete_id: impl Into<String>) -> Self {
        Self::AlreadyCoached {
            athlete_id: athlete_id.into(),
        }
    }

    /// Relationship id does not resolve
    pub fn not_found(relationship_id: impl Into<String>) -> Self {
        Self::NotFound {
            relationship_id: relationship_id.into(),
        }
    }

    /// Transition rejected by current status
    pub fn not_applicable(relationship_id: impl Into<String>, status: RelationshipStatus) -> Self {
        Self::NotApplicable {
            relationship_id: relationship_id.into(),
            status,
        }
    }

    /// Request shape validation failure
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for API responses
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCode { .. } => "INVALID_CODE",
            Self::ExpiredCode { .. } => "EXPIRED_CODE",
            Self::AlreadyCoached { .. } => "ALREADY_COACHED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::NotApplicable { .. } => "NOT_APPLICABLE",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
        }
    }

    /// HTTP status code for this failure
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidCode { .. } | Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::ExpiredCode { .. } => StatusCode::GONE,
            Self::AlreadyCoached { .. } | Self::NotApplicable { .. } => StatusCode::CONFLICT,
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Result type alias for lifecycle operations
pub type RelationshipResult<T> = Result<T, RelationshipError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error payload
    pub error: ErrorResponseDetails,
}

/// Body of an HTTP error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Stable machine-readable error code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl From<&RelationshipError> for ErrorResponse {
    fn from(error: &RelationshipError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.error_code().to_owned(),
                message: error.to_string(),
            },
        }
    }
}

impl IntoResponse for RelationshipError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.error_code(), error = %self, "request rejected");
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
