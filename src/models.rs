// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies used by the REST API. All types derive
//! `ToSchema` for the OpenAPI document.
//!
//! ## Envelope
//!
//! Successful responses are wrapped in [`ApiResponse`]:
//!
//! ```json
//! { "status": "success", "message": "success to login", "data": { ... } }
//! ```
//!
//! Errors use `{"message": "..."}` (see [`crate::error::ApiError`]).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const STATUS_SUCCESS: &str = "success";

const MAX_EMAIL_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 30;

// =============================================================================
// Envelope
// =============================================================================

/// Success envelope.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Always `"success"`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Envelope without a payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            message: Some(message.into()),
            data: None,
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

fn valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn valid_password(password: &str) -> bool {
    (MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&password.chars().count())
}

// =============================================================================
// Users
// =============================================================================

/// Registration payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    /// 8 to 30 characters.
    pub password: String,
}

impl RegisterRequest {
    pub fn is_valid(&self) -> bool {
        !self.username.trim().is_empty() && valid_email(&self.email) && valid_password(&self.password)
    }
}

/// Login payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn is_valid(&self) -> bool {
        valid_email(&self.email) && valid_password(&self.password)
    }
}

/// Issued session token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
}

/// Profile update payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: String,
    pub email: String,
}

impl UpdateUserRequest {
    pub fn is_valid(&self) -> bool {
        !self.username.trim().is_empty() && valid_email(&self.email)
    }
}

// =============================================================================
// Posts
// =============================================================================

/// Multipart form accepted by post create/update (documentation only).
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct PostUploadForm {
    pub caption: String,
    /// `.jpg`, `.jpeg` or `.png`, at most 10 MiB.
    #[schema(value_type = String, format = Binary)]
    pub media: Vec<u8>,
}

// =============================================================================
// Follows
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FollowRequest {
    /// User to follow.
    pub followee_id: String,
}

/// One row of a followers/following listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct FollowEntry {
    pub follow_id: String,
    /// The other side of the relationship.
    pub user_id: String,
    pub username: String,
}

// =============================================================================
// Likes
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct LikeUser {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostLikes {
    pub likes_count: usize,
    pub users: Vec<LikeUser>,
}
