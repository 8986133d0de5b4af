// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Terminal rejection produced by the auth gate.
///
/// Every variant maps to `401 Unauthorized`; the message names the kind of
/// failure without exposing verification details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization header, or no `Bearer` scheme in it
    NoTokenProvided,
    /// Bearer scheme present but the token part is empty or unreadable
    TokenMalformed,
    /// Signature, algorithm or expiry check failed
    TokenExpiredOrInvalid,
    /// Token verified but does not carry the session claims
    ClaimsMissing,
}

#[derive(Serialize)]
struct AuthErrorBody {
    message: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::NoTokenProvided => "no_token_provided",
            AuthError::TokenMalformed => "token_malformed",
            AuthError::TokenExpiredOrInvalid => "token_expired_or_invalid",
            AuthError::ClaimsMissing => "claims_missing",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::NoTokenProvided => write!(f, "No token provided"),
            AuthError::TokenMalformed => write!(f, "Token Malformed"),
            AuthError::TokenExpiredOrInvalid => write!(f, "Token expires, please login again"),
            AuthError::ClaimsMissing => write!(f, "Token does not contain user info"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}
