// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Installed on every protected route group:
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/users/logged", get(users::get_current_user))
//!     .route_layer(axum::middleware::from_fn_with_state(
//!         state.tokens.clone(),
//!         require_auth,
//!     ));
//! ```
//!
//! ## Gate
//!
//! 1. `Authorization` must be present and use the `Bearer` scheme
//!    ([`AuthError::NoTokenProvided`])
//! 2. The token after the scheme must be non-empty ([`AuthError::TokenMalformed`])
//! 3. The codec must accept it ([`AuthError::TokenExpiredOrInvalid`])
//! 4. The claims must describe a session ([`AuthError::ClaimsMissing`])
//! 5. Claims are attached to the request and the next handler runs
//!
//! Any rejection ends the request with a 401; nothing is retried.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{context, AuthError, Claims, TokenCodec};

/// Authorization scheme marker.
const BEARER_SCHEME: &str = "Bearer";

/// Authentication middleware function.
pub async fn require_auth(
    State(codec): State<Arc<TokenCodec>>,
    request: Request,
    next: Next,
) -> Response {
    match authorize(request.headers(), &codec) {
        Ok(claims) => next.run(context::attach(request, claims)).await,
        Err(e) => {
            tracing::debug!(code = e.error_code(), "Request rejected by auth gate");
            e.into_response()
        }
    }
}

/// Run the gate over `headers` and return the verified claims.
pub fn authorize(headers: &HeaderMap, codec: &TokenCodec) -> Result<Claims, AuthError> {
    let token = bearer_token(headers)?;

    let claim_set = codec.verify(token).map_err(|e| {
        tracing::debug!(error = %e, expired = e.is_expiry(), "bearer token rejected");
        AuthError::TokenExpiredOrInvalid
    })?;

    Claims::try_from(claim_set).map_err(|e| {
        tracing::debug!(error = %e, "bearer token lacks session claims");
        AuthError::ClaimsMissing
    })
}

/// Pull the token out of `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::NoTokenProvided)?
        .to_str()
        .map_err(|_| AuthError::TokenMalformed)?;

    let rest = header
        .trim_start()
        .strip_prefix(BEARER_SCHEME)
        .ok_or(AuthError::NoTokenProvided)?;

    // "Bearerabc" is not the Bearer scheme followed by a token.
    if !rest.is_empty() && !rest.starts_with(' ') {
        return Err(AuthError::TokenMalformed);
    }

    let token = rest.trim();
    if token.is_empty() {
        return Err(AuthError::TokenMalformed);
    }

    Ok(token)
}
