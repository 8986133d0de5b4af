// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request-scoped propagation of verified claims.
//!
//! The auth middleware attaches claims once; handlers read them back with
//! the [`CurrentClaims`] extractor:
//!
//! ```rust,ignore
//! async fn my_handler(CurrentClaims(claims): CurrentClaims) -> impl IntoResponse {
//!     // claims.user_id is the authenticated user
//! }
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, Extensions},
};

use super::{AuthError, Claims};

/// Extension slot holding the claims.
///
/// Private, so no code outside this module can insert or overwrite it.
#[derive(Clone)]
struct ClaimsSlot(Arc<Claims>);

/// Attach verified claims to `request`.
pub fn attach(mut request: Request, claims: Claims) -> Request {
    request
        .extensions_mut()
        .insert(ClaimsSlot(Arc::new(claims)));
    request
}

/// Claims previously attached to this request scope, if any.
pub fn extract(extensions: &Extensions) -> Option<Arc<Claims>> {
    extensions.get::<ClaimsSlot>().map(|slot| Arc::clone(&slot.0))
}

/// Extractor for the claims attached by the auth middleware.
///
/// Rejects with [`AuthError::ClaimsMissing`] when the route is not behind
/// the middleware.
#[derive(Debug, Clone)]
pub struct CurrentClaims(pub Arc<Claims>);

impl<S> FromRequestParts<S> for CurrentClaims
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract(&parts.extensions)
            .map(CurrentClaims)
            .ok_or(AuthError::ClaimsMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    fn sample_claims() -> Claims {
        Claims {
            user_id: "u1".to_string(),
            email: "a@b.com".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
        }
    }

    #[test]
    fn extract_returns_attached_claims() {
        let request = HttpRequest::builder().uri("/").body(Body::empty()).unwrap();
        let request = attach(request, sample_claims());

        let claims = extract(request.extensions()).expect("claims attached");
        assert_eq!(*claims, sample_claims());
    }

    #[test]
    fn extract_reports_absence() {
        let request = HttpRequest::builder().uri("/").body(Body::empty()).unwrap();
        assert!(extract(request.extensions()).is_none());
    }

    #[test]
    fn unrelated_extensions_do_not_collide() {
        let request = HttpRequest::builder().uri("/").body(Body::empty()).unwrap();
        let mut request = attach(request, sample_claims());
        request.extensions_mut().insert(String::from("user"));
        request.extensions_mut().insert(sample_claims());

        let claims = extract(request.extensions()).unwrap();
        assert_eq!(claims.user_id, "u1");
    }

    #[tokio::test]
    async fn extractor_reads_attached_claims() {
        let request = HttpRequest::builder().uri("/").body(Body::empty()).unwrap();
        let (mut parts, _) = attach(request, sample_claims()).into_parts();

        let CurrentClaims(claims) = CurrentClaims::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(claims.email, "a@b.com");
    }

    #[tokio::test]
    async fn extractor_rejects_without_claims() {
        let (mut parts, _) = HttpRequest::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap()
            .into_parts();

        let result = CurrentClaims::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::ClaimsMissing)));
    }
}
