// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Session tokens and request authorization for the social API.
//!
//! ## Auth Flow
//!
//! 1. Client logs in with email + password (`POST /api/v1/login`)
//! 2. Server verifies the Argon2 digest and issues an HS256 token
//! 3. Client sends `Authorization: Bearer <token>` on protected routes
//! 4. The auth middleware:
//!    - Verifies algorithm, expiry and signature
//!    - Checks the `userId`/`email` claims
//!    - Attaches the claims to the request extensions
//! 5. Handlers read the claims with [`CurrentClaims`]
//!
//! ## Security
//!
//! - One signing secret per process, injected at startup
//! - Only HS256 is accepted
//! - No clock skew leeway on expiry
//! - Tokens are not stored server-side and cannot be revoked

pub mod claims;
pub mod codec;
pub mod context;
pub mod error;
pub mod middleware;
pub mod password;

pub use claims::{ClaimSet, Claims, ClaimsError, Identity};
pub use codec::{Clock, SigningSecret, SystemClock, TokenCodec, TokenError};
pub use context::CurrentClaims;
pub use error::AuthError;
pub use middleware::require_auth;
