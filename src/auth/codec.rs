// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token issuance and verification.
//!
//! ## Security
//!
//! - A single symmetric secret, injected at startup
//! - HS256 only, enforced on verify as well as on issuance
//! - `exp` is required and judged against the codec's clock with no leeway
//! - No server-side token storage and no revocation list

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;

use super::claims::{ClaimSet, Claims, Identity, EXPIRY_CLAIM};

/// The only algorithm tokens are signed and accepted with.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Default token lifetime (5 hours).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(5 * 60 * 60);

/// Longest lifetime a token may be issued with (30 days).
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Symmetric signing secret.
///
/// Constructed once from configuration and handed to the codec; it is never
/// printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret(<{} bytes>)", self.0.len())
    }
}

/// Source of the current UNIX time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Token issuance or verification failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("unexpected signing algorithm {0:?}")]
    UnexpectedAlgorithm(Algorithm),

    #[error("token carries no expiry")]
    MissingExpiry,

    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("token lifetime {0:?} is not between one second and 30 days")]
    InvalidLifetime(Duration),
}

impl TokenError {
    /// Whether the failure is about the token lifetime rather than its integrity.
    pub fn is_expiry(&self) -> bool {
        matches!(self, TokenError::Expired | TokenError::MissingExpiry)
    }
}

/// Builds, signs and verifies bearer session tokens.
///
/// Holds only immutable state, so one instance is shared behind an `Arc`
/// by every request.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Create a codec for `secret` issuing tokens valid for `ttl`.
    pub fn new(secret: &SigningSecret, ttl: Duration) -> Self {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        // Expiry is checked against `clock` in `verify`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from([EXPIRY_CLAIM.to_string()]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for `iat`/`exp` and expiry checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The fixed lifetime used by [`TokenCodec::issue`].
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `identity` with the configured lifetime.
    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        self.generate(identity, self.ttl)
    }

    /// Issue a token for `identity` valid for `ttl` from now.
    ///
    /// `ttl` is counted in whole seconds and must be between one second and
    /// [`MAX_TOKEN_TTL`], so every issued token has `exp > iat`.
    pub fn generate(&self, identity: &Identity, ttl: Duration) -> Result<String, TokenError> {
        if ttl > MAX_TOKEN_TTL {
            return Err(TokenError::InvalidLifetime(ttl));
        }
        let ttl_secs = i64::try_from(ttl.as_secs())
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(TokenError::InvalidLifetime(ttl))?;

        let now = self.clock.now();
        if now.checked_add(ttl_secs).is_none() {
            return Err(TokenError::InvalidLifetime(ttl));
        }

        let claims = Claims::for_identity(identity, now, ttl_secs);
        self.sign(&claims)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(TOKEN_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify `token` and return its claims.
    ///
    /// The header algorithm must be HS256. Expiry is judged before the
    /// signature, so a stale token is reported as expired even when it was
    /// signed with a foreign key.
    pub fn verify(&self, token: &str) -> Result<ClaimSet, TokenError> {
        let header = decode_header(token).map_err(|_| TokenError::Malformed)?;
        if header.alg != TOKEN_ALGORITHM {
            return Err(TokenError::UnexpectedAlgorithm(header.alg));
        }

        let unverified = jsonwebtoken::dangerous::insecure_decode::<ClaimSet>(token)
            .map_err(|_| TokenError::Malformed)?;
        let exp = unverified
            .claims
            .expires_at()
            .ok_or(TokenError::MissingExpiry)?;
        if exp <= self.clock.now() {
            return Err(TokenError::Expired);
        }

        let token_data = decode::<ClaimSet>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::InvalidAlgorithm => TokenError::UnexpectedAlgorithm(header.alg),
                ErrorKind::MissingRequiredClaim(_) => TokenError::MissingExpiry,
                _ => TokenError::Malformed,
            })?;

        Ok(token_data.claims)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &TOKEN_ALGORITHM)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Settable clock for expiry tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ManualClock(std::sync::atomic::AtomicI64);

#[cfg(test)]
impl ManualClock {
    pub fn at(now: i64) -> Arc<Self> {
        Arc::new(Self(std::sync::atomic::AtomicI64::new(now)))
    }

    pub fn advance(&self, by: Duration) {
        self.0
            .fetch_add(by.as_secs() as i64, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}
