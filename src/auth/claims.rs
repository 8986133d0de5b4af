// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token claims and the authenticated identity they carry.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::storage::StoredUser;

/// Claim name for the user identifier.
pub const USER_ID_CLAIM: &str = "userId";
/// Claim name for the user email.
pub const EMAIL_CLAIM: &str = "email";
/// Claim name for the issued-at timestamp.
pub const ISSUED_AT_CLAIM: &str = "iat";
/// Claim name for the expiry timestamp.
pub const EXPIRY_CLAIM: &str = "exp";

/// Minimal authenticated principal.
///
/// Built from a verified user record at login or registration time and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: String,
    email: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl From<&StoredUser> for Identity {
    fn from(user: &StoredUser) -> Self {
        Self::new(user.id.clone(), user.email.clone())
    }
}

/// Claims carried by a session token.
///
/// Invariant: `exp > iat`. Instances produced by [`Claims::try_from`] on a
/// verified [`ClaimSet`] always satisfy it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Canonical user ID
    #[serde(rename = "userId")]
    pub user_id: String,

    /// Email address at issuance time
    pub email: String,

    /// Issued at (UNIX seconds)
    pub iat: i64,

    /// Expiration (UNIX seconds)
    pub exp: i64,
}

impl Claims {
    /// Build claims for `identity` issued at `now`, valid for `ttl_secs`.
    pub fn for_identity(identity: &Identity, now: i64, ttl_secs: i64) -> Self {
        Self {
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
            iat: now,
            exp: now + ttl_secs,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.user_id.clone(), self.email.clone())
    }
}

/// Raw claim map decoded from a token whose signature, algorithm and expiry
/// have been checked, but whose shape has not.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Map<String, Value>);

impl ClaimSet {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.get_str(USER_ID_CLAIM)
    }

    pub fn email(&self) -> Option<&str> {
        self.get_str(EMAIL_CLAIM)
    }

    pub fn issued_at(&self) -> Option<i64> {
        self.get_i64(ISSUED_AT_CLAIM)
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.get_i64(EXPIRY_CLAIM)
    }
}

impl From<Map<String, Value>> for ClaimSet {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// The decoded claims do not describe a user session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimsError {
    #[error("claim `{0}` is missing or has the wrong type")]
    Missing(&'static str),

    #[error("claim `{0}` is empty")]
    Empty(&'static str),

    #[error("expiry {exp} is not after issuance {iat}")]
    ExpiryBeforeIssuance { iat: i64, exp: i64 },
}

impl TryFrom<ClaimSet> for Claims {
    type Error = ClaimsError;

    fn try_from(set: ClaimSet) -> Result<Self, Self::Error> {
        let user_id = required_str(&set, USER_ID_CLAIM)?;
        let email = required_str(&set, EMAIL_CLAIM)?;
        let iat = set
            .issued_at()
            .ok_or(ClaimsError::Missing(ISSUED_AT_CLAIM))?;
        let exp = set
            .expires_at()
            .ok_or(ClaimsError::Missing(EXPIRY_CLAIM))?;

        if exp <= iat {
            return Err(ClaimsError::ExpiryBeforeIssuance { iat, exp });
        }

        Ok(Self {
            user_id,
            email,
            iat,
            exp,
        })
    }
}

fn required_str(set: &ClaimSet, name: &'static str) -> Result<String, ClaimsError> {
    let value = set.get_str(name).ok_or(ClaimsError::Missing(name))?;
    if value.trim().is_empty() {
        return Err(ClaimsError::Empty(name));
    }
    Ok(value.to_string())
}
