// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for mutating storage operations.
//!
//! Posts, follows, likes and favorites may only be changed by the user who
//! created them. Handlers load the record and pass it through
//! [`OwnershipCheck::verify_owner`] with the caller's claims.

use crate::auth::Claims;

use super::{StorageError, StorageResult};

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's user ID.
    fn owner_user_id(&self) -> &str;

    /// Short description used in permission errors.
    fn resource_name(&self) -> String;
}

/// Trait for enforcing ownership on storage operations.
pub trait OwnershipEnforcer {
    /// Verify that the caller owns this resource.
    ///
    /// # Errors
    /// Returns `StorageError::PermissionDenied` if the caller doesn't own the resource.
    fn verify_ownership(&self, claims: &Claims) -> StorageResult<()>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_ownership(&self, claims: &Claims) -> StorageResult<()> {
        if self.owner_user_id() == claims.user_id {
            Ok(())
        } else {
            Err(StorageError::PermissionDenied {
                user_id: claims.user_id.clone(),
                resource: self.resource_name(),
            })
        }
    }
}

/// Extension trait to chain ownership verification onto a lookup.
pub trait OwnershipCheck<T> {
    /// Verify ownership and return the resource if authorized.
    fn verify_owner(self, claims: &Claims) -> StorageResult<T>;
}

impl<T: OwnedResource> OwnershipCheck<T> for StorageResult<T> {
    fn verify_owner(self, claims: &Claims) -> StorageResult<T> {
        let resource = self?;
        resource.verify_ownership(claims)?;
        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestResource {
        owner: String,
    }

    impl OwnedResource for TestResource {
        fn owner_user_id(&self) -> &str {
            &self.owner
        }

        fn resource_name(&self) -> String {
            "test resource".to_string()
        }
    }

    fn claims_for(user_id: &str) -> Claims {
        Claims {
            user_id: user_id.to_string(),
            email: format!("{user_id}@example.com"),
            iat: 0,
            exp: 3600,
        }
    }

    fn resource(owner: &str) -> TestResource {
        TestResource {
            owner: owner.to_string(),
        }
    }

    #[test]
    fn ownership_verification_passes_for_owner() {
        assert!(resource("user_123")
            .verify_ownership(&claims_for("user_123"))
            .is_ok());
    }

    #[test]
    fn ownership_verification_fails_for_non_owner() {
        let result = resource("user_123").verify_ownership(&claims_for("user_456"));
        match result {
            Err(StorageError::PermissionDenied { user_id, resource }) => {
                assert_eq!(user_id, "user_456");
                assert_eq!(resource, "test resource");
            }
            other => panic!("expected PermissionDenied, got {other:?}"),
        }
    }

    #[test]
    fn ownership_check_on_result() {
        let found: StorageResult<TestResource> = Ok(resource("user_123"));
        assert!(found.verify_owner(&claims_for("user_123")).is_ok());

        let missing: StorageResult<TestResource> =
            Err(StorageError::NotFound("Post x".to_string()));
        assert!(matches!(
            missing.verify_owner(&claims_for("user_123")),
            Err(StorageError::NotFound(_))
        ));
    }
}
