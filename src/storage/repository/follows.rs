// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Follow relationships between users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{Database, FOLLOWS};
use super::super::{OwnedResource, StorageError, StorageResult};

/// Directed edge: `follower_id` follows `followee_id`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredFollow {
    pub id: String,
    pub follower_id: String,
    pub followee_id: String,
    pub created_at: DateTime<Utc>,
}

impl StoredFollow {
    pub fn new(follower_id: String, followee_id: String) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            follower_id,
            followee_id,
            created_at: Utc::now(),
        }
    }
}

/// Only the follower may remove the edge.
impl OwnedResource for StoredFollow {
    fn owner_user_id(&self) -> &str {
        &self.follower_id
    }

    fn resource_name(&self) -> String {
        format!("follow {}", self.id)
    }
}

pub struct FollowRepository<'a> {
    db: &'a Database,
}

impl<'a> FollowRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn get(&self, follow_id: &str) -> StorageResult<StoredFollow> {
        self.db
            .get_json(FOLLOWS, follow_id)?
            .ok_or_else(|| StorageError::NotFound(format!("Follow {follow_id}")))
    }

    /// Create a follow. A user can follow another user at most once.
    pub fn create(&self, follow: &StoredFollow) -> StorageResult<()> {
        self.db
            .insert_unique(FOLLOWS, &follow.id, follow, |existing: &StoredFollow| {
                existing.follower_id == follow.follower_id
                    && existing.followee_id == follow.followee_id
            })
    }

    pub fn delete(&self, follow_id: &str) -> StorageResult<()> {
        self.db.remove(FOLLOWS, follow_id)
    }

    /// Edges pointing at `user_id` (who follows them).
    pub fn list_followers(&self, user_id: &str) -> StorageResult<Vec<StoredFollow>> {
        self.db
            .scan_json(FOLLOWS, |f: &StoredFollow| f.followee_id == user_id)
    }

    /// Edges leaving `user_id` (whom they follow).
    pub fn list_following(&self, user_id: &str) -> StorageResult<Vec<StoredFollow>> {
        self.db
            .scan_json(FOLLOWS, |f: &StoredFollow| f.follower_id == user_id)
    }
}
