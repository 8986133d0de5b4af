// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Likes on posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{Database, LIKES};
use super::super::{OwnedResource, StorageError, StorageResult};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredLike {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl StoredLike {
    pub fn new(post_id: String, user_id: String) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            post_id,
            user_id,
            created_at: Utc::now(),
        }
    }
}

impl OwnedResource for StoredLike {
    fn owner_user_id(&self) -> &str {
        &self.user_id
    }

    fn resource_name(&self) -> String {
        format!("like {}", self.id)
    }
}

pub struct LikeRepository<'a> {
    db: &'a Database,
}

impl<'a> LikeRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn get(&self, like_id: &str) -> StorageResult<StoredLike> {
        self.db
            .get_json(LIKES, like_id)?
            .ok_or_else(|| StorageError::NotFound(format!("Like {like_id}")))
    }

    /// Create a like. A user likes a given post at most once.
    pub fn create(&self, like: &StoredLike) -> StorageResult<()> {
        self.db
            .insert_unique(LIKES, &like.id, like, |existing: &StoredLike| {
                existing.post_id == like.post_id && existing.user_id == like.user_id
            })
    }

    pub fn delete(&self, like_id: &str) -> StorageResult<()> {
        self.db.remove(LIKES, like_id)
    }

    pub fn list_by_post(&self, post_id: &str) -> StorageResult<Vec<StoredLike>> {
        self.db
            .scan_json(LIKES, |like: &StoredLike| like.post_id == post_id)
    }
}
