// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Post repository.
//!
//! A post pairs a caption with one uploaded image. The image itself lives in
//! the media store; the record only keeps its file name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{Database, POSTS};
use super::super::{OwnedResource, StorageError, StorageResult};

/// Post as persisted and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredPost {
    /// Unique post identifier (UUIDv7)
    pub id: String,
    pub caption: String,
    /// File name inside the upload directory
    pub media: String,
    /// Author
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredPost {
    pub fn new(user_id: String, caption: String, media: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            caption,
            media,
            user_id,
            created_at: now,
            updated_at: now,
        }
    }
}

impl OwnedResource for StoredPost {
    fn owner_user_id(&self) -> &str {
        &self.user_id
    }

    fn resource_name(&self) -> String {
        format!("post {}", self.id)
    }
}

pub struct PostRepository<'a> {
    db: &'a Database,
}

impl<'a> PostRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn exists(&self, post_id: &str) -> StorageResult<bool> {
        Ok(self.db.get_json::<StoredPost>(POSTS, post_id)?.is_some())
    }

    pub fn get(&self, post_id: &str) -> StorageResult<StoredPost> {
        self.db
            .get_json(POSTS, post_id)?
            .ok_or_else(|| StorageError::NotFound(format!("Post {post_id}")))
    }

    pub fn create(&self, post: &StoredPost) -> StorageResult<()> {
        self.db.insert_unique(POSTS, &post.id, post, |_| false)
    }

    /// Replace caption and media. Returns the updated post.
    pub fn update(&self, post_id: &str, caption: String, media: String) -> StorageResult<StoredPost> {
        let mut post = self.get(post_id)?;
        post.caption = caption;
        post.media = media;
        post.updated_at = Utc::now();
        self.db.replace_json(POSTS, post_id, &post)?;
        Ok(post)
    }

    pub fn delete(&self, post_id: &str) -> StorageResult<()> {
        self.db.remove(POSTS, post_id)
    }

    /// Fetch several posts, skipping IDs that no longer exist.
    pub fn get_many(&self, post_ids: &[String]) -> StorageResult<Vec<StoredPost>> {
        let mut posts = Vec::with_capacity(post_ids.len());
        for id in post_ids {
            if let Some(post) = self.db.get_json::<StoredPost>(POSTS, id)? {
                posts.push(post);
            }
        }
        Ok(posts)
    }

    /// List posts written by a user.
    pub fn list_by_user(&self, user_id: &str) -> StorageResult<Vec<StoredPost>> {
        self.db
            .scan_json(POSTS, |post: &StoredPost| post.user_id == user_id)
    }
}
