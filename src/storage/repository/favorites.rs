// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Favorite (saved) posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{Database, FAVORITES};
use super::super::{OwnedResource, StorageError, StorageResult};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredFavorite {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl StoredFavorite {
    pub fn new(post_id: String, user_id: String) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            post_id,
            user_id,
            created_at: Utc::now(),
        }
    }
}

impl OwnedResource for StoredFavorite {
    fn owner_user_id(&self) -> &str {
        &self.user_id
    }

    fn resource_name(&self) -> String {
        format!("favorite {}", self.id)
    }
}

pub struct FavoriteRepository<'a> {
    db: &'a Database,
}

impl<'a> FavoriteRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn get(&self, favorite_id: &str) -> StorageResult<StoredFavorite> {
        self.db
            .get_json(FAVORITES, favorite_id)?
            .ok_or_else(|| StorageError::NotFound(format!("Favorite {favorite_id}")))
    }

    /// Save a post for a user. Saving the same post twice is rejected.
    pub fn create(&self, favorite: &StoredFavorite) -> StorageResult<()> {
        self.db.insert_unique(
            FAVORITES,
            &favorite.id,
            favorite,
            |existing: &StoredFavorite| {
                existing.post_id == favorite.post_id && existing.user_id == favorite.user_id
            },
        )
    }

    pub fn delete(&self, favorite_id: &str) -> StorageResult<()> {
        self.db.remove(FAVORITES, favorite_id)
    }

    /// A user's favorites, oldest first.
    pub fn list_by_user(&self, user_id: &str) -> StorageResult<Vec<StoredFavorite>> {
        let mut favorites = self
            .db
            .scan_json(FAVORITES, |f: &StoredFavorite| f.user_id == user_id)?;
        favorites.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(favorites)
    }
}
