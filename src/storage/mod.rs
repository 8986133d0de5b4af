// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state for the social API.
//!
//! ## Layout
//!
//! ```text
//! {DATA_DIR}/
//!   social.redb       # users, posts, follows, likes, favorites
//! {UPLOAD_DIR}/
//!   {ts}_{hash}.png   # uploaded post images
//! ```
//!
//! Entities are stored as JSON in redb tables (see [`database`]); uploaded
//! images are plain files managed by [`MediaStore`].

pub mod database;
pub mod media;
pub mod ownership;
pub mod repository;

pub use database::{Database, StorageError, StorageResult};
pub use media::{MediaError, MediaStore};
pub use ownership::{OwnedResource, OwnershipCheck, OwnershipEnforcer};
pub use repository::{
    FavoriteRepository, FollowRepository, LikeRepository, PostRepository, StoredFavorite,
    StoredFollow, StoredLike, StoredPost, StoredUser, User, UserLookup, UserRepository,
};
