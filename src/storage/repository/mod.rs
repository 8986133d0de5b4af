// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the entity database.
//!
//! Each repository borrows the [`Database`](super::Database) and provides
//! CRUD operations for one entity type.

pub mod favorites;
pub mod follows;
pub mod likes;
pub mod posts;
pub mod users;

pub use favorites::{FavoriteRepository, StoredFavorite};
pub use follows::{FollowRepository, StoredFollow};
pub use likes::{LikeRepository, StoredLike};
pub use posts::{PostRepository, StoredPost};
pub use users::{StoredUser, User, UserLookup, UserRepository};
