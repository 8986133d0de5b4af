// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::TokenCodec;
use crate::cache::UserSessionCache;
use crate::storage::{Database, MediaStore};

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub tokens: Arc<TokenCodec>,
    pub sessions: UserSessionCache,
    pub media: MediaStore,
}

impl AppState {
    pub fn new(
        db: Arc<Database>,
        tokens: Arc<TokenCodec>,
        sessions: UserSessionCache,
        media: MediaStore,
    ) -> Self {
        Self {
            db,
            tokens,
            sessions,
            media,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use super::*;
    use crate::auth::{Claims, CurrentClaims, Identity, SigningSecret};
    use crate::cache::session::{DEFAULT_CACHE_TIMEOUT, DEFAULT_SESSION_TTL};
    use crate::cache::MemoryCache;
    use crate::storage::{StoredUser, UserRepository};

    pub const TEST_SECRET: &str = "test-secret-0123456789";

    /// State backed by a temporary directory; keep the `TempDir` alive.
    pub async fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("test.redb")).unwrap();
        let media = MediaStore::new(dir.path().join("uploads"));
        media.initialize().await.unwrap();

        let tokens = TokenCodec::new(&SigningSecret::new(TEST_SECRET), Duration::from_secs(3600));
        let sessions = UserSessionCache::new(
            Arc::new(MemoryCache::new(64)),
            DEFAULT_SESSION_TTL,
            DEFAULT_CACHE_TIMEOUT,
        );

        let state = AppState::new(Arc::new(db), Arc::new(tokens), sessions, media);
        (state, dir)
    }

    /// Insert a user with `password` and return it with a bearer token.
    pub fn seed_user(state: &AppState, username: &str, password: &str) -> (StoredUser, String) {
        let user = StoredUser::new(
            username.to_string(),
            format!("{username}@example.com"),
            crate::auth::password::hash(password).unwrap(),
        );
        UserRepository::new(&state.db).create(&user).unwrap();
        let token = state.tokens.issue(&Identity::from(&user)).unwrap();
        (user, token)
    }

    /// Claims as the auth middleware would attach them for `user`.
    pub fn claims_of(user: &StoredUser) -> CurrentClaims {
        let now = chrono::Utc::now().timestamp();
        CurrentClaims(Arc::new(Claims::for_identity(&Identity::from(user), now, 3600)))
    }
}
