// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.
//!
//! Users are keyed by ID in the `users` table. A second table maps the
//! lowercased email to the user ID so that login lookups and the
//! one-account-per-email rule stay O(1).

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{Database, USERS, USER_EMAILS};
use super::super::{StorageError, StorageResult};

/// User record as persisted, including the password digest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    /// Unique user identifier (UUIDv7)
    pub id: String,
    pub username: String,
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredUser {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            username,
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Public view of a user. This is also the form held by the session cache.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredUser> for User {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Read access to users, as needed by login and the session cache.
pub trait UserLookup: Send + Sync {
    fn user_by_id(&self, user_id: &str) -> StorageResult<StoredUser>;
    fn user_by_email(&self, email: &str) -> StorageResult<StoredUser>;
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Get a user by ID.
    pub fn get(&self, user_id: &str) -> StorageResult<StoredUser> {
        self.db
            .get_json(USERS, user_id)?
            .ok_or_else(|| StorageError::NotFound(format!("User {user_id}")))
    }

    /// Get a user by email (case-insensitive).
    pub fn get_by_email(&self, email: &str) -> StorageResult<StoredUser> {
        let key = email_key(email);
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USER_EMAILS)?;
        let user_id = match index.get(key.as_str())? {
            Some(id) => id.value().to_string(),
            None => return Err(StorageError::NotFound(format!("User with email {key}"))),
        };
        self.get(&user_id)
    }

    /// Create a new user. Fails if the ID or the email is already taken.
    pub fn create(&self, user: &StoredUser) -> StorageResult<()> {
        let key = email_key(&user.email);
        let json = serde_json::to_vec(user)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut index = write_txn.open_table(USER_EMAILS)?;
            if index.get(key.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!("User with email {key}")));
            }

            let mut users = write_txn.open_table(USERS)?;
            if users.get(user.id.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!("User {}", user.id)));
            }

            users.insert(user.id.as_str(), json.as_slice())?;
            index.insert(key.as_str(), user.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Change username and email. Returns the updated record.
    pub fn update_profile(
        &self,
        user_id: &str,
        username: String,
        email: String,
    ) -> StorageResult<StoredUser> {
        let mut user = self.get(user_id)?;
        let old_key = email_key(&user.email);
        let new_key = email_key(&email);

        user.username = username;
        user.email = email;
        user.updated_at = Utc::now();
        let json = serde_json::to_vec(&user)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut index = write_txn.open_table(USER_EMAILS)?;
            if new_key != old_key {
                let taken = index.get(new_key.as_str())?.is_some();
                if taken {
                    return Err(StorageError::AlreadyExists(format!(
                        "User with email {new_key}"
                    )));
                }
                index.remove(old_key.as_str())?;
                index.insert(new_key.as_str(), user_id)?;
            }

            let mut users = write_txn.open_table(USERS)?;
            users.insert(user_id, json.as_slice())?;
        }
        write_txn.commit()?;

        Ok(user)
    }

    /// Delete a user and its email index entry.
    pub fn delete(&self, user_id: &str) -> StorageResult<()> {
        let user = self.get(user_id)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            users.remove(user_id)?;
            let mut index = write_txn.open_table(USER_EMAILS)?;
            index.remove(email_key(&user.email).as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

impl UserLookup for UserRepository<'_> {
    fn user_by_id(&self, user_id: &str) -> StorageResult<StoredUser> {
        self.get(user_id)
    }

    fn user_by_email(&self, email: &str) -> StorageResult<StoredUser> {
        self.get_by_email(email)
    }
}
