// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded entity database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized StoredUser
//! - `user_emails`: lowercase email → user_id
//! - `posts`: post_id → serialized StoredPost
//! - `follows`: follow_id → serialized StoredFollow
//! - `likes`: like_id → serialized StoredLike
//! - `favorites`: favorite_id → serialized StoredFavorite

use std::path::Path;

use redb::{ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde::{de::DeserializeOwned, Serialize};

// =============================================================================
// Table Definitions
// =============================================================================

/// Table keyed by entity ID holding JSON-encoded records.
pub type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Primary table: user_id → serialized StoredUser (JSON bytes).
pub const USERS: JsonTable = TableDefinition::new("users");

/// Index: lowercase email → user_id.
pub const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

/// Primary table: post_id → serialized StoredPost.
pub const POSTS: JsonTable = TableDefinition::new("posts");

/// Primary table: follow_id → serialized StoredFollow.
pub const FOLLOWS: JsonTable = TableDefinition::new("follows");

/// Primary table: like_id → serialized StoredLike.
pub const LIKES: JsonTable = TableDefinition::new("likes");

/// Primary table: favorite_id → serialized StoredFavorite.
pub const FAVORITES: JsonTable = TableDefinition::new("favorites");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("permission denied: user {user_id} cannot modify {resource}")]
    PermissionDenied { user_id: String, resource: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Database
// =============================================================================

/// Embedded ACID entity database.
pub struct Database {
    db: redb::Database,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = redb::Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_EMAILS)?;
            let _ = write_txn.open_table(POSTS)?;
            let _ = write_txn.open_table(FOLLOWS)?;
            let _ = write_txn.open_table(LIKES)?;
            let _ = write_txn.open_table(FAVORITES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Verify the database can serve a read transaction.
    pub fn health_check(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(USERS)?;
        Ok(())
    }

    pub(crate) fn begin_read(&self) -> StorageResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    pub(crate) fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // =========================================================================
    // Generic JSON record operations
    // =========================================================================

    /// Look up a single record by key.
    pub(crate) fn get_json<T: DeserializeOwned>(
        &self,
        table: JsonTable,
        key: &str,
    ) -> StorageResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        match table.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All records in `table` matching `filter`.
    pub(crate) fn scan_json<T, F>(&self, table: JsonTable, filter: F) -> StorageResult<Vec<T>>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;

        let mut records = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let record: T = serde_json::from_slice(value.value())?;
            if filter(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Insert a new record, failing if the key exists or any stored record
    /// `conflicts` with it. Check and insert happen in one write transaction.
    pub(crate) fn insert_unique<T, F>(
        &self,
        table: JsonTable,
        key: &str,
        record: &T,
        conflicts: F,
    ) -> StorageResult<()>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let json = serde_json::to_vec(record)?;
        let table_name = table.to_string();

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(table)?;
            if table.get(key)?.is_some() {
                return Err(StorageError::AlreadyExists(format!("{table_name} {key}")));
            }

            for entry in table.iter()? {
                let (_, value) = entry?;
                let existing: T = serde_json::from_slice(value.value())?;
                if conflicts(&existing) {
                    return Err(StorageError::AlreadyExists(table_name));
                }
            }

            table.insert(key, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Overwrite an existing record.
    pub(crate) fn replace_json<T: Serialize>(
        &self,
        table: JsonTable,
        key: &str,
        record: &T,
    ) -> StorageResult<()> {
        let json = serde_json::to_vec(record)?;
        let table_name = table.to_string();

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(table)?;
            if table.get(key)?.is_none() {
                return Err(StorageError::NotFound(format!("{table_name} {key}")));
            }
            table.insert(key, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Remove a record by key.
    pub(crate) fn remove(&self, table: JsonTable, key: &str) -> StorageResult<()> {
        let table_name = table.to_string();

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(table)?;
            if table.remove(key)?.is_none() {
                return Err(StorageError::NotFound(format!("{table_name} {key}")));
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
