// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Social Server - Social Networking REST Backend
//!
//! Accounts, image posts, follows, likes and favorites behind an
//! HS256-token authenticated HTTP API.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and router (Axum)
//! - `auth` - Session tokens, password hashing and the auth middleware
//! - `cache` - Session cache for the current-user read path
//! - `config` - Environment configuration
//! - `storage` - Embedded database (redb) and uploaded media

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
