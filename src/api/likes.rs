// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Like endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::CurrentClaims,
    error::ApiError,
    models::{ApiResponse, LikeUser, PostLikes},
    state::AppState,
    storage::{
        LikeRepository, OwnershipCheck, PostRepository, StorageError, StoredLike, UserRepository,
    },
};

fn ensure_post_exists(state: &AppState, post_id: &str) -> Result<(), ApiError> {
    if PostRepository::new(&state.db).exists(post_id)? {
        Ok(())
    } else {
        Err(ApiError::not_found("Post not found"))
    }
}

/// Like a post.
#[utoipa::path(
    post,
    path = "/api/v1/likes/{post_id}",
    tag = "Likes",
    security(("bearer" = [])),
    params(("post_id" = String, Path, description = "Post ID")),
    responses(
        (status = 201, description = "Post liked", body = ApiResponse<StoredLike>),
        (status = 404, description = "Post not found"),
        (status = 409, description = "Already liked")
    )
)]
pub async fn like_post(
    CurrentClaims(claims): CurrentClaims,
    Path(post_id): Path<String>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<StoredLike>>), ApiError> {
    ensure_post_exists(&state, &post_id)?;

    let like = StoredLike::new(post_id, claims.user_id.clone());
    LikeRepository::new(&state.db)
        .create(&like)
        .map_err(|e| match e {
            StorageError::AlreadyExists(_) => ApiError::conflict("Post already liked"),
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(ApiResponse::data(like))))
}

/// Like count and likers of a post.
#[utoipa::path(
    get,
    path = "/api/v1/likes/{post_id}",
    tag = "Likes",
    security(("bearer" = [])),
    params(("post_id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Likes on the post", body = ApiResponse<PostLikes>),
        (status = 404, description = "Post not found")
    )
)]
pub async fn get_post_likes(
    Path(post_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PostLikes>>, ApiError> {
    ensure_post_exists(&state, &post_id)?;

    let likes = LikeRepository::new(&state.db).list_by_post(&post_id)?;
    let users = UserRepository::new(&state.db);

    let mut likers = Vec::with_capacity(likes.len());
    for like in &likes {
        match users.get(&like.user_id) {
            Ok(user) => likers.push(LikeUser {
                id: user.id,
                username: user.username,
            }),
            Err(StorageError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Json(ApiResponse::data(PostLikes {
        likes_count: likers.len(),
        users: likers,
    })))
}

/// Remove the caller's like.
#[utoipa::path(
    delete,
    path = "/api/v1/likes/{like_id}",
    tag = "Likes",
    security(("bearer" = [])),
    params(("like_id" = String, Path, description = "Like ID")),
    responses(
        (status = 204, description = "Like removed"),
        (status = 403, description = "Not the caller's like"),
        (status = 404, description = "Like not found")
    )
)]
pub async fn unlike(
    CurrentClaims(claims): CurrentClaims,
    Path(like_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let repo = LikeRepository::new(&state.db);
    repo.get(&like_id).verify_owner(&claims)?;
    repo.delete(&like_id)?;
    Ok(StatusCode::NO_CONTENT)
}
