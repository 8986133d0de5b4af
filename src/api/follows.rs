// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Follow endpoints. The follower is always the caller.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::JsonPayload;
use crate::{
    auth::CurrentClaims,
    error::ApiError,
    models::{ApiResponse, FollowEntry, FollowRequest},
    state::AppState,
    storage::{
        FollowRepository, OwnershipCheck, StorageError, StorageResult, StoredFollow,
        UserRepository,
    },
};

/// Resolve the other side of each edge to a listing row. Edges whose user no
/// longer exists are skipped.
fn entries<F>(
    state: &AppState,
    follows: Vec<StoredFollow>,
    other_side: F,
) -> StorageResult<Vec<FollowEntry>>
where
    F: Fn(&StoredFollow) -> &str,
{
    let users = UserRepository::new(&state.db);
    let mut rows = Vec::with_capacity(follows.len());
    for follow in &follows {
        let user_id = other_side(follow);
        match users.get(user_id) {
            Ok(user) => rows.push(FollowEntry {
                follow_id: follow.id.clone(),
                user_id: user.id,
                username: user.username,
            }),
            Err(StorageError::NotFound(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(rows)
}

/// Follow another user.
#[utoipa::path(
    post,
    path = "/api/v1/follows",
    tag = "Follows",
    security(("bearer" = [])),
    request_body = FollowRequest,
    responses(
        (status = 201, description = "Now following", body = ApiResponse<StoredFollow>),
        (status = 400, description = "Cannot follow yourself"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Already following")
    )
)]
pub async fn follow_user(
    CurrentClaims(claims): CurrentClaims,
    State(state): State<AppState>,
    JsonPayload(request): JsonPayload<FollowRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StoredFollow>>), ApiError> {
    let followee_id = request.followee_id.trim();
    if followee_id.is_empty() {
        return Err(ApiError::bad_request("Invalid Payload"));
    }
    if followee_id == claims.user_id {
        return Err(ApiError::bad_request("Cannot follow yourself"));
    }

    UserRepository::new(&state.db)
        .get(followee_id)
        .map_err(|e| match e {
            StorageError::NotFound(_) => ApiError::not_found("User not found"),
            other => other.into(),
        })?;

    let follow = StoredFollow::new(claims.user_id.clone(), followee_id.to_string());
    FollowRepository::new(&state.db)
        .create(&follow)
        .map_err(|e| match e {
            StorageError::AlreadyExists(_) => ApiError::conflict("Already following this user"),
            other => other.into(),
        })?;

    tracing::info!(follower = %follow.follower_id, followee = %follow.followee_id, "Follow created");
    Ok((StatusCode::CREATED, Json(ApiResponse::data(follow))))
}

/// Users following the caller.
#[utoipa::path(
    get,
    path = "/api/v1/follows/followers",
    tag = "Follows",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Followers", body = ApiResponse<Vec<FollowEntry>>)
    )
)]
pub async fn list_followers(
    CurrentClaims(claims): CurrentClaims,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<FollowEntry>>>, ApiError> {
    let follows = FollowRepository::new(&state.db).list_followers(&claims.user_id)?;
    let rows = entries(&state, follows, |f| f.follower_id.as_str())?;
    Ok(Json(ApiResponse::data(rows)))
}

/// Users the caller follows.
#[utoipa::path(
    get,
    path = "/api/v1/follows/following",
    tag = "Follows",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Followed users", body = ApiResponse<Vec<FollowEntry>>)
    )
)]
pub async fn list_following(
    CurrentClaims(claims): CurrentClaims,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<FollowEntry>>>, ApiError> {
    let follows = FollowRepository::new(&state.db).list_following(&claims.user_id)?;
    let rows = entries(&state, follows, |f| f.followee_id.as_str())?;
    Ok(Json(ApiResponse::data(rows)))
}

/// Stop following. Only the follower may remove the edge.
#[utoipa::path(
    delete,
    path = "/api/v1/follows/{id}",
    tag = "Follows",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Follow ID")),
    responses(
        (status = 204, description = "Unfollowed"),
        (status = 403, description = "Not the follower"),
        (status = 404, description = "Follow not found")
    )
)]
pub async fn unfollow(
    CurrentClaims(claims): CurrentClaims,
    Path(follow_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let repo = FollowRepository::new(&state.db);
    repo.get(&follow_id).verify_owner(&claims)?;
    repo.delete(&follow_id)?;
    Ok(StatusCode::NO_CONTENT)
}
