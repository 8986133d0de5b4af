// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Favorite endpoints: save posts and list the caller's saved posts.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::CurrentClaims,
    error::ApiError,
    models::ApiResponse,
    state::AppState,
    storage::{
        FavoriteRepository, OwnershipCheck, PostRepository, StorageError, StoredFavorite,
        StoredPost,
    },
};

/// Save a post to the caller's favorites.
#[utoipa::path(
    post,
    path = "/api/v1/favorites/{post_id}",
    tag = "Favorites",
    security(("bearer" = [])),
    params(("post_id" = String, Path, description = "Post ID")),
    responses(
        (status = 201, description = "Post saved", body = ApiResponse<StoredFavorite>),
        (status = 404, description = "Post not found"),
        (status = 409, description = "Already saved")
    )
)]
pub async fn add_favorite(
    CurrentClaims(claims): CurrentClaims,
    Path(post_id): Path<String>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<StoredFavorite>>), ApiError> {
    if !PostRepository::new(&state.db).exists(&post_id)? {
        return Err(ApiError::not_found("Post not found"));
    }

    let favorite = StoredFavorite::new(post_id, claims.user_id.clone());
    FavoriteRepository::new(&state.db)
        .create(&favorite)
        .map_err(|e| match e {
            StorageError::AlreadyExists(_) => ApiError::conflict("Post already in favorites"),
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(ApiResponse::data(favorite))))
}

/// Posts the caller saved, oldest favorite first.
#[utoipa::path(
    get,
    path = "/api/v1/favorites",
    tag = "Favorites",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Saved posts", body = ApiResponse<Vec<StoredPost>>)
    )
)]
pub async fn list_favorites(
    CurrentClaims(claims): CurrentClaims,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<StoredPost>>>, ApiError> {
    let post_ids: Vec<String> = FavoriteRepository::new(&state.db)
        .list_by_user(&claims.user_id)?
        .into_iter()
        .map(|f| f.post_id)
        .collect();
    let posts = PostRepository::new(&state.db).get_many(&post_ids)?;
    Ok(Json(ApiResponse::data(posts)))
}

/// Remove a favorite.
#[utoipa::path(
    delete,
    path = "/api/v1/favorites/{id}",
    tag = "Favorites",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Favorite ID")),
    responses(
        (status = 204, description = "Favorite removed"),
        (status = 403, description = "Not the caller's favorite"),
        (status = 404, description = "Favorite not found")
    )
)]
pub async fn remove_favorite(
    CurrentClaims(claims): CurrentClaims,
    Path(favorite_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let repo = FavoriteRepository::new(&state.db);
    repo.get(&favorite_id).verify_owner(&claims)?;
    repo.delete(&favorite_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{claims_of, seed_user, test_state};

    fn seed_post(state: &AppState, owner_id: &str, caption: &str) -> StoredPost {
        let post = StoredPost::new(owner_id.to_string(), caption.into(), "1_x.png".into());
        PostRepository::new(&state.db).create(&post).unwrap();
        post
    }

    #[tokio::test]
    async fn favorites_list_returns_posts() {
        let (state, _dir) = test_state().await;
        let (alice, _) = seed_user(&state, "alice", "password123");
        let (bob, _) = seed_user(&state, "bob", "password123");
        let first = seed_post(&state, &bob.id, "first");
        let second = seed_post(&state, &bob.id, "second");

        for post in [&first, &second] {
            add_favorite(claims_of(&alice), Path(post.id.clone()), State(state.clone()))
                .await
                .unwrap();
        }

        let Json(response) = list_favorites(claims_of(&alice), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(response.data.unwrap(), vec![first, second]);

        let Json(empty) = list_favorites(claims_of(&bob), State(state))
            .await
            .unwrap();
        assert!(empty.data.unwrap().is_empty());
    }

    #[tokio::test]
    async fn favorite_rules() {
        let (state, _dir) = test_state().await;
        let (alice, _) = seed_user(&state, "alice", "password123");
        let (bob, _) = seed_user(&state, "bob", "password123");
        let post = seed_post(&state, &bob.id, "p");

        let err = add_favorite(claims_of(&alice), Path("missing".into()), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let (_, Json(created)) =
            add_favorite(claims_of(&alice), Path(post.id.clone()), State(state.clone()))
                .await
                .unwrap();
        let err = add_favorite(claims_of(&alice), Path(post.id.clone()), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let favorite_id = created.data.unwrap().id;
        let err = remove_favorite(claims_of(&bob), Path(favorite_id.clone()), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let status = remove_favorite(claims_of(&alice), Path(favorite_id), State(state))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
