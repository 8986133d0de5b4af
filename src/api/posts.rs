// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Post endpoints.
//!
//! Create and update take `multipart/form-data` with a `caption` text field
//! and a `media` image file. The image is written to the media store before
//! the database record; if the record write fails the new file is removed
//! again. A replaced or deleted post's old file is removed only after the
//! record change has committed.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::CurrentClaims,
    error::ApiError,
    models::{ApiResponse, PostUploadForm},
    state::AppState,
    storage::{MediaStore, OwnershipCheck, PostRepository, StorageError, StoredPost},
};

const CAPTION_FIELD: &str = "caption";
const MEDIA_FIELD: &str = "media";

/// Parsed multipart upload.
struct PostForm {
    caption: String,
    file_name: String,
    bytes: Vec<u8>,
}

fn multipart_error(e: MultipartError) -> ApiError {
    tracing::debug!(error = %e.body_text(), "Rejected multipart body");
    ApiError::new(e.status(), "Failed retrieving data")
}

async fn read_post_form(mut multipart: Multipart) -> Result<PostForm, ApiError> {
    let mut caption = String::new();
    let mut media = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(CAPTION_FIELD) => {
                caption = field.text().await.map_err(multipart_error)?;
            }
            Some(MEDIA_FIELD) => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                media = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (file_name, bytes) = media.ok_or_else(|| ApiError::bad_request("Failed retrieving data"))?;
    Ok(PostForm {
        caption,
        file_name,
        bytes,
    })
}

/// Remove a file after a failed or superseded write. Failures are only logged.
async fn discard_media(media: &MediaStore, file_name: &str) {
    if let Err(e) = media.delete(file_name).await {
        tracing::warn!(file = %file_name, error = %e, "Failed to remove upload");
    }
}

fn post_error(e: StorageError) -> ApiError {
    match e {
        StorageError::NotFound(_) => ApiError::not_found("Post not found"),
        other => other.into(),
    }
}

/// Create a post with an image.
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    tag = "Posts",
    security(("bearer" = [])),
    request_body(content = PostUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Post created", body = ApiResponse<StoredPost>),
        (status = 400, description = "Missing media or unsupported file type"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 413, description = "File too large")
    )
)]
pub async fn create_post(
    CurrentClaims(claims): CurrentClaims,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<StoredPost>>), ApiError> {
    let form = read_post_form(multipart).await?;
    let file_name = state.media.save(&form.file_name, &form.bytes).await?;

    let post = StoredPost::new(claims.user_id.clone(), form.caption, file_name);
    if let Err(e) = PostRepository::new(&state.db).create(&post) {
        discard_media(&state.media, &post.media).await;
        return Err(e.into());
    }

    tracing::info!(post_id = %post.id, user_id = %claims.user_id, "Post created");
    Ok((StatusCode::CREATED, Json(ApiResponse::data(post))))
}

/// Fetch a post.
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    tag = "Posts",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post", body = ApiResponse<StoredPost>),
        (status = 404, description = "Post not found")
    )
)]
pub async fn get_post(
    Path(post_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StoredPost>>, ApiError> {
    let post = PostRepository::new(&state.db)
        .get(&post_id)
        .map_err(post_error)?;
    Ok(Json(ApiResponse::data(post)))
}

/// Replace caption and image of the caller's post.
#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}",
    tag = "Posts",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Post ID")),
    request_body(content = PostUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Post updated", body = ApiResponse<StoredPost>),
        (status = 403, description = "Not the post's author"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn update_post(
    CurrentClaims(claims): CurrentClaims,
    Path(post_id): Path<String>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<StoredPost>>, ApiError> {
    let existing = PostRepository::new(&state.db)
        .get(&post_id)
        .verify_owner(&claims)
        .map_err(post_error)?;

    let form = read_post_form(multipart).await?;
    let file_name = state.media.save(&form.file_name, &form.bytes).await?;

    let updated = match PostRepository::new(&state.db).update(&post_id, form.caption, file_name.clone()) {
        Ok(post) => post,
        Err(e) => {
            discard_media(&state.media, &file_name).await;
            return Err(post_error(e));
        }
    };
    discard_media(&state.media, &existing.media).await;

    Ok(Json(ApiResponse::with_message("Post updated", updated)))
}

/// Delete the caller's post and its image.
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    tag = "Posts",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 403, description = "Not the post's author"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn delete_post(
    CurrentClaims(claims): CurrentClaims,
    Path(post_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let repo = PostRepository::new(&state.db);
    let post = repo.get(&post_id).verify_owner(&claims).map_err(post_error)?;
    repo.delete(&post_id).map_err(post_error)?;
    discard_media(&state.media, &post.media).await;

    tracing::info!(post_id = %post_id, "Post deleted");
    Ok(StatusCode::NO_CONTENT)
}
