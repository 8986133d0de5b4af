// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account endpoints: registration, login and profile management.
//!
//! Login is the only place a session token is issued. It also writes the
//! user into the session cache so the first `GET /users/logged` after login
//! is served without touching the database.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::JsonPayload;
use crate::{
    auth::{password, CurrentClaims, Identity},
    error::ApiError,
    models::{ApiResponse, LoginRequest, LoginResponse, RegisterRequest, UpdateUserRequest},
    state::AppState,
    storage::{StorageError, StoredUser, User, UserLookup, UserRepository},
};

const INVALID_PAYLOAD: &str = "Invalid Payload";
const CREDENTIALS_USED: &str = "Credentials already used";
const USER_NOT_FOUND: &str = "User not found";
const WRONG_PASSWORD: &str = "Wrong password";

fn user_error(e: StorageError) -> ApiError {
    match e {
        StorageError::NotFound(_) => ApiError::not_found(USER_NOT_FOUND),
        StorageError::AlreadyExists(_) => ApiError::conflict(CREDENTIALS_USED),
        other => other.into(),
    }
}

/// Only the account owner may change or delete it.
fn ensure_self(claims: &crate::auth::Claims, user_id: &str) -> Result<(), ApiError> {
    if claims.user_id == user_id {
        Ok(())
    } else {
        Err(ApiError::forbidden("You can only modify your own account"))
    }
}

/// Resolve the account behind `request` and check its password.
fn authenticate<L>(lookup: &L, request: &LoginRequest) -> Result<StoredUser, ApiError>
where
    L: UserLookup + ?Sized,
{
    let user = lookup.user_by_email(&request.email).map_err(user_error)?;

    if !password::verify(&request.password, &user.password_hash) {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(ApiError::bad_request(WRONG_PASSWORD));
    }
    Ok(user)
}

/// Exchange email and password for a session token.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    tag = "Users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid payload or wrong password"),
        (status = 404, description = "User not found")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    JsonPayload(request): JsonPayload<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if !request.is_valid() {
        return Err(ApiError::bad_request(INVALID_PAYLOAD));
    }

    let user = authenticate(&UserRepository::new(&state.db), &request)?;

    let access_token = state.tokens.issue(&Identity::from(&user))?;
    state.sessions.put(&User::from(user.clone())).await;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(ApiResponse::with_message(
        "success to login",
        LoginResponse { access_token },
    )))
}

/// Register a new account.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<User>),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    JsonPayload(request): JsonPayload<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    if !request.is_valid() {
        return Err(ApiError::bad_request(INVALID_PAYLOAD));
    }

    let digest = password::hash(&request.password)?;
    let user = StoredUser::new(request.username.trim().to_string(), request.email, digest);
    UserRepository::new(&state.db)
        .create(&user)
        .map_err(user_error)?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(ApiResponse::data(User::from(user)))))
}

/// Current user, served through the session cache.
#[utoipa::path(
    get,
    path = "/api/v1/users/logged",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Logged-in user", body = ApiResponse<User>),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "User no longer exists")
    )
)]
pub async fn get_logged_user(
    CurrentClaims(claims): CurrentClaims,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let repo = UserRepository::new(&state.db);
    let user = state
        .sessions
        .get_or_load(&claims.user_id, &repo)
        .await
        .map_err(user_error)?;
    Ok(Json(ApiResponse::data(user)))
}

/// Update username and email of the caller's own account.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<User>),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Not the caller's account"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn update_user(
    CurrentClaims(claims): CurrentClaims,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    JsonPayload(request): JsonPayload<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    ensure_self(&claims, &user_id)?;
    if !request.is_valid() {
        return Err(ApiError::bad_request(INVALID_PAYLOAD));
    }

    let user = UserRepository::new(&state.db)
        .update_profile(&user_id, request.username.trim().to_string(), request.email)
        .map_err(user_error)?;

    Ok(Json(ApiResponse::with_message(
        "Data Updated successfully",
        User::from(user),
    )))
}

/// Delete the caller's own account.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 403, description = "Not the caller's account"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    CurrentClaims(claims): CurrentClaims,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    ensure_self(&claims, &user_id)?;
    UserRepository::new(&state.db)
        .delete(&user_id)
        .map_err(user_error)?;

    tracing::info!(user_id = %user_id, "User deleted");
    Ok(Json(ApiResponse::message("Data deleted successfully")))
}
