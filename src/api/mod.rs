// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, FromRequest, Request},
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::require_auth,
    error::ApiError,
    models::{
        FollowEntry, FollowRequest, LikeUser, LoginRequest, LoginResponse, PostLikes,
        PostUploadForm, RegisterRequest, UpdateUserRequest,
    },
    state::AppState,
    storage::{media::MAX_UPLOAD_SIZE, StoredFavorite, StoredFollow, StoredLike, StoredPost, User},
};

pub mod favorites;
pub mod follows;
pub mod health;
pub mod likes;
pub mod posts;
pub mod users;

/// Room for multipart boundaries and the caption on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// JSON body extractor whose rejection uses the API error envelope.
pub struct JsonPayload<T>(pub T);

impl<S, T> FromRequest<S> for JsonPayload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "Rejected JSON body");
                Err(ApiError::bad_request("Payload Malformed"))
            }
        }
    }
}

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let public = Router::new()
        .route("/login", post(users::login))
        .route("/users", post(users::register));

    // Likes and favorites share one path parameter slot: POST/GET take a
    // post id, DELETE takes the like or favorite id.
    let protected = Router::new()
        .route("/users/logged", get(users::get_logged_user))
        .route(
            "/users/{id}",
            put(users::update_user).delete(users::delete_user),
        )
        .route("/posts", post(posts::create_post))
        .route(
            "/posts/{id}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/follows", post(follows::follow_user))
        .route("/follows/followers", get(follows::list_followers))
        .route("/follows/following", get(follows::list_following))
        .route("/follows/{id}", delete(follows::unfollow))
        .route(
            "/likes/{id}",
            post(likes::like_post)
                .get(likes::get_post_likes)
                .delete(likes::unlike),
        )
        .route("/favorites", get(favorites::list_favorites))
        .route(
            "/favorites/{id}",
            post(favorites::add_favorite).delete(favorites::remove_favorite),
        )
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            require_auth,
        ));

    let v1_routes = public.merge(protected).with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/api/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + MULTIPART_OVERHEAD))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

/// Registers the bearer scheme referenced by `security(("bearer" = []))`.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        users::login,
        users::register,
        users::get_logged_user,
        users::update_user,
        users::delete_user,
        posts::create_post,
        posts::get_post,
        posts::update_post,
        posts::delete_post,
        follows::follow_user,
        follows::list_followers,
        follows::list_following,
        follows::unfollow,
        likes::like_post,
        likes::get_post_likes,
        likes::unlike,
        favorites::add_favorite,
        favorites::list_favorites,
        favorites::remove_favorite,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            User,
            StoredPost,
            StoredFollow,
            StoredLike,
            StoredFavorite,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateUserRequest,
            PostUploadForm,
            FollowRequest,
            FollowEntry,
            LikeUser,
            PostLikes,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users", description = "Registration, login and profile"),
        (name = "Posts", description = "Image posts"),
        (name = "Follows", description = "Follow graph"),
        (name = "Likes", description = "Post likes"),
        (name = "Favorites", description = "Saved posts"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{seed_user, test_state};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request as HttpRequest},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const TIMEOUT: Duration = Duration::from_secs(30);
    const BOUNDARY: &str = "social-test-boundary";

    async fn send(app: &Router, request: HttpRequest<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn upload_request(token: &str, caption: &str, file_name: &str, bytes: &[u8]) -> HttpRequest<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"caption\"\r\n\r\n{caption}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"media\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        HttpRequest::builder()
            .method("POST")
            .uri("/api/v1/posts")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn protected_route_requires_token() {
        let (state, _dir) = test_state().await;
        let app = router(state, TIMEOUT);

        let request = HttpRequest::builder()
            .uri("/api/v1/users/logged")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "No token provided");
    }

    #[tokio::test]
    async fn register_login_and_fetch_current_user() {
        let (state, _dir) = test_state().await;
        let app = router(state, TIMEOUT);

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/v1/users",
                None,
                json!({ "username": "dana", "email": "dana@example.com", "password": "password123" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "success");
        assert!(body["data"].get("password_hash").is_none());

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/v1/login",
                None,
                json!({ "email": "dana@example.com", "password": "password123" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "success to login");
        let token = body["data"]["access_token"].as_str().unwrap().to_string();

        let request = HttpRequest::builder()
            .uri("/api/v1/users/logged")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["username"], "dana");
    }

    #[tokio::test]
    async fn malformed_json_is_rejected_with_envelope() {
        let (state, _dir) = test_state().await;
        let app = router(state, TIMEOUT);

        let request = HttpRequest::builder()
            .method("POST")
            .uri("/api/v1/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Payload Malformed");
    }

    #[tokio::test]
    async fn upload_like_and_favorite_a_post() {
        let (state, _dir) = test_state().await;
        let (_, author_token) = seed_user(&state, "erin", "password123");
        let (_, fan_token) = seed_user(&state, "frank", "password123");
        let app = router(state.clone(), TIMEOUT);

        let (status, body) = send(
            &app,
            upload_request(&author_token, "sunset", "sunset.PNG", b"\x89PNG fake image"),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["caption"], "sunset");
        let post_id = body["data"]["id"].as_str().unwrap().to_string();
        let media = body["data"]["media"].as_str().unwrap().to_string();
        assert!(media.ends_with(".png"));
        assert!(state.media.path_of(&media).exists());

        let (status, _) = send(
            &app,
            json_request("POST", &format!("/api/v1/likes/{post_id}"), Some(&fan_token), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let request = HttpRequest::builder()
            .uri(format!("/api/v1/likes/{post_id}"))
            .header(header::AUTHORIZATION, format!("Bearer {author_token}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["likes_count"], 1);
        assert_eq!(body["data"]["users"][0]["username"], "frank");

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                &format!("/api/v1/favorites/{post_id}"),
                Some(&fan_token),
                json!({}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let request = HttpRequest::builder()
            .uri("/api/v1/favorites")
            .header(header::AUTHORIZATION, format!("Bearer {fan_token}"))
            .body(Body::empty())
            .unwrap();
        let (_, body) = send(&app, request).await;
        assert_eq!(body["data"][0]["id"], post_id);
    }

    #[tokio::test]
    async fn upload_with_unsupported_extension_is_rejected() {
        let (state, _dir) = test_state().await;
        let (_, token) = seed_user(&state, "gina", "password123");
        let app = router(state, TIMEOUT);

        let (status, _) = send(&app, upload_request(&token, "doc", "notes.txt", b"hello")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_and_docs_are_public() {
        let (state, _dir) = test_state().await;
        let app = router(state, TIMEOUT);

        for uri in ["/health", "/health/live", "/health/ready"] {
            let request = HttpRequest::builder().uri(uri).body(Body::empty()).unwrap();
            let (status, body) = send(&app, request).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["status"], "ok");
        }

        let request = HttpRequest::builder()
            .uri("/api-doc/openapi.json")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"].get("/api/v1/posts").is_some());
        assert!(body["components"]["securitySchemes"].get("bearer").is_some());
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let (state, _dir) = test_state().await;
        let app = router(state, TIMEOUT);

        let request = HttpRequest::builder()
            .uri("/health/live")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
