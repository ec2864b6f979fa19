//! # Axum adapter
//!
//! Route table, shared state and the middleware stack. `/api/*` routes require a
//! bearer session; `/health` and `/metrics` are open. Every response echoes an
//! `x-request-id`, generated when the client sends none.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use domains::IdentityResolver;
use services::{BlobService, CommentService, LikeService, UserService};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::metrics::HttpMetrics;

pub use error::{ApiError, ApiResult};

/// State shared by every handler. Cloning is cheap: services hold `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub blobs: BlobService,
    pub comments: CommentService,
    pub likes: LikeService,
    pub users: UserService,
    pub identity: Arc<dyn IdentityResolver>,
    pub metrics: Arc<HttpMetrics>,
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    let api = Router::new()
        .route(
            "/api/blob",
            post(handlers::create_blob).get(handlers::list_blobs),
        )
        .route(
            "/api/blob/{id}",
            get(handlers::get_blob).delete(handlers::delete_blob),
        )
        .route(
            "/api/blob/{id}/like",
            post(handlers::add_like)
                .delete(handlers::remove_like)
                .get(handlers::list_likes),
        )
        .route(
            "/api/blob/{id}/comment",
            post(handlers::add_comment).get(handlers::list_comments),
        )
        .route(
            "/api/blob/{id}/comment/{comment_id}",
            delete(handlers::remove_comment),
        )
        .route("/api/interest", get(handlers::list_interests))
        .route(
            "/api/user",
            get(handlers::current_user).put(handlers::update_user),
        )
        .route("/api/user/{username}", get(handlers::user_profile))
        .route_layer(from_fn_with_state(state.clone(), auth::authenticate));

    Router::new()
        .merge(api)
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::render_metrics))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::track_http_metrics,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}
