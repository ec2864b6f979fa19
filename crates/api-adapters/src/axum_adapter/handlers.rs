//! # Handlers
//!
//! Thin translation between HTTP and the services: parse ids and bodies, call one
//! service method, shape the response. Every handler under `/api` receives the
//! acting user from the auth layer.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use domains::{
    ActingUser, BlobAggregate, BlobPage, BlobWithInterests, Comment, CommentWithAuthor,
    DomainError, Interest, Like, LikeWithAuthor, NewBlob, PageRequest, User, UserUpdate,
    UserWithBlobs,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::{parse_id, ApiError, ApiResult};
use super::AppState;
use crate::metrics;

/// Raw `page`/`size` query values; validated by [`PageRequest::from_query`].
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    pub content: String,
}

/// The caller as shown alongside like and comment lists.
#[derive(Debug, Serialize)]
pub struct UserLogon {
    pub id: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub avatar_icon: String,
    pub avatar_color: String,
}

impl From<User> for UserLogon {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            avatar_icon: u.avatar_icon,
            avatar_color: u.avatar_color,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WithLogon<T> {
    pub user_logon: UserLogon,
    pub content: Vec<T>,
}

async fn logon(state: &AppState, actor: &ActingUser) -> ApiResult<UserLogon> {
    Ok(state.users.get(actor).await?.into())
}

// ── Blobs ───────────────────────────────────────────────────────────────────

pub async fn create_blob(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    body: Result<Json<NewBlob>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BlobWithInterests>)> {
    let Json(input) = body?;
    let created = state.blobs.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_blob(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BlobAggregate>> {
    let id = parse_id("blob", &id)?;
    state
        .blobs
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| DomainError::NotFound("blob", id.to_string()).into())
}

pub async fn list_blobs(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<BlobPage>> {
    let Query(params) = params?;
    let req = PageRequest::from_query(params.page.as_deref(), params.size.as_deref())?;
    Ok(Json(state.blobs.list(req).await?))
}

pub async fn delete_blob(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id("blob", &id)?;
    state.blobs.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Likes ───────────────────────────────────────────────────────────────────

pub async fn add_like(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<Like>)> {
    let blob_id = parse_id("blob", &id)?;
    let like = state.likes.add(&actor, blob_id).await?;
    Ok((StatusCode::CREATED, Json(like)))
}

pub async fn remove_like(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let blob_id = parse_id("blob", &id)?;
    state.likes.remove(&actor, blob_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_likes(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<WithLogon<LikeWithAuthor>>> {
    let blob_id = parse_id("blob", &id)?;
    let content = state.likes.list(blob_id).await?;
    Ok(Json(WithLogon {
        user_logon: logon(&state, &actor).await?,
        content,
    }))
}

// ── Comments ────────────────────────────────────────────────────────────────

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<String>,
    body: Result<Json<CommentBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let blob_id = parse_id("blob", &id)?;
    let Json(CommentBody { content }) = body?;
    let comment = state.comments.add(&actor, blob_id, content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Always 204 for a well-formed id, whether or not anything was removed.
pub async fn remove_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path((id, comment_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    parse_id("blob", &id)?;
    let comment_id = parse_id("comment", &comment_id)?;
    state.comments.remove(&actor, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<WithLogon<CommentWithAuthor>>> {
    let blob_id = parse_id("blob", &id)?;
    let content = state.comments.list(blob_id).await?;
    Ok(Json(WithLogon {
        user_logon: logon(&state, &actor).await?,
        content,
    }))
}

// ── Interests & users ───────────────────────────────────────────────────────

pub async fn list_interests(State(state): State<AppState>) -> ApiResult<Json<Vec<Interest>>> {
    Ok(Json(state.blobs.list_interests().await?))
}

pub async fn current_user(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.get(&actor).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    body: Result<Json<UserUpdate>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Json(update) = body?;
    state.users.update(&actor, update).await?;
    Ok(Json(state.users.get(&actor).await?))
}

pub async fn user_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<UserWithBlobs>> {
    state
        .users
        .profile_by_username(&username)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::from(DomainError::NotFound("user", username)))
}

// ── Operational ─────────────────────────────────────────────────────────────

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, metrics::CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
