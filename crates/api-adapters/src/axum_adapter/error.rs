use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domains::DomainError;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("invalid request body: {0}")]
    Body(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Body(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Body(_) => StatusCode::BAD_REQUEST,
            Self::Domain(err) => match err {
                DomainError::Validation(_) => StatusCode::BAD_REQUEST,
                DomainError::Authentication(_) => StatusCode::UNAUTHORIZED,
                DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
                DomainError::NotFound(..) => StatusCode::NOT_FOUND,
                DomainError::AlreadyExists(_) | DomainError::AlreadyReacted { .. } => {
                    StatusCode::CONFLICT
                }
                DomainError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Already logged by the storage adapter; never leak query details.
            Self::Domain(DomainError::Store { op, .. }) => {
                tracing::warn!(%op, "request failed on a store error");
                "internal server error".to_owned()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Parses a path segment as a UUID, naming the resource in the error.
pub fn parse_id(resource: &str, raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| DomainError::validation(format!("invalid {resource} id {raw:?}")).into())
}
