//! Bearer-session authentication for the `/api` routes.
//!
//! Runs as a route layer, so an unauthenticated request is rejected with 401 before
//! any extractor or handler sees it. On success the resolved [`ActingUser`] is placed
//! in the request extensions for handlers to pick up with `Extension<ActingUser>`.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use domains::{ActingUser, DomainError};

use super::error::ApiResult;
use super::AppState;

/// Extracts the token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively; anything other than
/// `Bearer <non-empty token>` yields `None`.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    // Owned: the request body is not `Sync`, so no borrow of `req` may cross an await.
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_owned)
        .ok_or_else(|| DomainError::Authentication("missing bearer token".into()))?;

    let actor: ActingUser = state.identity.resolve(&token).await?;
    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bearer_header() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer   abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
