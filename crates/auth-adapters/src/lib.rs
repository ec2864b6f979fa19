//! # auth-adapters
//!
//! Resolves a bearer session token into an [`ActingUser`] by looking it up in the
//! session store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use domains::{ActingUser, DomainError, DomainResult, IdentityResolver, SessionRepository};
use tracing::debug;

/// [`IdentityResolver`] backed by the `"Session"` table.
pub struct SessionIdentityResolver {
    sessions: Arc<dyn SessionRepository>,
}

impl SessionIdentityResolver {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl IdentityResolver for SessionIdentityResolver {
    async fn resolve(&self, bearer_token: &str) -> DomainResult<ActingUser> {
        let session = self
            .sessions
            .find_by_token(bearer_token)
            .await?
            .ok_or_else(|| DomainError::Authentication("unknown session".into()))?;

        if session.expires <= Utc::now() {
            debug!(user_id = %session.user_id, "session expired");
            return Err(DomainError::Authentication("session expired".into()));
        }
        Ok(session.into())
    }
}
