use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{DomainResult, Session, SessionRepository};
use sqlx::PgPool;

use super::error::store_err;
use super::queries;

#[derive(sqlx::FromRow)]
struct SessionRow {
    user_id: String,
    email: String,
    expires: DateTime<Utc>,
}

/// Reads the `"Session"` table written by the front end's auth layer.
pub struct PgSessionRepo {
    pool: PgPool,
}

impl PgSessionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepo {
    async fn find_by_token(&self, token: &str) -> DomainResult<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(queries::SESSION_BY_TOKEN)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err("SessionRepository::find_by_token"))?;

        Ok(row.map(|r| Session {
            user_id: r.user_id,
            email: r.email,
            expires: r.expires,
        }))
    }
}
