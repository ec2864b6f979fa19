use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{AuthorCard, DomainError, DomainResult, Like, LikeRepository, LikeWithAuthor};
use sqlx::PgPool;
use uuid::Uuid;

use super::error::{parse_uuid, store, store_err, violation, Violation};
use super::queries;

#[derive(sqlx::FromRow)]
struct LikeAuthorRow {
    id: String,
    created_at: DateTime<Utc>,
    user_id: String,
    blob_id: String,
    image: Option<String>,
    username: Option<String>,
    avatar_icon: String,
    avatar_color: String,
}

pub struct PgLikeRepo {
    pool: PgPool,
}

impl PgLikeRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeRepository for PgLikeRepo {
    /// Relies on the `unique_user_blob_like` constraint for "one like per user".
    async fn create(&self, like: &Like) -> DomainResult<()> {
        sqlx::query(queries::INSERT_LIKE)
            .bind(like.id.to_string())
            .bind(&like.user_id)
            .bind(like.blob_id.to_string())
            .bind(like.created_at)
            .execute(&self.pool)
            .await
            .map_err(|err| match violation(&err) {
                Some(Violation::Unique) => DomainError::AlreadyReacted {
                    user_id: like.user_id.clone(),
                    blob_id: like.blob_id.to_string(),
                },
                Some(Violation::ForeignKey) => {
                    DomainError::NotFound("blob", like.blob_id.to_string())
                }
                None => store("LikeRepository::create", err),
            })?;
        Ok(())
    }

    async fn find_id(&self, user_id: &str, blob_id: Uuid) -> DomainResult<Option<Uuid>> {
        const OP: &str = "LikeRepository::find_id";
        let raw: Option<String> = sqlx::query_scalar(queries::FIND_LIKE_ID)
            .bind(user_id)
            .bind(blob_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err(OP))?;

        raw.map(|id| parse_uuid(OP, &id)).transpose()
    }

    async fn delete(&self, like_id: Uuid, user_id: &str, blob_id: Uuid) -> DomainResult<u64> {
        let result = sqlx::query(queries::DELETE_LIKE)
            .bind(like_id.to_string())
            .bind(user_id)
            .bind(blob_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_err("LikeRepository::delete"))?;
        Ok(result.rows_affected())
    }

    async fn list_by_blob(&self, blob_id: Uuid) -> DomainResult<Vec<LikeWithAuthor>> {
        const OP: &str = "LikeRepository::list_by_blob";
        let rows: Vec<LikeAuthorRow> = sqlx::query_as(queries::LIKES_BY_BLOB)
            .bind(blob_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(store_err(OP))?;

        rows.into_iter()
            .map(|row| {
                Ok(LikeWithAuthor {
                    like: Like {
                        id: parse_uuid(OP, &row.id)?,
                        user_id: row.user_id,
                        blob_id: parse_uuid(OP, &row.blob_id)?,
                        created_at: row.created_at,
                    },
                    author: AuthorCard {
                        image: row.image,
                        username: row.username,
                        avatar_icon: row.avatar_icon,
                        avatar_color: row.avatar_color,
                    },
                })
            })
            .collect()
    }
}
