use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    AuthorCard, Comment, CommentRepository, CommentWithAuthor, DomainError, DomainResult,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::error::{parse_uuid, store, store_err, violation, Violation};
use super::queries;

#[derive(sqlx::FromRow)]
struct CommentAuthorRow {
    id: String,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_id: String,
    blob_id: String,
    image: Option<String>,
    username: Option<String>,
    avatar_icon: String,
    avatar_color: String,
}

pub struct PgCommentRepo {
    pool: PgPool,
}

impl PgCommentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepo {
    async fn create(&self, comment: &Comment) -> DomainResult<()> {
        sqlx::query(queries::INSERT_COMMENT)
            .bind(comment.id.to_string())
            .bind(&comment.content)
            .bind(&comment.user_id)
            .bind(comment.blob_id.to_string())
            .bind(comment.created_at)
            .bind(comment.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|err| match violation(&err) {
                // The blob vanished between the existence check and the insert.
                Some(Violation::ForeignKey) => {
                    DomainError::NotFound("blob", comment.blob_id.to_string())
                }
                _ => store("CommentRepository::create", err),
            })?;
        Ok(())
    }

    async fn delete_owned(&self, comment_id: Uuid, user_id: &str) -> DomainResult<u64> {
        let result = sqlx::query(queries::DELETE_OWNED_COMMENT)
            .bind(comment_id.to_string())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(store_err("CommentRepository::delete_owned"))?;
        Ok(result.rows_affected())
    }

    async fn list_by_blob(&self, blob_id: Uuid) -> DomainResult<Vec<CommentWithAuthor>> {
        const OP: &str = "CommentRepository::list_by_blob";
        let rows: Vec<CommentAuthorRow> = sqlx::query_as(queries::COMMENTS_BY_BLOB)
            .bind(blob_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(store_err(OP))?;

        rows.into_iter()
            .map(|row| {
                Ok(CommentWithAuthor {
                    comment: Comment {
                        id: parse_uuid(OP, &row.id)?,
                        user_id: row.user_id,
                        blob_id: parse_uuid(OP, &row.blob_id)?,
                        content: row.content,
                        created_at: row.created_at,
                        updated_at: row.updated_at,
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
