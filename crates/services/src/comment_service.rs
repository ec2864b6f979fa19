use std::sync::Arc;

use chrono::Utc;
use domains::{
    ActingUser, BlobRepository, Comment, CommentRepository, CommentWithAuthor, DomainError,
    DomainResult,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{authenticated, non_blank};

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    blobs: Arc<dyn BlobRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, blobs: Arc<dyn BlobRepository>) -> Self {
        Self { comments, blobs }
    }

    #[instrument(skip(self, actor, content), fields(user_id = %actor.id))]
    pub async fn add(
        &self,
        actor: &ActingUser,
        blob_id: Uuid,
        content: String,
    ) -> DomainResult<Comment> {
        let user_id = authenticated(actor)?;
        non_blank("content", &content)?;
        if !self.blobs.exists(blob_id).await? {
            return Err(DomainError::NotFound("blob", blob_id.to_string()));
        }

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            user_id: user_id.to_owned(),
            blob_id,
            content,
            created_at: now,
            updated_at: now,
        };
        self.comments.create(&comment).await?;
        info!(comment_id = %comment.id, "comment added");
        Ok(comment)
    }

    /// Removes a comment written by `actor`. Returns the number of rows removed.
    ///
    /// An unknown id or someone else's comment removes nothing and is still `Ok`.
    #[instrument(skip(self, actor), fields(user_id = %actor.id))]
    pub async fn remove(&self, actor: &ActingUser, comment_id: Uuid) -> DomainResult<u64> {
        let user_id = authenticated(actor)?;
        let removed = self.comments.delete_owned(comment_id, user_id).await?;
        if removed == 0 {
            debug!(%comment_id, "no comment owned by caller, nothing removed");
        } else {
            info!(%comment_id, "comment removed");
        }
        Ok(removed)
    }

    pub async fn list(&self, blob_id: Uuid) -> DomainResult<Vec<CommentWithAuthor>> {
        self.comments.list_by_blob(blob_id).await
    }
}
