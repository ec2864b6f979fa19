use std::sync::Arc;

use chrono::Utc;
use domains::{
    ActingUser, BlobRepository, DomainError, DomainResult, Like, LikeRepository, LikeWithAuthor,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::authenticated;

#[derive(Clone)]
pub struct LikeService {
    likes: Arc<dyn LikeRepository>,
    blobs: Arc<dyn BlobRepository>,
}

impl LikeService {
    pub fn new(likes: Arc<dyn LikeRepository>, blobs: Arc<dyn BlobRepository>) -> Self {
        Self { likes, blobs }
    }

    /// Likes `blob_id` as `actor`. A second like by the same user fails with
    /// `AlreadyReacted`.
    #[instrument(skip(self, actor), fields(user_id = %actor.id))]
    pub async fn add(&self, actor: &ActingUser, blob_id: Uuid) -> DomainResult<Like> {
        let user_id = authenticated(actor)?;
        if !self.blobs.exists(blob_id).await? {
            return Err(DomainError::NotFound("blob", blob_id.to_string()));
        }

        let like = Like {
            id: Uuid::new_v4(),
            user_id: user_id.to_owned(),
            blob_id,
            created_at: Utc::now(),
        };
        self.likes.create(&like).await?;
        info!(like_id = %like.id, "blob liked");
        Ok(like)
    }

    #[instrument(skip(self, actor), fields(user_id = %actor.id))]
    pub async fn remove(&self, actor: &ActingUser, blob_id: Uuid) -> DomainResult<()> {
        let user_id = authenticated(actor)?;
        let like_id = self
            .likes
            .find_id(user_id, blob_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("like", format!("{user_id}/{blob_id}")))?;

        if self.likes.delete(like_id, user_id, blob_id).await? == 0 {
            return Err(DomainError::NotFound("like", like_id.to_string()));
        }
        info!(%like_id, "like removed");
        Ok(())
    }

    pub async fn list(&self, blob_id: Uuid) -> DomainResult<Vec<LikeWithAuthor>> {
        self.likes.list_by_blob(blob_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::actor;
    use domains::{MockBlobRepository, MockLikeRepository};

    fn existing_blob() -> Arc<MockBlobRepository> {
        let mut blobs = MockBlobRepository::new();
        blobs.expect_exists().returning(|_| Ok(true));
        Arc::new(blobs)
    }

    #[tokio::test]
    async fn second_like_surfaces_already_reacted() {
        let blob_id = Uuid::new_v4();
        let mut likes = MockLikeRepository::new();
        let mut calls = 0;
        likes.expect_create().times(2).returning(move |like| {
            calls += 1;
            if calls == 1 {
                Ok(())
            } else {
                Err(DomainError::AlreadyReacted {
                    user_id: like.user_id.clone(),
                    blob_id: like.blob_id.to_string(),
                })
            }
        });

        let svc = LikeService::new(Arc::new(likes), existing_blob());
        svc.add(&actor("u"), blob_id).await.unwrap();
        let err = svc.add(&actor("u"), blob_id).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyReacted { .. }));
    }

    #[tokio::test]
    async fn like_on_missing_blob_is_not_found() {
        let mut blobs = MockBlobRepository::new();
        blobs.expect_exists().returning(|_| Ok(false));
        let mut likes = MockLikeRepository::new();
        likes.expect_create().never();

        let svc = LikeService::new(Arc::new(likes), Arc::new(blobs));
        let err = svc.add(&actor("u"), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound("blob", _)));
    }

    #[tokio::test]
    async fn removing_absent_like_is_not_found() {
        let mut likes = MockLikeRepository::new();
        likes.expect_find_id().returning(|_, _| Ok(None));
        likes.expect_delete().never();

        let svc = LikeService::new(Arc::new(likes), Arc::new(MockBlobRepository::new()));
        let err = svc.remove(&actor("u"), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound("like", _)));
    }

    #[tokio::test]
    async fn remove_deletes_the_resolved_like() {
        let blob_id = Uuid::new_v4();
        let like_id = Uuid::new_v4();
        let mut likes = MockLikeRepository::new();
        likes
            .expect_find_id()
            .withf(move |user, blob| user == "u" && *blob == blob_id)
            .returning(move |_, _| Ok(Some(like_id)));
        likes
            .expect_delete()
            .withf(move |like, user, blob| *like == like_id && user == "u" && *blob == blob_id)
            .times(1)
            .returning(|_, _, _| Ok(1));

        let svc = LikeService::new(Arc::new(likes), Arc::new(MockBlobRepository::new()));
        tokio_test::assert_ok!(svc.remove(&actor("u"), blob_id).await);
    }

    #[tokio::test]
    async fn like_gone_before_delete_is_not_found() {
        let mut likes = MockLikeRepository::new();
        likes
            .expect_find_id()
            .returning(|_, _| Ok(Some(Uuid::new_v4())));
        likes.expect_delete().times(1).returning(|_, _, _| Ok(0));

        let svc = LikeService::new(Arc::new(likes), Arc::new(MockBlobRepository::new()));
        let err = svc.remove(&actor("u"), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound("like", _)));
    }
}
