//! # Ports
//!
//! Storage and identity contracts the services depend on. Adapters in
//! `storage-adapters` and `auth-adapters` implement them; tests use the
//! `MockXxx` types generated under the `testing` feature.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::DomainResult;
use crate::models::{
    ActingUser, Blob, BlobAggregate, BlobSummary, Comment, CommentWithAuthor, Interest, Like,
    LikeWithAuthor, Session, User, UserUpdate, UserWithBlobs,
};

/// Persistence contract for blobs and their read models.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BlobRepository: Send + Sync {
    /// Inserts the blob and one interest link per id, atomically.
    async fn create(&self, blob: &Blob, interest_ids: &[Uuid]) -> DomainResult<()>;

    /// Blob with comments, likes and interests. `None` when the id is unknown.
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<BlobAggregate>>;

    async fn exists(&self, id: Uuid) -> DomainResult<bool>;

    async fn count(&self) -> DomainResult<u64>;

    /// Newest-first feed window with store-computed like/comment counts.
    async fn list_page(&self, offset: i64, limit: i64) -> DomainResult<Vec<BlobSummary>>;

    /// Deletes the blob only if `user_id` owns it. Returns rows removed.
    async fn delete_owned(&self, id: Uuid, user_id: &str) -> DomainResult<u64>;

    /// Deletes every blob created before `cutoff`. Returns rows removed.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> DomainResult<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait InterestRepository: Send + Sync {
    async fn list_all(&self) -> DomainResult<Vec<Interest>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: &Comment) -> DomainResult<()>;

    /// Deletes the comment only if `user_id` wrote it. Returns rows removed.
    async fn delete_owned(&self, comment_id: Uuid, user_id: &str) -> DomainResult<u64>;

    async fn list_by_blob(&self, blob_id: Uuid) -> DomainResult<Vec<CommentWithAuthor>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Fails with `AlreadyReacted` when the `(user, blob)` pair already has a like.
    async fn create(&self, like: &Like) -> DomainResult<()>;

    async fn find_id(&self, user_id: &str, blob_id: Uuid) -> DomainResult<Option<Uuid>>;

    async fn delete(&self, like_id: Uuid, user_id: &str, blob_id: Uuid) -> DomainResult<u64>;

    async fn list_by_blob(&self, blob_id: Uuid) -> DomainResult<Vec<LikeWithAuthor>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>>;

    /// Profile plus owned blobs. `None` when no user has that username.
    async fn find_by_username_with_blobs(&self, username: &str)
        -> DomainResult<Option<UserWithBlobs>>;

    /// Writes the non-empty fields of `update`. When the email changes, pending
    /// verification tokens for `previous_email` are dropped in the same transaction.
    async fn update(
        &self,
        user_id: &str,
        previous_email: &str,
        update: &UserUpdate,
    ) -> DomainResult<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_by_token(&self, token: &str) -> DomainResult<Option<Session>>;
}

/// Turns a bearer token into the acting user, or fails with `Authentication`.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, bearer_token: &str) -> DomainResult<ActingUser>;
}
