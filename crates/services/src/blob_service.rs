//! Blob creation, lookup, the paginated feed, deletion and the retention purge.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use domains::{
    ActingUser, Blob, BlobAggregate, BlobPage, BlobRepository, BlobWithInterests, DomainError,
    DomainResult, Interest, InterestRepository, NewBlob, PageMeta, PageRequest,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{authenticated, non_blank};

#[derive(Clone)]
pub struct BlobService {
    blobs: Arc<dyn BlobRepository>,
    interests: Arc<dyn InterestRepository>,
}

impl BlobService {
    pub fn new(blobs: Arc<dyn BlobRepository>, interests: Arc<dyn InterestRepository>) -> Self {
        Self { blobs, interests }
    }

    /// Creates a blob owned by `actor` with the requested interests attached.
    ///
    /// Repeated interest ids are attached once. The repository writes the blob and
    /// its links atomically.
    #[instrument(skip(self, actor, input), fields(user_id = %actor.id))]
    pub async fn create(
        &self,
        actor: &ActingUser,
        input: NewBlob,
    ) -> DomainResult<BlobWithInterests> {
        let user_id = authenticated(actor)?;
        non_blank("content", &input.content)?;

        let mut seen = HashSet::new();
        let interest_ids: Vec<Uuid> = input
            .interest_ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();

        let now = Utc::now();
        let blob = Blob {
            id: Uuid::new_v4(),
            user_id: user_id.to_owned(),
            content: input.content,
            created_at: now,
            updated_at: now,
        };

        self.blobs.create(&blob, &interest_ids).await?;
        info!(blob_id = %blob.id, interests = interest_ids.len(), "blob created");

        Ok(BlobWithInterests {
            blob,
            interests: interest_ids,
        })
    }

    /// `Ok(None)` when no blob has that id.
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> DomainResult<Option<BlobAggregate>> {
        self.blobs.find_by_id(id).await
    }

    /// One page of the newest-first feed.
    ///
    /// When the store holds no blobs the page query is skipped entirely.
    #[instrument(skip(self), fields(page = req.page(), size = req.size()))]
    pub async fn list(&self, req: PageRequest) -> DomainResult<BlobPage> {
        let total = self.blobs.count().await?;
        let meta = PageMeta::new(req, total);
        if total == 0 {
            debug!("no blobs stored, skipping page query");
            return Ok(BlobPage {
                meta,
                blobs: Vec::new(),
            });
        }

        let blobs = self.blobs.list_page(req.offset(), req.limit()).await?;
        Ok(BlobPage { meta, blobs })
    }

    /// Deletes a blob owned by `actor`.
    ///
    /// Nothing deleted means either the blob does not exist (`NotFound`) or it
    /// belongs to someone else (`Forbidden`).
    #[instrument(skip(self, actor), fields(user_id = %actor.id))]
    pub async fn delete(&self, actor: &ActingUser, id: Uuid) -> DomainResult<()> {
        let user_id = authenticated(actor)?;
        if self.blobs.delete_owned(id, user_id).await? > 0 {
            info!(blob_id = %id, "blob deleted");
            return Ok(());
        }

        if self.blobs.exists(id).await? {
            Err(DomainError::Forbidden(format!(
                "blob {id} belongs to another user"
            )))
        } else {
            Err(DomainError::NotFound("blob", id.to_string()))
        }
    }

    pub async fn list_interests(&self) -> DomainResult<Vec<Interest>> {
        self.interests.list_all().await
    }

    /// Removes every blob older than `retention`. Returns the number removed.
    #[instrument(skip(self))]
    pub async fn purge_older_than(&self, retention: Duration) -> DomainResult<u64> {
        let cutoff = Utc::now() - retention;
        let removed = self.blobs.purge_older_than(cutoff).await?;
        info!(removed, %cutoff, "old blobs purged");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::actor;
    use domains::{BlobAuthor, BlobSummary, MockBlobRepository, MockInterestRepository};
    use mockall::predicate::*;

    fn service(blobs: MockBlobRepository) -> BlobService {
        BlobService::new(Arc::new(blobs), Arc::new(MockInterestRepository::new()))
    }

    fn summary(n: u128) -> BlobSummary {
        let now = Utc::now();
        BlobSummary {
            blob: Blob {
                id: Uuid::from_u128(n),
                user_id: "u".into(),
                content: "x".into(),
                created_at: now,
                updated_at: now,
            },
            author: BlobAuthor {
                username: None,
                avatar_icon: None,
                user_created_at: None,
            },
            likes_count: 0,
            comments_count: 0,
            interests: vec![],
        }
    }

    #[tokio::test]
    async fn create_assigns_owner_and_dedups_interests() {
        let go = Uuid::from_u128(1);
        let rust = Uuid::from_u128(2);
        let mut blobs = MockBlobRepository::new();
        blobs
            .expect_create()
            .withf(move |blob, ids| blob.user_id == "u1" && ids == [go, rust])
            .times(1)
            .returning(|_, _| Ok(()));

        let created = service(blobs)
            .create(
                &actor("u1"),
                NewBlob {
                    content: "hello".into(),
                    interest_ids: vec![go, rust, go],
                },
            )
            .await
            .unwrap();
        assert_eq!(created.blob.user_id, "u1");
        assert_eq!(created.interests, vec![go, rust]);
    }

    #[tokio::test]
    async fn create_requires_identity_and_content() {
        let mut blobs = MockBlobRepository::new();
        blobs.expect_create().never();
        let svc = service(blobs);

        let err = svc
            .create(
                &actor(""),
                NewBlob {
                    content: "hello".into(),
                    interest_ids: vec![],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Authentication(_)));

        let err = svc
            .create(
                &actor("u1"),
                NewBlob {
                    content: "   ".into(),
                    interest_ids: vec![],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn get_missing_blob_is_none() {
        let mut blobs = MockBlobRepository::new();
        blobs.expect_find_by_id().returning(|_| Ok(None));
        let found = tokio_test::assert_ok!(service(blobs).get(Uuid::new_v4()).await);
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn store_failure_is_not_absence() {
        let mut blobs = MockBlobRepository::new();
        blobs
            .expect_find_by_id()
            .returning(|_| Err(DomainError::store("BlobRepository::find_by_id", "down")));
        let err = service(blobs).get(Uuid::new_v4()).await.unwrap_err();
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn empty_store_skips_page_query() {
        let mut blobs = MockBlobRepository::new();
        blobs.expect_count().returning(|| Ok(0));
        blobs.expect_list_page().never();

        let page = service(blobs).list(PageRequest::default()).await.unwrap();
        assert!(page.blobs.is_empty());
        assert_eq!(page.meta.total_pages, 0);
        assert!(!page.meta.has_more);
    }

    #[tokio::test]
    async fn list_passes_offset_and_limit() {
        let mut blobs = MockBlobRepository::new();
        blobs.expect_count().returning(|| Ok(25));
        blobs
            .expect_list_page()
            .with(eq(10), eq(10))
            .times(1)
            .returning(|_, _| Ok((0..10).map(summary).collect()));

        let page = service(blobs)
            .list(PageRequest::new(2, 10).unwrap())
            .await
            .unwrap();
        assert_eq!(page.blobs.len(), 10);
        assert_eq!(page.meta.total_count, 25);
        assert_eq!(page.meta.total_pages, 3);
        assert!(page.meta.has_more);
    }

    #[tokio::test]
    async fn delete_by_owner_succeeds() {
        let mut blobs = MockBlobRepository::new();
        blobs
            .expect_delete_owned()
            .withf(|_, user| user == "u1")
            .returning(|_, _| Ok(1));
        blobs.expect_exists().never();
        assert!(service(blobs)
            .delete(&actor("u1"), Uuid::new_v4())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn delete_by_other_user_is_forbidden() {
        let mut blobs = MockBlobRepository::new();
        blobs.expect_delete_owned().returning(|_, _| Ok(0));
        blobs.expect_exists().returning(|_| Ok(true));
        let err = service(blobs)
            .delete(&actor("intruder"), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn delete_missing_blob_is_not_found() {
        let mut blobs = MockBlobRepository::new();
        blobs.expect_delete_owned().returning(|_, _| Ok(0));
        blobs.expect_exists().returning(|_| Ok(false));
        let err = service(blobs)
            .delete(&actor("u1"), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn purge_uses_retention_cutoff() {
        let mut blobs = MockBlobRepository::new();
        blobs
            .expect_purge_older_than()
            .withf(|cutoff| *cutoff < Utc::now() - Duration::hours(23))
            .returning(|_| Ok(7));
        let removed = service(blobs)
            .purge_older_than(Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(removed, 7);
    }
}
