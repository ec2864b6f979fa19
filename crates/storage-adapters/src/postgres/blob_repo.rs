use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    Blob, BlobAggregate, BlobRepository, BlobSummary, DomainError, DomainResult, Interest,
    InterestRepository,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::error::{count, parse_uuid, store, store_err, violation, Violation};
use super::queries;
use crate::flatten::{flatten_blob_detail, fold_blob_list, BlobDetailRow, BlobListRow};

pub struct PgBlobRepo {
    pool: PgPool,
}

impl PgBlobRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlobRepository for PgBlobRepo {
    /// Inserts the blob and its interest links in one transaction.
    ///
    /// Any failing link insert rolls back the blob too, so a blob never ends up
    /// with only part of its interests attached.
    async fn create(&self, blob: &Blob, interest_ids: &[Uuid]) -> DomainResult<()> {
        const OP: &str = "BlobRepository::create";
        let mut tx = self.pool.begin().await.map_err(store_err(OP))?;

        sqlx::query(queries::INSERT_BLOB)
            .bind(blob.id.to_string())
            .bind(&blob.user_id)
            .bind(&blob.content)
            .bind(blob.created_at)
            .bind(blob.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|err| match violation(&err) {
                Some(Violation::ForeignKey) => DomainError::NotFound("user", blob.user_id.clone()),
                _ => store(OP, err),
            })?;

        for interest_id in interest_ids {
            sqlx::query(queries::INSERT_BLOB_INTEREST)
                .bind(blob.id.to_string())
                .bind(interest_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|err| match violation(&err) {
                    Some(Violation::ForeignKey) => {
                        DomainError::NotFound("interest", interest_id.to_string())
                    }
                    _ => store(OP, err),
                })?;
        }

        // Dropping `tx` on an early return above rolls everything back.
        tx.commit().await.map_err(store_err(OP))?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<BlobAggregate>> {
        const OP: &str = "BlobRepository::find_by_id";
        let rows: Vec<BlobDetailRow> = sqlx::query_as(queries::BLOB_DETAIL)
            .bind(id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(store_err(OP))?;

        tracing::debug!(blob_id = %id, rows = rows.len(), "flattening blob detail");
        flatten_blob_detail(&rows).map_err(|e| e.into_domain(OP))
    }

    async fn exists(&self, id: Uuid) -> DomainResult<bool> {
        sqlx::query_scalar(queries::BLOB_EXISTS)
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(store_err("BlobRepository::exists"))
    }

    async fn count(&self) -> DomainResult<u64> {
        const OP: &str = "BlobRepository::count";
        let n: i64 = sqlx::query_scalar(queries::COUNT_BLOBS)
            .fetch_one(&self.pool)
            .await
            .map_err(store_err(OP))?;
        count(OP, n)
    }

    async fn list_page(&self, offset: i64, limit: i64) -> DomainResult<Vec<BlobSummary>> {
        const OP: &str = "BlobRepository::list_page";
        let rows: Vec<BlobListRow> = sqlx::query_as(queries::LIST_BLOBS_PAGE)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err(OP))?;

        fold_blob_list(&rows).map_err(|e| e.into_domain(OP))
    }

    async fn delete_owned(&self, id: Uuid, user_id: &str) -> DomainResult<u64> {
        let result = sqlx::query(queries::DELETE_OWNED_BLOB)
            .bind(id.to_string())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(store_err("BlobRepository::delete_owned"))?;
        Ok(result.rows_affected())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> DomainResult<u64> {
        let result = sqlx::query(queries::PURGE_BLOBS_BEFORE)
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(store_err("BlobRepository::purge_older_than"))?;
        Ok(result.rows_affected())
    }
}

#[derive(sqlx::FromRow)]
struct InterestRow {
    id: String,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub struct PgInterestRepo {
    pool: PgPool,
}

impl PgInterestRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InterestRepository for PgInterestRepo {
    async fn list_all(&self) -> DomainResult<Vec<Interest>> {
        const OP: &str = "InterestRepository::list_all";
        let rows: Vec<InterestRow> = sqlx::query_as(queries::LIST_INTERESTS)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err(OP))?;

        rows.into_iter()
            .map(|row| {
                Ok(Interest {
                    id: parse_uuid(OP, &row.id)?,
                    name: row.name,
                    description: row.description,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                })
            })
            .collect()
    }
}
