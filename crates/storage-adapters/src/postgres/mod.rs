//! # PostgreSQL adapters
//!
//! Implements the `domains` ports on top of a shared `sqlx::PgPool`. Ids are
//! stored as `VARCHAR` and bound as strings; join results are reshaped by
//! `crate::flatten`.

mod blob_repo;
mod comment_repo;
mod error;
mod like_repo;
mod queries;
mod session_repo;
mod user_repo;

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

pub use blob_repo::{PgBlobRepo, PgInterestRepo};
pub use comment_repo::PgCommentRepo;
pub use like_repo::PgLikeRepo;
pub use session_repo::PgSessionRepo;
pub use user_repo::PgUserRepo;

/// Pool sizing, filled in by the binary from its settings.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Opens the process-wide pool. Connections are acquired per query and
/// returned as soon as the statement (or transaction) finishes.
pub async fn connect(url: &str, settings: &PoolSettings) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect(url)
        .await?;
    tracing::info!(
        max_connections = settings.max_connections,
        "postgres pool ready"
    );
    Ok(pool)
}

/// Applies the embedded schema migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("schema migrations applied");
    Ok(())
}
