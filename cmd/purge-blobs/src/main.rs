//! # purge-blobs
//!
//! One-shot retention job: deletes every blob older than `purge.retention_hours`.
//! Comments, likes and interest links go with it through the schema's cascades.
//! Meant to be run from cron or a scheduled container.

use std::sync::Arc;

use anyhow::Context;
use configs::Settings;
use secrecy::ExposeSecret;
use services::BlobService;
use storage_adapters::postgres::{connect, PgBlobRepo, PgInterestRepo, PoolSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    configs::telemetry::init(&settings.log).context("installing tracing subscriber")?;

    let pool = connect(
        settings.database.url.expose_secret(),
        &PoolSettings {
            max_connections: 1,
            min_connections: 0,
            acquire_timeout: settings.database.acquire_timeout(),
        },
    )
    .await
    .context("connecting to postgres")?;

    let service = BlobService::new(
        Arc::new(PgBlobRepo::new(pool.clone())),
        Arc::new(PgInterestRepo::new(pool.clone())),
    );
    let retention = chrono::Duration::from_std(settings.purge.retention())
        .context("retention out of range")?;
    let removed = service
        .purge_older_than(retention)
        .await
        .context("purging old blobs")?;

    pool.close().await;
    tracing::info!(removed, "purge finished");
    Ok(())
}
