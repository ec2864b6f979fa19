//! # blob-server
//!
//! Assembles the HTTP service: settings → tracing → pool → repositories →
//! services → router.

#[cfg(not(all(feature = "web-axum", feature = "db-postgres")))]
compile_error!("blob-server needs the `web-axum` and `db-postgres` features");

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState, HttpMetrics};
use auth_adapters::SessionIdentityResolver;
use configs::Settings;
use secrecy::ExposeSecret;
use services::{BlobService, CommentService, LikeService, UserService};
use storage_adapters::postgres::{
    connect, migrate, PgBlobRepo, PgCommentRepo, PgInterestRepo, PgLikeRepo, PgSessionRepo,
    PgUserRepo, PoolSettings,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    configs::telemetry::init(&settings.log).context("installing tracing subscriber")?;

    let pool = connect(
        settings.database.url.expose_secret(),
        &PoolSettings {
            max_connections: settings.database.max_connections,
            min_connections: settings.database.min_connections,
            acquire_timeout: settings.database.acquire_timeout(),
        },
    )
    .await
    .context("connecting to postgres")?;

    if settings.database.run_migrations {
        migrate(&pool).await.context("running migrations")?;
    }

    let blobs = Arc::new(PgBlobRepo::new(pool.clone()));
    let state = AppState {
        blobs: BlobService::new(blobs.clone(), Arc::new(PgInterestRepo::new(pool.clone()))),
        comments: CommentService::new(Arc::new(PgCommentRepo::new(pool.clone())), blobs.clone()),
        likes: LikeService::new(Arc::new(PgLikeRepo::new(pool.clone())), blobs),
        users: UserService::new(Arc::new(PgUserRepo::new(pool.clone()))),
        identity: Arc::new(SessionIdentityResolver::new(Arc::new(PgSessionRepo::new(
            pool.clone(),
        )))),
        metrics: Arc::new(HttpMetrics::new()),
    };

    let app = router(state, &settings.server.cors_origins);
    let addr = settings.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "blob-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;

    pool.close().await;
    tracing::info!("blob-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
