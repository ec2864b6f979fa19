//! # integration-tests
//!
//! Shared fixtures for the end-to-end tests: an in-memory store that speaks the
//! same join-row language as the SQL adapter, and helpers that wire it into the
//! services (and, with `web-axum`, the router).

pub mod memory_store;

use std::sync::Arc;

use domains::ActingUser;
use services::{BlobService, CommentService, LikeService, UserService};

pub use memory_store::MemoryStore;

/// Every service, wired to one shared store.
pub struct Services {
    pub store: Arc<MemoryStore>,
    pub blobs: BlobService,
    pub comments: CommentService,
    pub likes: LikeService,
    pub users: UserService,
}

impl Services {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            blobs: BlobService::new(store.clone(), store.clone()),
            comments: CommentService::new(store.clone(), store.clone()),
            likes: LikeService::new(store.clone(), store.clone()),
            users: UserService::new(store.clone()),
            store,
        }
    }

    /// Seeds a user and returns them as an acting identity.
    pub fn user(&self, id: &str) -> ActingUser {
        let user = self.store.add_user(id, id);
        ActingUser {
            id: user.id,
            email: user.email.unwrap_or_default(),
        }
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "web-axum")]
pub mod http {
    use std::sync::Arc;

    use api_adapters::{router, AppState, HttpMetrics};
    use auth_adapters::SessionIdentityResolver;
    use axum::Router;

    use super::Services;

    /// The full router over the in-memory store, authenticating against its sessions.
    pub fn app(services: &Services) -> Router {
        let state = AppState {
            blobs: services.blobs.clone(),
            comments: services.comments.clone(),
            likes: services.likes.clone(),
            users: services.users.clone(),
            identity: Arc::new(SessionIdentityResolver::new(services.store.clone())),
            metrics: Arc::new(HttpMetrics::new()),
        };
        router(state, &[])
    }
}
