//! # services
//!
//! Use cases of the blob backend. Each service owns `Arc`s of the ports it needs and
//! takes the acting user as an explicit argument on every mutating call.

pub mod blob_service;
pub mod comment_service;
pub mod like_service;
pub mod user_service;

pub use blob_service::BlobService;
pub use comment_service::CommentService;
pub use like_service::LikeService;
pub use user_service::UserService;

use domains::{ActingUser, DomainError, DomainResult};

/// Rejects an acting user whose identity did not resolve to a user id.
pub(crate) fn authenticated(actor: &ActingUser) -> DomainResult<&str> {
    let id = actor.id.trim();
    if id.is_empty() {
        return Err(DomainError::Authentication(
            "acting user has no resolvable identity".into(),
        ));
    }
    Ok(id)
}

/// Content bodies must contain something other than whitespace.
pub(crate) fn non_blank(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use domains::ActingUser;

    pub fn actor(id: &str) -> ActingUser {
        ActingUser {
            id: id.into(),
            email: format!("{id}@example.com"),
        }
    }
}
