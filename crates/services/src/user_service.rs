use std::sync::Arc;

use domains::{
    ActingUser, DomainError, DomainResult, User, UserRepository, UserUpdate, UserWithBlobs,
};
use tracing::{info, instrument};

use crate::authenticated;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Public profile with the user's blobs. `Ok(None)` for an unknown username.
    #[instrument(skip(self))]
    pub async fn profile_by_username(&self, username: &str) -> DomainResult<Option<UserWithBlobs>> {
        if username.trim().is_empty() {
            return Err(DomainError::validation("username must not be empty"));
        }
        self.users.find_by_username_with_blobs(username).await
    }

    /// The acting user's own record.
    pub async fn get(&self, actor: &ActingUser) -> DomainResult<User> {
        let user_id = authenticated(actor)?;
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("user", user_id.to_owned()))
    }

    /// Writes the non-blank fields of `update` to the acting user's profile.
    #[instrument(skip(self, actor, update), fields(user_id = %actor.id))]
    pub async fn update(&self, actor: &ActingUser, update: UserUpdate) -> DomainResult<()> {
        let user_id = authenticated(actor)?;
        let update = update.normalized();
        if update.is_empty() {
            return Err(DomainError::validation(
                "at least one profile field must be provided",
            ));
        }

        self.users.update(user_id, &actor.email, &update).await?;
        let email_changed = update.email.as_deref().is_some_and(|e| e != actor.email);
        info!(email_changed, "profile updated");
        Ok(())
    }
}
