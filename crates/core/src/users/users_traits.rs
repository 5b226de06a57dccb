use async_trait::async_trait;

use super::users_model::{NewUser, User};
use crate::errors::Result;

/// Persistence contract for users.
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn create(&self, new_user: NewUser) -> Result<User>;

    /// Returns `None` when no user has this id.
    fn get_by_id(&self, user_id: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait UserServiceTrait: Send + Sync {
    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    /// Fails with `UserNotFound` when the id is unknown.
    fn get_user(&self, user_id: &str) -> Result<User>;
}
