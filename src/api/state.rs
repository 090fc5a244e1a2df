//! Application state for shared services

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{User, UserId, UserRepository, UserServiceError};
use crate::infrastructure::user::{PasswordHasher, UserService};

#[cfg(test)]
use mockall::automock;

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServiceTrait>,
}

impl AppState {
    pub fn new(user_service: Arc<dyn UserServiceTrait>) -> Self {
        Self { user_service }
    }
}

/// Trait for user service operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserServiceTrait: Send + Sync {
    async fn register_user(&self, user: User) -> Result<User, UserServiceError>;
    async fn update_user_data(&self, user: User) -> Result<User, UserServiceError>;
    async fn change_password(&self, user: &User) -> Result<(), UserServiceError>;
    async fn get_user_by_id(&self, id: UserId) -> Result<User, UserServiceError>;
    async fn get_all_users(&self) -> Result<Vec<User>, UserServiceError>;
}

#[async_trait]
impl<R, H> UserServiceTrait for UserService<R, H>
where
    R: UserRepository + ?Sized + 'static,
    H: PasswordHasher + 'static,
{
    async fn register_user(&self, user: User) -> Result<User, UserServiceError> {
        UserService::register_user(self, user).await
    }

    async fn update_user_data(&self, user: User) -> Result<User, UserServiceError> {
        UserService::update_user_data(self, user).await
    }

    async fn change_password(&self, user: &User) -> Result<(), UserServiceError> {
        UserService::change_password(self, user).await
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<User, UserServiceError> {
        UserService::get_user_by_id(self, id).await
    }

    async fn get_all_users(&self) -> Result<Vec<User>, UserServiceError> {
        UserService::get_all_users(self).await
    }
}
