//! Social network user accounts
//!
//! Registration with salted password hashing, profile updates and lookups
//! over PostgreSQL (or an in-memory store), exposed as a small HTTP API.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use sqlx::PgPool;

use api::state::AppState;
use infrastructure::logging::component_span;
use infrastructure::storage::StorageFactory;
use infrastructure::user::{Argon2Hasher, UserService};

/// Application state plus the resources that must be released on shutdown
pub struct Application {
    pub state: AppState,
    pub pool: Option<PgPool>,
}

/// Wire storage, hasher and service together from configuration
pub async fn create_application(config: &AppConfig) -> anyhow::Result<Application> {
    let storage = StorageFactory::user_storage(config).await?;

    let user_service = UserService::new(
        storage.repository,
        Arc::new(Argon2Hasher::new()?),
        component_span("user_service"),
    );

    Ok(Application {
        state: AppState::new(Arc::new(user_service)),
        pool: storage.pool,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;

    #[tokio::test]
    async fn test_in_memory_application_round_trip() {
        let mut config = AppConfig::default();
        config.storage.backend = "memory".to_string();

        let app = create_application(&config).await.unwrap();
        assert!(app.pool.is_none());

        let service = &app.state.user_service;
        let created = service
            .register_user(User::new("rostikts", "rostik", "Tsyapiura", "rostik@test.ua", "123245"))
            .await
            .unwrap();

        let fetched = service.get_user_by_id(created.id).await.unwrap();
        assert_eq!(fetched.username, "rostikts");
        assert!(fetched.password.is_empty());
    }
}
