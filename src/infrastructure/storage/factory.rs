//! Storage factory for runtime storage selection

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::{DomainError, UserRepository};
use crate::infrastructure::logging::component_span;
use crate::infrastructure::user::{InMemoryUserRepository, PostgresUserRepository};

use super::migrations::{Migrator, PostgresMigrator};

/// Supported storage types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// User store chosen at startup. `pool` is set for PostgreSQL so it can be closed on shutdown.
pub struct UserStorage {
    pub repository: Arc<dyn UserRepository>,
    pub pool: Option<PgPool>,
}

/// Factory for creating storage instances
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Builds the configured user repository, applying pending migrations for PostgreSQL
    pub async fn user_storage(config: &AppConfig) -> Result<UserStorage, DomainError> {
        let backend = StorageType::from_str(&config.storage.backend).ok_or_else(|| {
            DomainError::configuration(format!(
                "Unknown storage backend '{}'",
                config.storage.backend
            ))
        })?;

        match backend {
            StorageType::InMemory => {
                info!("Using in-memory user storage");
                Ok(Self::in_memory())
            }
            StorageType::Postgres => {
                let pool = config.database.postgres().connect().await?;
                PostgresMigrator::new(pool.clone()).run().await?;

                info!(
                    host = %config.database.host,
                    database = %config.database.name,
                    "Using PostgreSQL user storage"
                );

                let repository = PostgresUserRepository::new(
                    pool.clone(),
                    config.database.statement_timeout(),
                    component_span("user_repository"),
                );

                Ok(UserStorage {
                    repository: Arc::new(repository),
                    pool: Some(pool),
                })
            }
        }
    }

    /// Creates an in-memory user store
    pub fn in_memory() -> UserStorage {
        UserStorage {
            repository: Arc::new(InMemoryUserRepository::new()),
            pool: None,
        }
    }
}
