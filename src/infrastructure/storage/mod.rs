//! Storage infrastructure - PostgreSQL pooling, migrations and backend selection

mod factory;
pub mod migrations;
mod postgres;

pub use factory::{StorageFactory, StorageType, UserStorage};
pub use migrations::{user_migrations, Migration, Migrator, PostgresMigrator};
pub use postgres::{apply_statement_timeout, PostgresConfig};
