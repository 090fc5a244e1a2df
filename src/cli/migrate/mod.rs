//! Migrate command - manages the PostgreSQL schema

use clap::Subcommand;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::storage::{Migrator, PostgresMigrator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Revert the latest applied migration
    Down,
    /// List migrations and whether each is applied
    Status,
}

pub async fn run(action: MigrateAction) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    let pool = config.database.postgres().connect().await?;
    let migrator = PostgresMigrator::new(pool.clone());

    match action {
        MigrateAction::Up => {
            migrator.run().await?;
            info!(version = ?migrator.version().await?, "Schema is up to date");
        }
        MigrateAction::Down => {
            migrator.revert().await?;
            info!(version = ?migrator.version().await?, "Reverted latest migration");
        }
        MigrateAction::Status => {
            for (migration, applied) in migrator.status().await? {
                let state = if applied { "applied" } else { "pending" };
                println!("{:>4}  {:<8} {}", migration.version, state, migration.description);
            }
        }
    }

    pool.close().await;
    Ok(())
}
