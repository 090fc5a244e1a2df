//! Command line interface
//!
//! - `serve`: run the HTTP API (default backend: PostgreSQL, migrated on start)
//! - `migrate`: apply, revert or inspect the database schema

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// Social network user account service
#[derive(Parser)]
#[command(name = "social-network")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Manage the database schema
    Migrate {
        #[command(subcommand)]
        action: migrate::MigrateAction,
    },
}
