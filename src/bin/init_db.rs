// ABOUTME: Database bootstrap binary that creates the conversation store schema
// ABOUTME: Runs the idempotent migrations and exits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

//! # Database Bootstrap
//!
//! ```bash
//! DATABASE_URL=sqlite:./data/voxloom.db cargo run --bin voxloom-init-db
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use voxloom_server::config::{DatabaseConfig, DatabaseUrl};
use voxloom_server::database::Database;
use voxloom_server::logging;

#[derive(Parser)]
#[command(name = "voxloom-init-db")]
#[command(about = "Create or upgrade the VoxLoom conversation store schema")]
pub struct Args {
    /// Database URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./data/voxloom.db")]
    database_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_from_env()?;

    let config = DatabaseConfig {
        url: DatabaseUrl::parse_url(&args.database_url)?,
        ..DatabaseConfig::default()
    };
    let database = Database::new(&config)
        .await
        .context("Failed to open conversation store")?;
    database
        .migrate()
        .await
        .context("Failed to migrate conversation store")?;
    database.close().await;

    info!(
        "Conversation store initialized at {}",
        config.url.to_connection_string()
    );
    Ok(())
}
