// ABOUTME: HTTP server binary for the VoxLoom turn service
// ABOUTME: Loads configuration, prepares the store, and serves the API until shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

#![recursion_limit = "256"]

//! # VoxLoom Server Binary
//!
//! Starts the message turn service with shared-secret authentication, a SQLite
//! conversation store, and a filesystem content store.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use voxloom_server::config::{DatabaseUrl, ServerConfig};
use voxloom_server::database::Database;
use voxloom_server::logging;
use voxloom_server::resources::ServerResources;
use voxloom_server::routes::build_router;

#[derive(Parser)]
#[command(name = "voxloom-server")]
#[command(about = "VoxLoom - voice and text customer support turn service")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,

    /// Override media directory
    #[arg(long)]
    media_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(url) = args.database_url {
        config.database.url = DatabaseUrl::parse_url(&url)?;
    }
    if let Some(media_dir) = args.media_dir {
        config.media.media_dir = media_dir.into();
    }
    config.validate()?;

    info!("Starting VoxLoom turn service");
    info!("{}", config.summary());

    let database = Database::new(&config.database)
        .await
        .context("Failed to open conversation store")?;
    if config.database.auto_migrate {
        database
            .migrate()
            .await
            .context("Failed to migrate conversation store")?;
        info!("Conversation store schema ready");
    }

    let config = Arc::new(config);
    let resources = Arc::new(
        ServerResources::from_config(database.clone(), Arc::clone(&config))
            .await
            .context("Failed to prepare content store")?,
    );
    let app = build_router(resources);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    database.close().await;
    info!("VoxLoom turn service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => tracing::warn!("Failed to listen for SIGTERM: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received, draining in-flight requests");
}
