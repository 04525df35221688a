// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tetherd: background mirror daemon.
//!
//! Drains the durable sync outbox, pushing issue, milestone, and comment
//! changes to the external tracker bound to each project. The daemon owns
//! no mutations of its own; producers enqueue jobs through `SyncManager`
//! and tetherd replays them with retry.

use std::path::PathBuf;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use tether::{SyncConfig, SyncWorker};
use tether_core::{Database, TokenCipher};

/// Environment variable carrying the token encryption key.
const TOKEN_KEY_ENV: &str = "TETHER_TOKEN_KEY";

/// tetherd: external tracker mirror daemon
#[derive(Parser, Debug)]
#[command(name = "tetherd")]
#[command(about = "Background worker that mirrors tracked entities to an external tracker")]
struct Args {
    /// Path to the SQLite database
    #[arg(short, long)]
    db: PathBuf,

    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => SyncConfig::load(path)?,
        None => SyncConfig::default(),
    };

    let key = std::env::var(TOKEN_KEY_ENV)
        .map_err(|_| format!("{TOKEN_KEY_ENV} must be set to decrypt stored tokens"))?;
    let cipher = TokenCipher::new(&key);

    info!("Starting tetherd");
    info!("  Database: {}", args.db.display());
    info!("  Tracker API: {}", config.api_base);

    let db = Database::open(&args.db)?;
    let factory = tether::tracker::RestFactory::new(
        config.api_base.clone(),
        cipher,
        config.http_timeout(),
    );
    let worker = SyncWorker::new(db, factory, &config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for shutdown signal");
            return;
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    worker.run(shutdown_rx).await;
    info!("tetherd stopped");
    Ok(())
}
