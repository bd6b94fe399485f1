//! Daemon orchestration: bring up the context, bind the transport, spawn
//! every long-running task, then wait for shutdown. Grounded on the
//! project's `server::run` + `spawner::spawn_all` split.

pub mod metrics_server;
pub mod spawner;

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{reload, EnvFilter};

use crate::config::Config;
use crate::context::CoreContext;

pub type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

pub async fn run(config: Config, reload_handle: Arc<ReloadHandle>) -> Result<()> {
    let ctx = CoreContext::initialize(config)?;
    let _ = reload_handle;

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let handles = spawner::spawn_all(ctx.clone(), shutdown_tx.clone()).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    let _ = shutdown_tx.send(());

    for handle in handles {
        let _ = handle.await;
    }

    Ok(())
}
