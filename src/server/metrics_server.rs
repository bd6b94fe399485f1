//! Opt-in Prometheus HTTP endpoint, grounded on the project's axum-based
//! metrics server.

use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use tokio::sync::broadcast;

use crate::context::CoreContext;

async fn metrics_handler(State(ctx): State<Arc<CoreContext>>) -> String {
    ctx.metrics.render()
}

pub async fn run(ctx: Arc<CoreContext>, mut shutdown: broadcast::Receiver<()>) -> anyhow::Result<()> {
    let port = ctx.config.metrics.port;
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(ctx);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;
    Ok(())
}
