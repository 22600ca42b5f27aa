//! HTTP trigger.
//!
//! Routes:
//! - `GET|POST /` runs one sync; `200` with a one-line summary, `500` with
//!   the error text
//! - `GET /healthz` answers `ok`
//!
//! Scheduling is left to whatever calls the endpoint (Cloud Scheduler, cron).

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::SyncResult;
use crate::sync::SyncRunner;

/// Builds the trigger router around a shared runner.
pub fn router(runner: Arc<SyncRunner>) -> Router {
    Router::new()
        .route("/", get(run_sync).post(run_sync))
        .route("/healthz", get(healthz))
        .with_state(runner)
}

async fn run_sync(State(runner): State<Arc<SyncRunner>>) -> (StatusCode, String) {
    match runner.run().await {
        Ok(summary) => (
            StatusCode::OK,
            format!(
                "Successfully synced {} events to {}",
                summary.event_count, summary.url
            ),
        ),
        Err(e) => {
            error!(error = %e, "sync failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Sync failed: {}", e))
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

/// Serves the trigger on `bind` until Ctrl-C.
pub async fn serve(bind: &str, runner: SyncRunner) -> SyncResult<()> {
    let listener = TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "listening for sync triggers");

    axum::serve(listener, router(Arc::new(runner)))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutting down");
            }
        })
        .await?;
    Ok(())
}
