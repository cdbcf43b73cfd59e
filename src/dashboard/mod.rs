// src/dashboard/mod.rs

//! Optional HTTP monitoring surface.
//!
//! A thin layer over [`WorkerRegistry`]: it lists workers with their stats,
//! shows one worker, and forwards "restart now" requests. It holds no state
//! of its own beyond the registry handle.
//!
//! - [`routes`] builds the axum router and its handlers.
//! - [`assets`] holds the embedded HTML/CSS/JS.

pub mod assets;
pub mod routes;

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::DashboardSettings;
use crate::errors::{RespawnError, Result};
use crate::supervisor::WorkerRegistry;

pub use routes::router;

/// How long [`DashboardHandle::stop`] waits for in-flight requests.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// A running dashboard server.
#[derive(Debug)]
pub struct DashboardHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    server: JoinHandle<std::io::Result<()>>,
}

impl DashboardHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait (bounded) for the server to
    /// drain. The server task is aborted if it does not finish in time.
    pub async fn stop(self) -> Result<()> {
        self.shutdown.cancel();

        let abort = self.server.abort_handle();
        match timeout(STOP_TIMEOUT, self.server).await {
            Ok(Ok(Ok(()))) => {
                info!("dashboard stopped");
                Ok(())
            }
            Ok(Ok(Err(err))) => Err(RespawnError::Dashboard(format!("server error: {err}"))),
            Ok(Err(join_err)) => Err(RespawnError::Dashboard(format!(
                "server task failed: {join_err}"
            ))),
            Err(_) => {
                warn!(timeout = ?STOP_TIMEOUT, "dashboard did not stop in time; aborting");
                abort.abort();
                Err(RespawnError::Dashboard(
                    "timed out waiting for dashboard to stop".to_string(),
                ))
            }
        }
    }
}

/// Bind the dashboard and serve it in the background.
pub async fn spawn_dashboard(
    settings: &DashboardSettings,
    registry: WorkerRegistry,
) -> Result<DashboardHandle> {
    let addr = settings.bind_addr();
    let listener = TcpListener::bind(addr.as_str())
        .await
        .map_err(|e| RespawnError::Dashboard(format!("binding {addr}: {e}")))?;
    let local_addr = listener.local_addr()?;

    let shutdown = CancellationToken::new();
    let app = router(registry);

    let server = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
        })
    };

    info!(url = %format!("http://{local_addr}"), "dashboard started");

    Ok(DashboardHandle {
        local_addr,
        shutdown,
        server,
    })
}
