// src/supervisor/core.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::WorkerSettings;
use crate::errors::{RespawnError, Result};
use crate::exec::{platform_terminator, Terminator};
use crate::supervisor::registry::WorkerRegistry;
use crate::supervisor::worker::{Worker, WorkerExit};

/// Added to the grace period when computing the shutdown deadline, so a
/// zero or tiny grace period still leaves room for the force-stop path.
pub const SHUTDOWN_MARGIN: Duration = Duration::from_secs(1);

/// Owns the fixed set of workers and the one shutdown token they share.
pub struct Supervisor {
    workers: Vec<Arc<Worker>>,
    settings: WorkerSettings,
    shutdown: CancellationToken,
    tasks: JoinSet<(String, WorkerExit)>,
    started: bool,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("workers", &self.workers.len())
            .field("settings", &self.settings)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

/// What happened during [`Supervisor::shutdown`].
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    /// Workers that finished before the deadline, with how they ended.
    pub exits: Vec<(String, WorkerExit)>,
    /// Whether the deadline elapsed with workers still running.
    pub timed_out: bool,
    pub deadline: Duration,
}

impl Supervisor {
    /// Build one worker per command using the platform terminator.
    pub fn new(commands: &[String], settings: WorkerSettings) -> Result<Self> {
        Self::with_terminator(commands, settings, platform_terminator())
    }

    /// Build one worker per command. Commands that cannot become a worker
    /// are logged and skipped; it is an error only if none are left.
    pub fn with_terminator(
        commands: &[String],
        settings: WorkerSettings,
        terminator: Arc<dyn Terminator>,
    ) -> Result<Self> {
        let mut workers = Vec::with_capacity(commands.len());

        for (idx, cmd) in commands.iter().enumerate() {
            let id = format!("process_{idx}");
            match Worker::new(id.as_str(), cmd, settings, Arc::clone(&terminator)) {
                Ok(worker) => workers.push(Arc::new(worker)),
                Err(err) => {
                    error!(cmd = %cmd, process_id = %id, error = %err, "failed to create worker");
                }
            }
        }

        if workers.is_empty() {
            return Err(RespawnError::NoValidWorkers);
        }

        Ok(Self {
            workers,
            settings,
            shutdown: CancellationToken::new(),
            tasks: JoinSet::new(),
            started: false,
        })
    }

    pub fn workers(&self) -> &[Arc<Worker>] {
        &self.workers
    }

    pub fn registry(&self) -> WorkerRegistry {
        WorkerRegistry::new(self.workers.iter().cloned())
    }

    /// Token that, once cancelled, stops every worker. Cancelling it does
    /// not wait; use [`Supervisor::shutdown`] for the bounded wait.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Bound on how long [`Supervisor::shutdown`] waits for workers.
    pub fn shutdown_deadline(&self) -> Duration {
        let grace = self.settings.grace_period;
        grace
            .saturating_mul(2)
            .max(grace.saturating_add(SHUTDOWN_MARGIN))
    }

    /// Spawn one task per worker. Calling this again is a no-op.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        for worker in &self.workers {
            let worker = Arc::clone(worker);
            let token = self.shutdown.clone();
            let span = info_span!("worker", id = %worker.id());

            self.tasks.spawn(
                async move {
                    let exit = worker.run(token).await;
                    (worker.id().to_string(), exit)
                }
                .instrument(span),
            );
        }

        info!(count = self.workers.len(), "workers started");
    }

    /// Broadcast shutdown to every worker and wait for them, bounded by
    /// [`Supervisor::shutdown_deadline`]. Workers still running at the
    /// deadline are abandoned with a warning.
    pub async fn shutdown(mut self) -> ShutdownReport {
        info!("initiating graceful shutdown");
        self.shutdown.cancel();

        let deadline = self.shutdown_deadline();
        let mut exits = Vec::with_capacity(self.workers.len());
        let tasks = &mut self.tasks;

        let drained = timeout(deadline, async {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(exit) => exits.push(exit),
                    Err(err) => warn!(error = %err, "worker task ended abnormally"),
                }
            }
        })
        .await;

        let timed_out = drained.is_err();
        if timed_out {
            warn!(
                timeout = ?deadline,
                remaining = self.tasks.len(),
                "shutdown timeout exceeded"
            );
            self.tasks.abort_all();
        } else {
            info!("all processes shut down gracefully");
        }

        for worker in &self.workers {
            debug!(process_id = %worker.id(), status = %worker.status(), "final worker state");
        }

        ShutdownReport {
            exits,
            timed_out,
            deadline,
        }
    }
}
