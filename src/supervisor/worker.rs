// src/supervisor/worker.rs

//! Supervision worker: keeps one command alive.
//!
//! A worker owns a single [`CommandSpec`] and runs one restart loop. The loop
//! is a `tokio::select!` over four signals:
//!
//! - the shared shutdown token fired (terminate the child, exit for good),
//! - a restart request arrived (terminate the child, relaunch on schedule),
//! - the child exited (record the outcome, re-arm the launch timer),
//! - the launch timer elapsed while nothing is running (launch once).
//!
//! Launches never overlap: the timer branch is only armed when no child is
//! held. The live `Child` stays on the loop's stack; other call paths only
//! see a [`ProcessHandle`] descriptor behind a reader/writer lock that the
//! loop alone writes.

use std::io;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::WorkerSettings;
use crate::errors::Result;
use crate::exec::{CommandSpec, Terminator};
use crate::supervisor::backoff::Backoff;
use crate::supervisor::stats::{StatsSnapshot, WorkerStats};
use crate::types::WorkerStatus;

/// Grace period cap for interactive shell hosts.
pub const INTERACTIVE_SHELL_GRACE: Duration = Duration::from_secs(2);
/// How long to wait for a force-stopped process to be reaped.
pub const KILL_SETTLE_TIMEOUT: Duration = Duration::from_millis(500);
/// Shortest launch interval, so a zero restart delay cannot spin.
const MIN_LAUNCH_INTERVAL: Duration = Duration::from_millis(10);
const RESTART_QUEUE_CAPACITY: usize = 4;

/// What outside observers can see of the live process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessHandle {
    pub pid: Option<u32>,
}

/// Why a worker's loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The shutdown token fired and the child (if any) was stopped.
    Shutdown,
    /// Too many consecutive launch failures; the worker stopped retrying.
    GaveUp { launch_failures: u32 },
    /// `run` was called on a worker whose loop had already been started.
    AlreadyStarted,
}

/// Result of [`Worker::request_restart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    /// The running process was stopped; the worker relaunches it.
    Restarted,
    /// Nothing was running at the time of the request.
    NotRunning,
    /// The worker's loop is no longer running.
    WorkerStopped,
}

struct RestartRequest {
    done: oneshot::Sender<RestartOutcome>,
}

pub struct Worker {
    id: String,
    command: CommandSpec,
    settings: WorkerSettings,
    terminator: Arc<dyn Terminator>,
    current: RwLock<Option<ProcessHandle>>,
    stats: RwLock<WorkerStats>,
    restart_tx: mpsc::Sender<RestartRequest>,
    restart_rx: Mutex<Option<mpsc::Receiver<RestartRequest>>>,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("command", &self.command.raw())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Worker {
    /// Create a worker for `raw`. Fails only if the command line is empty.
    pub fn new(
        id: impl Into<String>,
        raw: &str,
        settings: WorkerSettings,
        terminator: Arc<dyn Terminator>,
    ) -> Result<Self> {
        let command = CommandSpec::parse(raw)?;
        let (restart_tx, restart_rx) = mpsc::channel(RESTART_QUEUE_CAPACITY);

        Ok(Self {
            id: id.into(),
            command,
            settings,
            terminator,
            current: RwLock::new(None),
            stats: RwLock::new(WorkerStats::new(settings.restart_delay)),
            restart_tx,
            restart_rx: Mutex::new(Some(restart_rx)),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn command(&self) -> &CommandSpec {
        &self.command
    }

    /// Copy of the current stats, with uptime computed at read time.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.read().snapshot()
    }

    pub fn status(&self) -> WorkerStatus {
        self.stats.read().status()
    }

    /// The live process, if any.
    pub fn current_process(&self) -> Option<ProcessHandle> {
        *self.current.read()
    }

    /// Ask the worker to stop its running process and start it again.
    ///
    /// Waits until the termination sequence has finished. The relaunch
    /// follows the normal restart delay.
    pub async fn request_restart(&self) -> RestartOutcome {
        let running = self.current.read().is_some();
        if !running {
            return RestartOutcome::NotRunning;
        }

        let (done_tx, done_rx) = oneshot::channel();
        if self
            .restart_tx
            .send(RestartRequest { done: done_tx })
            .await
            .is_err()
        {
            return RestartOutcome::WorkerStopped;
        }

        done_rx.await.unwrap_or(RestartOutcome::WorkerStopped)
    }

    /// Run the restart loop until `shutdown` fires or the launch-failure
    /// ceiling is reached.
    pub async fn run(&self, shutdown: CancellationToken) -> WorkerExit {
        let Some(mut restart_rx) = self.restart_rx.lock().take() else {
            warn!(process = %self.command, "worker loop already started");
            return WorkerExit::AlreadyStarted;
        };

        let mut backoff = Backoff::new(self.settings.restart_delay, self.settings.backoff_enabled);
        let mut child: Option<Child> = None;
        let mut next_launch = Instant::now() + launch_interval(backoff.current());

        debug!(process = %self.command, "worker loop started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!(process = %self.command, "shutdown requested");
                    if let Some(mut proc) = child.take() {
                        match self.terminate(&mut proc).await {
                            Some(status) => self.record_exit(status),
                            None => self.clear_process(),
                        }
                    }
                    return WorkerExit::Shutdown;
                }

                Some(request) = restart_rx.recv() => {
                    let outcome = match child.take() {
                        Some(mut proc) => {
                            info!(process = %self.command, "restart requested");
                            let outcome = match self.terminate(&mut proc).await {
                                Some(status) => {
                                    self.record_exit(status);
                                    RestartOutcome::NotRunning
                                }
                                None => {
                                    self.clear_process();
                                    RestartOutcome::Restarted
                                }
                            };
                            next_launch = Instant::now() + launch_interval(backoff.current());
                            outcome
                        }
                        None => RestartOutcome::NotRunning,
                    };
                    let _ = request.done.send(outcome);
                }

                status = wait_for_exit(&mut child) => {
                    child = None;
                    self.record_exit(status);
                    next_launch = Instant::now() + launch_interval(backoff.current());
                }

                _ = sleep_until(next_launch), if child.is_none() => {
                    if backoff.ceiling_reached(self.settings.max_retries) {
                        error!(
                            process = %self.command,
                            failures = backoff.failures(),
                            "max launch failures exceeded; giving up"
                        );
                        return WorkerExit::GaveUp {
                            launch_failures: backoff.failures(),
                        };
                    }

                    child = self.launch(&mut backoff);
                    next_launch = Instant::now() + launch_interval(backoff.current());
                }
            }
        }
    }

    /// One launch attempt: `Starting`, then `Running` or `Failed`.
    fn launch(&self, backoff: &mut Backoff) -> Option<Child> {
        self.stats.write().mark_starting();
        info!(process = %self.command, "starting process");

        match self.command.spawn() {
            Ok(child) => {
                let pid = child.id();
                *self.current.write() = Some(ProcessHandle { pid });

                let cleared = backoff.record_launch_success();
                if cleared > 0 {
                    info!(
                        process = %self.command,
                        previous_failures = cleared,
                        "process failure state reset"
                    );
                }
                self.stats.write().mark_running(pid, backoff.current());

                info!(process = %self.command, pid, "process started");
                Some(child)
            }
            Err(err) => {
                let interval = backoff.record_launch_failure();
                self.stats
                    .write()
                    .mark_launch_failed(backoff.failures(), interval);

                if backoff.is_enabled() {
                    warn!(
                        process = %self.command,
                        error = %err,
                        failure_count = backoff.failures(),
                        backoff = ?interval,
                        "process start failed; backing off"
                    );
                } else {
                    warn!(
                        process = %self.command,
                        error = %err,
                        failure_count = backoff.failures(),
                        "process start failed"
                    );
                }
                None
            }
        }
    }

    fn record_exit(&self, status: io::Result<ExitStatus>) {
        *self.current.write() = None;

        match status {
            Ok(status) if status.success() => {
                self.stats.write().mark_exited(true);
                info!(process = %self.command, "process exited normally");
            }
            Ok(status) => {
                self.stats.write().mark_exited(false);
                info!(
                    process = %self.command,
                    exit_code = status.code(),
                    status = %status,
                    "process exited with error"
                );
            }
            Err(err) => {
                self.stats.write().mark_exited(false);
                warn!(process = %self.command, error = %err, "failed to wait for process");
            }
        }
    }

    fn clear_process(&self) {
        *self.current.write() = None;
        self.stats.write().mark_stopped();
    }

    /// Grace period for this command; interactive shells get a shorter one.
    pub fn grace_period(&self) -> Duration {
        if self.command.is_interactive_shell() {
            self.settings.grace_period.min(INTERACTIVE_SHELL_GRACE)
        } else {
            self.settings.grace_period
        }
    }

    /// Stop `child`: graceful request, bounded wait, then force-stop.
    ///
    /// Returns the exit status when the child had already exited before the
    /// sequence began, so the caller can record it like any other exit.
    async fn terminate(&self, child: &mut Child) -> Option<io::Result<ExitStatus>> {
        match child.try_wait() {
            Ok(None) => {}
            Ok(Some(status)) => {
                debug!(process = %self.command, status = %status, "process already exited; nothing to terminate");
                return Some(Ok(status));
            }
            Err(err) => return Some(Err(err)),
        }

        let pid = child.id();
        let grace = self.grace_period();
        info!(process = %self.command, pid, "terminating process");

        if self.command.is_interactive_shell() {
            debug!(
                process = %self.command,
                grace_period = ?grace,
                "interactive shell host; force-stopping immediately"
            );
            self.terminator.force_stop(child, &self.command).await;
            self.reap(child, grace).await;
            return None;
        }

        if let Err(err) = self.terminator.request_graceful_stop(child, &self.command) {
            warn!(
                process = %self.command,
                error = %err,
                "failed to send termination signal; force-stopping"
            );
            self.terminator.force_stop(child, &self.command).await;
            self.reap(child, KILL_SETTLE_TIMEOUT).await;
            return None;
        }

        // The wait runs inside the timeout, so the grace timer is never
        // blocked by it.
        match timeout(grace, child.wait()).await {
            Ok(Ok(status)) => {
                info!(process = %self.command, status = %status, "process gracefully terminated");
            }
            Ok(Err(err)) => {
                info!(process = %self.command, error = %err, "process terminated with error");
            }
            Err(_) => {
                warn!(
                    process = %self.command,
                    pid,
                    timeout = ?grace,
                    "force killing process after timeout"
                );
                self.terminator.force_stop(child, &self.command).await;
                self.reap(child, KILL_SETTLE_TIMEOUT).await;
                info!(process = %self.command, "process force killed");
            }
        }
        None
    }

    /// Give a force-stopped process a short window to be reaped.
    async fn reap(&self, child: &mut Child, within: Duration) {
        match timeout(within, child.wait()).await {
            Ok(Ok(status)) => {
                debug!(process = %self.command, status = %status, "process reaped");
            }
            Ok(Err(err)) => {
                warn!(process = %self.command, error = %err, "failed to reap process");
            }
            Err(_) if self.terminator.is_running(child) => {
                warn!(
                    process = %self.command,
                    waited = ?within,
                    "process still running after force-stop"
                );
            }
            Err(_) => {
                debug!(process = %self.command, "process reaped after settle timeout");
            }
        }
    }
}

async fn wait_for_exit(child: &mut Option<Child>) -> io::Result<ExitStatus> {
    match child {
        Some(child) => child.wait().await,
        None => std::future::pending().await,
    }
}

fn launch_interval(interval: Duration) -> Duration {
    interval.max(MIN_LAUNCH_INTERVAL)
}
