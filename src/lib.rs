// src/lib.rs

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod supervisor;
pub mod types;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::cli::CliArgs;
use crate::config::{load_commands, validate_settings};
use crate::dashboard::spawn_dashboard;
use crate::errors::RespawnError;
use crate::supervisor::Supervisor;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings validation
/// - command file loading
/// - the supervisor and its workers
/// - (optional) the web dashboard
/// - SIGINT / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    let settings = args.settings();
    validate_settings(&settings).context("invalid configuration")?;

    let commands = load_commands(&args.file)
        .with_context(|| format!("failed to load commands from {}", args.file))?;

    if commands.is_empty() {
        warn!(file = %args.file, "no commands found");
        println!(
            "No commands found in {}. Please add commands to monitor.",
            args.file
        );
        return Ok(());
    }

    info!(
        commands = commands.len(),
        grace = ?settings.grace_period,
        restart_delay = ?settings.restart_delay,
        max_retries = settings.max_retries,
        backoff = settings.backoff_enabled,
        "starting supervisor"
    );

    let mut supervisor = match Supervisor::new(&commands, settings.worker()) {
        Ok(supervisor) => supervisor,
        Err(err @ RespawnError::NoValidWorkers) => {
            eprintln!("No valid processes could be started. Please check your commands.");
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };
    supervisor.start();

    let dashboard = if settings.dashboard.enabled {
        match spawn_dashboard(&settings.dashboard, supervisor.registry()).await {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!(error = %err, "web server error");
                None
            }
        }
    } else {
        None
    };

    wait_for_shutdown_signal().await;

    if let Some(handle) = dashboard {
        if let Err(err) = handle.stop().await {
            warn!(error = %err, "web server shutdown error");
        }
    }

    let report = supervisor.shutdown().await;
    if report.timed_out {
        warn!(
            finished = report.exits.len(),
            deadline = ?report.deadline,
            "some processes did not stop before the deadline"
        );
    }

    info!("shutdown complete");
    Ok(())
}

/// Resolve on the first SIGINT or SIGTERM (Ctrl-C on non-unix targets).
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (
            signal(SignalKind::interrupt()),
            signal(SignalKind::terminate()),
        ) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => info!(signal = "SIGINT", "received signal"),
                    _ = sigterm.recv() => info!(signal = "SIGTERM", "received signal"),
                }
                return;
            }
            (Err(err), _) | (_, Err(err)) => {
                warn!(error = %err, "failed to install unix signal handlers; falling back to ctrl-c");
            }
        }
    }

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for ctrl-c");
        return;
    }
    info!(signal = "ctrl-c", "received signal");
}
