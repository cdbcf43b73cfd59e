// src/exec/terminate/unix.rs

use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::{getpgid, getpgrp, Pid};
use tokio::process::Child;
use tracing::{debug, error, warn};

use super::{BoxFuture, Terminator};
use crate::errors::{RespawnError, Result};
use crate::exec::CommandSpec;

/// Process-group based termination for Unix-like systems.
///
/// Children are launched with `process_group(0)`, so their group id equals
/// their pid and signalling the group also reaches anything they spawned.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixTerminator;

impl UnixTerminator {
    /// Group to signal for `pid`, refusing our own group so a failed
    /// `setpgid` can never make us signal ourselves.
    fn target_group(&self, pid: u32) -> Result<Pid> {
        let pgid = Pid::from_raw(self.process_group_of(pid)?);
        if pgid == getpgrp() {
            return Err(RespawnError::Termination(format!(
                "process {pid} shares the supervisor's process group"
            )));
        }
        Ok(pgid)
    }
}

impl Terminator for UnixTerminator {
    fn request_graceful_stop(&self, child: &mut Child, command: &CommandSpec) -> Result<()> {
        let Some(pid) = child.id() else {
            debug!(process = %command, "process already reaped; nothing to signal");
            return Ok(());
        };

        match self.target_group(pid) {
            Ok(pgid) => match killpg(pgid, Signal::SIGTERM) {
                Ok(()) => {
                    debug!(process = %command, pgid = pgid.as_raw(), "sent SIGTERM to process group");
                    Ok(())
                }
                Err(errno) => {
                    warn!(
                        process = %command,
                        pgid = pgid.as_raw(),
                        error = %errno,
                        "failed to send SIGTERM to process group; signalling process only"
                    );
                    signal_process(pid, Signal::SIGTERM, command)
                }
            },
            Err(err) => {
                debug!(
                    process = %command,
                    pid,
                    error = %err,
                    "no usable process group; sending SIGTERM to process"
                );
                signal_process(pid, Signal::SIGTERM, command)
            }
        }
    }

    fn force_stop<'a>(
        &'a self,
        child: &'a mut Child,
        command: &'a CommandSpec,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let Some(pid) = child.id() else {
                return;
            };

            match self.target_group(pid) {
                Ok(pgid) => match killpg(pgid, Signal::SIGKILL) {
                    Ok(()) => {
                        debug!(process = %command, pgid = pgid.as_raw(), "process group killed");
                    }
                    Err(errno) => {
                        warn!(
                            process = %command,
                            pgid = pgid.as_raw(),
                            error = %errno,
                            "failed to kill process group"
                        );
                        if let Err(e) = child.start_kill() {
                            error!(process = %command, pid, error = %e, "failed to kill process");
                        }
                    }
                },
                Err(err) => {
                    debug!(process = %command, pid, error = %err, "no usable process group; killing process");
                    if let Err(e) = child.start_kill() {
                        error!(process = %command, pid, error = %e, "failed to kill process");
                    }
                }
            }
        })
    }

    fn is_running(&self, child: &mut Child) -> bool {
        matches!(child.try_wait(), Ok(None))
    }

    fn process_group_of(&self, pid: u32) -> Result<i32> {
        let raw = i32::try_from(pid)
            .map_err(|_| RespawnError::Termination(format!("pid {pid} out of range")))?;
        getpgid(Some(Pid::from_raw(raw)))
            .map(Pid::as_raw)
            .map_err(|errno| RespawnError::Termination(format!("getpgid({pid}): {errno}")))
    }
}

fn signal_process(pid: u32, signal: Signal, command: &CommandSpec) -> Result<()> {
    let raw = i32::try_from(pid)
        .map_err(|_| RespawnError::Termination(format!("pid {pid} out of range")))?;
    kill(Pid::from_raw(raw), signal).map_err(|errno| {
        warn!(process = %command, pid, signal = %signal, error = %errno, "failed to signal process");
        RespawnError::Termination(format!("{signal} to pid {pid}: {errno}"))
    })
}
