use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use respawn::errors::{RespawnError, Result};
use respawn::exec::terminate::BoxFuture;
use respawn::exec::{CommandSpec, PlatformTerminator, Terminator};
use tokio::process::Child;

/// Wraps the platform terminator and counts how often each stage of the
/// termination sequence was used.
#[derive(Debug, Default)]
pub struct RecordingTerminator {
    inner: PlatformTerminator,
    graceful: AtomicUsize,
    forced: AtomicUsize,
    refuse_graceful: bool,
}

impl RecordingTerminator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A terminator whose graceful stop request always fails, forcing the
    /// caller straight onto the force-stop path.
    pub fn refusing_graceful() -> Arc<Self> {
        Arc::new(Self {
            refuse_graceful: true,
            ..Self::default()
        })
    }

    pub fn graceful_calls(&self) -> usize {
        self.graceful.load(Ordering::SeqCst)
    }

    pub fn force_calls(&self) -> usize {
        self.forced.load(Ordering::SeqCst)
    }
}

impl Terminator for RecordingTerminator {
    fn request_graceful_stop(&self, child: &mut Child, command: &CommandSpec) -> Result<()> {
        self.graceful.fetch_add(1, Ordering::SeqCst);
        if self.refuse_graceful {
            return Err(RespawnError::Termination(
                "graceful stop refused".to_string(),
            ));
        }
        self.inner.request_graceful_stop(child, command)
    }

    fn force_stop<'a>(
        &'a self,
        child: &'a mut Child,
        command: &'a CommandSpec,
    ) -> BoxFuture<'a, ()> {
        self.forced.fetch_add(1, Ordering::SeqCst);
        self.inner.force_stop(child, command)
    }

    fn is_running(&self, child: &mut Child) -> bool {
        self.inner.is_running(child)
    }

    fn process_group_of(&self, pid: u32) -> Result<i32> {
        self.inner.process_group_of(pid)
    }
}
