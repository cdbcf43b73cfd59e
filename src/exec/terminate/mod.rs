// src/exec/terminate/mod.rs

//! Platform-abstracted process termination.
//!
//! The supervision worker drives its shutdown sequence through the
//! [`Terminator`] trait and never branches on the target OS itself:
//!
//! - on Unix ([`unix::UnixTerminator`]) graceful stop sends `SIGTERM` to the
//!   child's whole process group and force-stop sends `SIGKILL` the same way,
//!   each falling back to the single process when the group cannot be used;
//! - elsewhere ([`windows::WindowsTerminator`]) there is no graceful signal,
//!   so graceful stop only checks liveness and force-stop retries the kill a
//!   few times.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::process::Child;

use crate::errors::Result;
use crate::exec::CommandSpec;

#[cfg(unix)]
pub mod unix;
#[cfg(not(unix))]
pub mod windows;

#[cfg(unix)]
pub use unix::UnixTerminator as PlatformTerminator;
#[cfg(not(unix))]
pub use windows::WindowsTerminator as PlatformTerminator;

/// Boxed future returned by the async half of [`Terminator`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Capability interface for stopping a launched process.
///
/// Implementations must tolerate a child that has already exited: every
/// operation then becomes a no-op (or reports "not running").
pub trait Terminator: Send + Sync + fmt::Debug {
    /// Ask the process (and, where supported, its process group) to exit.
    ///
    /// An error means the request could not be delivered; the caller then
    /// goes straight to [`Terminator::force_stop`].
    fn request_graceful_stop(&self, child: &mut Child, command: &CommandSpec) -> Result<()>;

    /// Kill the process for real. Failures are logged, never returned.
    fn force_stop<'a>(
        &'a self,
        child: &'a mut Child,
        command: &'a CommandSpec,
    ) -> BoxFuture<'a, ()>;

    /// Whether the process is still alive.
    fn is_running(&self, child: &mut Child) -> bool;

    /// Process group id for `pid`, where the OS has process groups.
    fn process_group_of(&self, pid: u32) -> Result<i32>;
}

/// The terminator for the platform this binary was built for.
pub fn platform_terminator() -> Arc<dyn Terminator> {
    Arc::new(PlatformTerminator::default())
}
