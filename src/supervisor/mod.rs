// src/supervisor/mod.rs

//! Supervision core.
//!
//! - [`worker`]: the per-command restart loop (lifecycle state machine,
//!   launch backoff, termination sequencing).
//! - [`backoff`]: pure restart-rate state driven by launch failures.
//! - [`stats`]: the stats a worker keeps and the snapshot it hands out.
//! - [`registry`]: id-keyed read/restart surface for the dashboard.
//! - [`core`]: the [`Supervisor`] that owns all workers and the shutdown
//!   token.

pub mod backoff;
pub mod core;
pub mod registry;
pub mod stats;
pub mod worker;

pub use backoff::{Backoff, BACKOFF_MULTIPLIER, MAX_BACKOFF};
pub use self::core::{ShutdownReport, Supervisor};
pub use registry::{WorkerRegistry, WorkerView};
pub use stats::StatsSnapshot;
pub use worker::{ProcessHandle, RestartOutcome, Worker, WorkerExit};
