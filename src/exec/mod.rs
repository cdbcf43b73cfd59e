// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] holds [`CommandSpec`], the immutable executable + argument
//!   split of a command line, and knows how to build the OS launch call.
//! - [`terminate`] provides the [`Terminator`] trait (graceful stop, forced
//!   stop, liveness query, process-group lookup) and the platform
//!   implementation selected at build time. Workers only ever talk to the
//!   trait, so tests can wrap or replace it.

pub mod command;
pub mod terminate;

pub use command::CommandSpec;
pub use terminate::{platform_terminator, PlatformTerminator, Terminator};
