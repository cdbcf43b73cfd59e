// src/config/mod.rs

//! Configuration and command-source handling for respawn.
//!
//! Responsibilities:
//! - Define the typed supervisor/dashboard settings (`model.rs`).
//! - Validate settings ranges and individual command lines (`validate.rs`).
//! - Load the commands file from disk (`loader.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::load_commands;
pub use model::{DashboardSettings, Settings, WorkerSettings};
pub use validate::{validate_command, validate_settings};
