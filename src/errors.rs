// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RespawnError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{}", invalid_command_message(.line, .reason))]
    InvalidCommand { line: Option<usize>, reason: String },

    #[error("empty command: {0:?}")]
    EmptyCommand(String),

    #[error("no valid processes could be started")]
    NoValidWorkers,

    #[error("termination failed: {0}")]
    Termination(String),

    #[error("dashboard error: {0}")]
    Dashboard(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

fn invalid_command_message(line: &Option<usize>, reason: &str) -> String {
    match line {
        Some(n) => format!("invalid command on line {n}: {reason}"),
        None => format!("invalid command: {reason}"),
    }
}

pub type Result<T> = std::result::Result<T, RespawnError>;
