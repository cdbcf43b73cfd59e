// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::validate::validate_command;
use crate::errors::{RespawnError, Result};

/// Load the commands file.
///
/// - Each line is one command; surrounding whitespace is trimmed.
/// - Empty lines and lines starting with `#` are skipped.
/// - Every remaining line must pass [`validate_command`]; the first invalid
///   line aborts loading and the error names its 1-based line number.
///
/// An empty result is not an error here; the caller decides what "nothing
/// to run" means.
pub fn load_commands(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    info!(file = %path.display(), "loading commands");

    let contents = fs::read_to_string(path)?;
    let commands = parse_commands(&contents)?;

    info!(file = %path.display(), count = commands.len(), "commands loaded");
    Ok(commands)
}

/// Parse command lines from already-read file contents.
pub fn parse_commands(contents: &str) -> Result<Vec<String>> {
    let mut commands = Vec::new();

    for (idx, raw_line) in contents.lines().enumerate() {
        let cmd = raw_line.trim();
        if cmd.is_empty() || cmd.starts_with('#') {
            continue;
        }

        validate_command(cmd).map_err(|err| match err {
            RespawnError::InvalidCommand { reason, .. } => RespawnError::InvalidCommand {
                line: Some(idx + 1),
                reason,
            },
            other => other,
        })?;

        commands.push(cmd.to_string());
    }

    Ok(commands)
}
