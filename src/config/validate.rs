// src/config/validate.rs

use std::path::{Path, MAIN_SEPARATOR};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::model::{
    Settings, MAX_COMMAND_LENGTH, MAX_GRACE_PERIOD, MAX_RESTART_DELAY, MAX_RETRIES_LIMIT,
};
use crate::errors::{RespawnError, Result};

/// Characters that would let a command line chain, redirect or substitute
/// if it ever reached a shell.
static DANGEROUS_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[;&|><$`]").expect("dangerous character pattern is a valid regex")
});

/// Check the settings ranges before anything starts.
pub fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.grace_period > MAX_GRACE_PERIOD {
        return Err(RespawnError::ConfigError(format!(
            "grace period too long (max 10 minutes): {:?}",
            settings.grace_period
        )));
    }

    if settings.restart_delay > MAX_RESTART_DELAY {
        return Err(RespawnError::ConfigError(format!(
            "restart delay too long (max 1 hour): {:?}",
            settings.restart_delay
        )));
    }

    if settings.max_retries > MAX_RETRIES_LIMIT {
        return Err(RespawnError::ConfigError(format!(
            "max retries too high (max {MAX_RETRIES_LIMIT}): {}",
            settings.max_retries
        )));
    }

    let dashboard = &settings.dashboard;
    if dashboard.port < 1 || dashboard.port > 65535 {
        return Err(RespawnError::ConfigError(format!(
            "web port must be between 1 and 65535: {}",
            dashboard.port
        )));
    }

    if dashboard.host.trim().is_empty() {
        return Err(RespawnError::ConfigError(
            "web host cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validate a single command line from the commands file.
///
/// Checks, in order: emptiness, shell metacharacters, `..` in a relative
/// executable path, and overall length. The returned error carries no line
/// number; [`crate::config::load_commands`] fills that in.
pub fn validate_command(cmd: &str) -> Result<()> {
    let Some(executable) = cmd.split_whitespace().next() else {
        return Err(invalid("command cannot be empty".to_string()));
    };

    if DANGEROUS_CHARS.is_match(cmd) {
        return Err(invalid(format!(
            "command contains potentially dangerous characters: {cmd}"
        )));
    }

    let looks_like_path = executable.contains(MAIN_SEPARATOR) || executable.contains('/');
    if looks_like_path && !Path::new(executable).is_absolute() && executable.contains("..") {
        return Err(invalid(format!(
            "relative paths with '..' are not allowed: {executable}"
        )));
    }

    let len = cmd.chars().count();
    if len > MAX_COMMAND_LENGTH {
        let preview: String = cmd.chars().take(50).collect();
        return Err(invalid(format!(
            "command too long ({len} characters, max {MAX_COMMAND_LENGTH}): {preview}..."
        )));
    }

    Ok(())
}

fn invalid(reason: String) -> RespawnError {
    RespawnError::InvalidCommand { line: None, reason }
}
