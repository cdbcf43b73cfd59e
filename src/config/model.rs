// src/config/model.rs

use std::time::Duration;

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(1);

/// Upper bound for `--grace`.
pub const MAX_GRACE_PERIOD: Duration = Duration::from_secs(10 * 60);
/// Upper bound for `--restart-delay`.
pub const MAX_RESTART_DELAY: Duration = Duration::from_secs(60 * 60);
/// Upper bound for `--max-retries`.
pub const MAX_RETRIES_LIMIT: u32 = 1000;
/// Longest command line accepted from the commands file.
pub const MAX_COMMAND_LENGTH: usize = 1000;

/// Full set of options the program runs with.
///
/// Built from CLI flags; call [`crate::config::validate_settings`] before
/// handing it to anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// How long a process gets to exit after a graceful stop request.
    pub grace_period: Duration,
    /// Base delay between launches (and the backoff starting point).
    pub restart_delay: Duration,
    /// Consecutive launch failures after which a worker gives up; 0 = never.
    pub max_retries: u32,
    /// Grow the launch delay exponentially on consecutive launch failures.
    pub backoff_enabled: bool,
    pub dashboard: DashboardSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            restart_delay: DEFAULT_RESTART_DELAY,
            max_retries: 0,
            backoff_enabled: true,
            dashboard: DashboardSettings::default(),
        }
    }
}

impl Settings {
    /// The subset of settings each supervision worker needs.
    pub fn worker(&self) -> WorkerSettings {
        WorkerSettings {
            grace_period: self.grace_period,
            restart_delay: self.restart_delay,
            max_retries: self.max_retries,
            backoff_enabled: self.backoff_enabled,
        }
    }
}

/// Dashboard bind options; only consumed by [`crate::dashboard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSettings {
    pub enabled: bool,
    pub host: String,
    /// Kept wider than `u16` so out-of-range values reach validation
    /// instead of failing inside clap with a less helpful message.
    pub port: u32,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "localhost".to_string(),
            port: 8080,
        }
    }
}

impl DashboardSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Per-worker restart and shutdown options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    pub grace_period: Duration,
    pub restart_delay: Duration,
    pub max_retries: u32,
    pub backoff_enabled: bool,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Settings::default().worker()
    }
}

/// Parse a duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`, or a
/// concatenation such as `"1m30s"`. A bare `"0"` is accepted as zero.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total = Duration::ZERO;
    let mut rest = s;

    while !rest.is_empty() {
        // Find the boundary between digits and suffix.
        let digits_end = rest
            .chars()
            .position(|c| !c.is_ascii_digit())
            .ok_or_else(|| format!("duration '{s}' missing unit suffix"))?;
        if digits_end == 0 {
            return Err(format!("invalid duration '{s}': expected a number"));
        }

        let (num_part, after_num) = rest.split_at(digits_end);
        let unit_end = after_num
            .chars()
            .position(|c| c.is_ascii_digit())
            .unwrap_or(after_num.len());
        let (unit_part, remainder) = after_num.split_at(unit_end);

        let value: u64 = num_part
            .parse()
            .map_err(|e| format!("invalid duration number '{num_part}': {e}"))?;

        let piece = match unit_part.trim().to_lowercase().as_str() {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.saturating_mul(60)),
            "h" => Duration::from_secs(value.saturating_mul(60 * 60)),
            unit => {
                return Err(format!(
                    "unsupported duration unit '{unit}'; expected ms, s, m, or h"
                ));
            }
        };

        total = total.saturating_add(piece);
        rest = remainder;
    }

    Ok(total)
}
