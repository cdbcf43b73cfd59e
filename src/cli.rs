// src/cli.rs

//! CLI argument parsing using `clap`.

use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};

use crate::config::model::{
    parse_duration, DashboardSettings, Settings, DEFAULT_GRACE_PERIOD, DEFAULT_RESTART_DELAY,
};

/// Command-line arguments for `respawn`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "respawn",
    version,
    about = "Run a fixed set of commands in parallel and restart them whenever they exit.",
    long_about = None
)]
pub struct CliArgs {
    /// File containing the commands to run, one per line.
    ///
    /// Empty lines and lines starting with `#` are ignored.
    #[arg(short = 'f', long = "file", value_name = "PATH", default_value = "commands.txt")]
    pub file: String,

    /// Graceful shutdown timeout per process (e.g. "5s", "500ms", "1m30s").
    #[arg(long, value_name = "DURATION", value_parser = parse_duration, default_value = "5s")]
    pub grace: Duration,

    /// Base delay between process restarts.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration, default_value = "1s")]
    pub restart_delay: Duration,

    /// Maximum consecutive launch failures before a command is given up on
    /// (0 = unlimited).
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub max_retries: u32,

    /// Exponential backoff for commands that fail to launch.
    #[arg(long, value_name = "BOOL", action = ArgAction::Set, default_value_t = true)]
    pub backoff: bool,

    /// Serve the web dashboard for monitoring.
    #[arg(long)]
    pub dashboard: bool,

    /// Web dashboard port.
    #[arg(long, value_name = "PORT", default_value_t = 8080)]
    pub port: u32,

    /// Web dashboard host.
    #[arg(long, value_name = "HOST", default_value = "localhost")]
    pub host: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RESPAWN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

impl CliArgs {
    /// Collect the raw (not yet validated) settings from the parsed flags.
    pub fn settings(&self) -> Settings {
        Settings {
            grace_period: self.grace,
            restart_delay: self.restart_delay,
            max_retries: self.max_retries,
            backoff_enabled: self.backoff,
            dashboard: DashboardSettings {
                enabled: self.dashboard,
                host: self.host.clone(),
                port: self.port,
            },
        }
    }
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            file: "commands.txt".to_string(),
            grace: DEFAULT_GRACE_PERIOD,
            restart_delay: DEFAULT_RESTART_DELAY,
            max_retries: 0,
            backoff: true,
            dashboard: false,
            port: 8080,
            host: "localhost".to_string(),
            log_level: None,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
