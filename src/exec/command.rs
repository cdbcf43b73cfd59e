// src/exec/command.rs

use std::fmt;
use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::errors::{RespawnError, Result};

/// Substrings (matched case-insensitively against the whole command line)
/// identifying interactive shell hosts that do not reliably honour graceful
/// stop requests.
const INTERACTIVE_SHELL_MARKERS: [&str; 2] = ["powershell", "pwsh"];

/// An executable name plus its ordered arguments, derived once by
/// whitespace-splitting a validated command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    executable: String,
    arguments: Vec<String>,
    raw: String,
}

impl CommandSpec {
    /// Split `raw` on whitespace: the first token is the executable, the
    /// rest are arguments. No quoting rules are applied.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.split_whitespace();
        let executable = parts
            .next()
            .ok_or_else(|| RespawnError::EmptyCommand(raw.to_string()))?
            .to_string();

        Ok(Self {
            executable,
            arguments: parts.map(str::to_string).collect(),
            raw: raw.to_string(),
        })
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// The command line exactly as it was configured.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether this command runs an interactive shell host (PowerShell and
    /// friends) that gets a short grace period and an immediate force-stop.
    pub fn is_interactive_shell(&self) -> bool {
        let lower = self.raw.to_lowercase();
        INTERACTIVE_SHELL_MARKERS
            .iter()
            .any(|marker| lower.contains(marker))
    }

    /// Build the OS command.
    ///
    /// Standard streams are inherited untouched. The child is placed in its
    /// own process group (POSIX) or console process group (Windows) so that
    /// termination can reach its descendants. `kill_on_drop` is a last-resort
    /// guard for a worker task that gets aborted while its child is live.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(&self.arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        #[cfg(windows)]
        {
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
            cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
        }

        cmd
    }

    /// Launch one instance of the command.
    pub fn spawn(&self) -> std::io::Result<Child> {
        self.to_command().spawn()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
