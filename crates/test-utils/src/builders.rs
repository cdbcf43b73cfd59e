#![allow(dead_code)]

use std::io::Write;
use std::time::Duration;

use respawn::config::{DashboardSettings, Settings, WorkerSettings};
use tempfile::NamedTempFile;

/// Builder for `WorkerSettings` with test-friendly defaults: short grace
/// period and restart delay so scenarios finish quickly.
pub struct WorkerSettingsBuilder {
    settings: WorkerSettings,
}

impl WorkerSettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: WorkerSettings {
                grace_period: Duration::from_secs(1),
                restart_delay: Duration::from_millis(100),
                max_retries: 0,
                backoff_enabled: true,
            },
        }
    }

    pub fn grace(mut self, grace: Duration) -> Self {
        self.settings.grace_period = grace;
        self
    }

    pub fn restart_delay(mut self, delay: Duration) -> Self {
        self.settings.restart_delay = delay;
        self
    }

    pub fn max_retries(mut self, max: u32) -> Self {
        self.settings.max_retries = max;
        self
    }

    pub fn backoff(mut self, enabled: bool) -> Self {
        self.settings.backoff_enabled = enabled;
        self
    }

    pub fn build(self) -> WorkerSettings {
        self.settings
    }
}

impl Default for WorkerSettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for the full `Settings`, starting from the program defaults.
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
        }
    }

    pub fn grace(mut self, grace: Duration) -> Self {
        self.settings.grace_period = grace;
        self
    }

    pub fn restart_delay(mut self, delay: Duration) -> Self {
        self.settings.restart_delay = delay;
        self
    }

    pub fn max_retries(mut self, max: u32) -> Self {
        self.settings.max_retries = max;
        self
    }

    pub fn dashboard(mut self, host: &str, port: u32) -> Self {
        self.settings.dashboard = DashboardSettings {
            enabled: true,
            host: host.to_string(),
            port,
        };
        self
    }

    pub fn build(self) -> Settings {
        self.settings
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `lines` to a fresh temporary commands file.
pub fn commands_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp commands file");
    for line in lines {
        writeln!(file, "{line}").expect("write temp commands file");
    }
    file.flush().expect("flush temp commands file");
    file
}
