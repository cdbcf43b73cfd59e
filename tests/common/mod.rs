#![allow(dead_code)]

use std::error::Error;

pub use respawn_test_utils::builders::{commands_file, SettingsBuilder, WorkerSettingsBuilder};
pub use respawn_test_utils::terminator::RecordingTerminator;
pub use respawn_test_utils::{init_tracing, wait_until, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;
