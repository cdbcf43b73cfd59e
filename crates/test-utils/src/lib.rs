pub mod builders;
pub mod terminator;

use std::sync::Once;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use respawn::logging::LOG_ENV_VAR;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install a once-only subscriber for tests.
///
/// Output goes through `with_test_writer()`, so the harness only shows it for
/// failing tests. The filter is read from `RESPAWN_LOG` like the binary does
/// (e.g. `RESPAWN_LOG=respawn=debug`), defaulting to `warn` to keep the
/// process-spawning tests quiet.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        // Another harness may already have installed one.
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Fail the test if `f` takes longer than five seconds.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Poll `condition` every 20ms until it holds or `within` elapses.
/// Returns whether it held.
pub async fn wait_until<F>(within: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + within;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(Duration::from_millis(20)).await;
    }
}
