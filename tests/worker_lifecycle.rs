// Real-process scenarios for a single supervision worker.
#![cfg(unix)]

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::common::{init_tracing, wait_until, with_timeout, RecordingTerminator, TestResult, WorkerSettingsBuilder};

use respawn::config::WorkerSettings;
use respawn::exec::Terminator;
use respawn::supervisor::{RestartOutcome, Worker, WorkerExit};
use respawn::types::WorkerStatus;

fn worker(
    raw: &str,
    settings: WorkerSettings,
    terminator: &Arc<RecordingTerminator>,
) -> Arc<Worker> {
    let terminator: Arc<dyn Terminator> = terminator.clone();
    Arc::new(Worker::new("process_0", raw, settings, terminator).expect("valid command"))
}

fn spawn_run(worker: &Arc<Worker>, token: &CancellationToken) -> JoinHandle<WorkerExit> {
    let worker = Arc::clone(worker);
    let token = token.clone();
    tokio::spawn(async move { worker.run(token).await })
}

async fn wait_running(worker: &Worker) -> bool {
    wait_until(Duration::from_secs(3), || worker.status() == WorkerStatus::Running).await
}

/// A shell script that ignores SIGTERM and keeps running until killed.
fn term_ignoring_script() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("stubborn.sh");
    std::fs::write(&path, "trap '' TERM\nwhile true; do sleep 0.1; done\n").expect("write script");
    let command = format!("sh {}", path.display());
    (dir, command)
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_stops_a_cooperative_process_within_the_grace_period() -> TestResult {
    init_tracing();
    let terminator = RecordingTerminator::new();
    let settings = WorkerSettingsBuilder::new()
        .grace(Duration::from_secs(1))
        .restart_delay(Duration::from_millis(50))
        .build();
    let worker = worker("sleep 30", settings, &terminator);
    let token = CancellationToken::new();
    let handle = spawn_run(&worker, &token);

    assert!(wait_running(&worker).await, "worker never reached running");
    assert!(worker.current_process().and_then(|p| p.pid).is_some());

    let started = Instant::now();
    token.cancel();
    let exit = with_timeout(handle).await?;

    assert_eq!(exit, WorkerExit::Shutdown);
    assert!(started.elapsed() < Duration::from_millis(1_500));
    assert_eq!(terminator.graceful_calls(), 1);
    assert_eq!(terminator.force_calls(), 0);
    assert_eq!(worker.status(), WorkerStatus::Stopped);
    assert!(worker.current_process().is_none());
    assert_eq!(worker.stats().exit_failure_count, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn process_ignoring_term_is_force_killed_exactly_once() -> TestResult {
    init_tracing();
    let (_dir, command) = term_ignoring_script();
    let terminator = RecordingTerminator::new();
    let grace = Duration::from_millis(300);
    let settings = WorkerSettingsBuilder::new()
        .grace(grace)
        .restart_delay(Duration::from_millis(50))
        .build();
    let worker = worker(&command, settings, &terminator);
    let token = CancellationToken::new();
    let handle = spawn_run(&worker, &token);

    assert!(wait_running(&worker).await);
    // Let the shell install its trap before signalling it.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let started = Instant::now();
    token.cancel();
    let exit = with_timeout(handle).await?;
    let elapsed = started.elapsed();

    assert_eq!(exit, WorkerExit::Shutdown);
    assert_eq!(terminator.graceful_calls(), 1);
    assert_eq!(terminator.force_calls(), 1);
    assert!(elapsed >= grace, "force-stop came before the grace period: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "termination took {elapsed:?}");
    assert!(worker.current_process().is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_graceful_request_goes_straight_to_force_stop() -> TestResult {
    init_tracing();
    let terminator = RecordingTerminator::refusing_graceful();
    let settings = WorkerSettingsBuilder::new()
        .grace(Duration::from_secs(5))
        .restart_delay(Duration::from_millis(50))
        .build();
    let worker = worker("sleep 30", settings, &terminator);
    let token = CancellationToken::new();
    let handle = spawn_run(&worker, &token);

    assert!(wait_running(&worker).await);

    let started = Instant::now();
    token.cancel();
    let exit = with_timeout(handle).await?;

    assert_eq!(exit, WorkerExit::Shutdown);
    assert_eq!(terminator.force_calls(), 1);
    assert!(started.elapsed() < Duration::from_secs(2));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn gives_up_after_max_consecutive_launch_failures() -> TestResult {
    init_tracing();
    let terminator = RecordingTerminator::new();
    let settings = WorkerSettingsBuilder::new()
        .restart_delay(Duration::from_millis(20))
        .max_retries(3)
        .build();
    let worker = worker("/no/such/binary/respawn-test --flag", settings, &terminator);
    let token = CancellationToken::new();

    let exit = with_timeout(spawn_run(&worker, &token)).await?;

    assert_eq!(exit, WorkerExit::GaveUp { launch_failures: 3 });
    let stats = worker.stats();
    assert_eq!(stats.restart_count, 3);
    assert_eq!(stats.launch_failures, 3);
    assert_eq!(stats.exit_failure_count, 0);
    assert_eq!(stats.status, WorkerStatus::Failed);
    assert_eq!(stats.backoff, Duration::from_millis(160));
    assert!(stats.last_failure.is_some());
    assert!(stats.pid.is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn launch_failures_without_backoff_keep_the_base_delay() -> TestResult {
    init_tracing();
    let terminator = RecordingTerminator::new();
    let settings = WorkerSettingsBuilder::new()
        .restart_delay(Duration::from_millis(20))
        .max_retries(4)
        .backoff(false)
        .build();
    let worker = worker("/no/such/binary/respawn-test", settings, &terminator);
    let token = CancellationToken::new();

    let started = Instant::now();
    let exit = with_timeout(spawn_run(&worker, &token)).await?;

    assert_eq!(exit, WorkerExit::GaveUp { launch_failures: 4 });
    assert_eq!(worker.stats().backoff, Duration::from_millis(20));
    // Five 20ms waits; with doubling this would be over 600ms.
    assert!(started.elapsed() < Duration::from_millis(500));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn non_zero_exits_count_as_exit_failures_not_launch_failures() -> TestResult {
    init_tracing();
    let terminator = RecordingTerminator::new();
    let settings = WorkerSettingsBuilder::new()
        .restart_delay(Duration::from_millis(30))
        .max_retries(1)
        .build();
    let worker = worker("false", settings, &terminator);
    let token = CancellationToken::new();
    let handle = spawn_run(&worker, &token);

    assert!(
        wait_until(Duration::from_secs(3), || worker.stats().exit_failure_count >= 3).await,
        "expected repeated exit failures"
    );

    let stats = worker.stats();
    assert_eq!(stats.launch_failures, 0);
    assert!(stats.restart_count >= 3);
    assert!(stats.last_failure.is_some());
    // max_retries only bounds launch failures, so the worker is still going.
    assert!(!handle.is_finished());

    token.cancel();
    assert_eq!(with_timeout(handle).await?, WorkerExit::Shutdown);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn clean_exits_are_relaunched_without_counting_failures() -> TestResult {
    init_tracing();
    let terminator = RecordingTerminator::new();
    let settings = WorkerSettingsBuilder::new()
        .restart_delay(Duration::from_millis(30))
        .build();
    let worker = worker("true", settings, &terminator);
    let token = CancellationToken::new();
    let handle = spawn_run(&worker, &token);

    assert!(wait_until(Duration::from_secs(3), || worker.stats().restart_count >= 3).await);

    let stats = worker.stats();
    assert_eq!(stats.exit_failure_count, 0);
    assert_eq!(stats.launch_failures, 0);
    assert!(stats.last_failure.is_none());

    token.cancel();
    assert_eq!(with_timeout(handle).await?, WorkerExit::Shutdown);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn uptime_grows_while_running() -> TestResult {
    init_tracing();
    let terminator = RecordingTerminator::new();
    let settings = WorkerSettingsBuilder::new()
        .restart_delay(Duration::from_millis(20))
        .build();
    let worker = worker("sleep 30", settings, &terminator);
    let token = CancellationToken::new();
    let handle = spawn_run(&worker, &token);

    assert!(wait_running(&worker).await);
    let first = worker.stats();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = worker.stats();

    assert_eq!(second.status, WorkerStatus::Running);
    assert!(second.uptime >= first.uptime + Duration::from_millis(90));
    assert_eq!(first.start_time, second.start_time);
    assert_eq!(first.pid, second.pid);

    token.cancel();
    with_timeout(handle).await?;
    assert_eq!(worker.stats().uptime, Duration::ZERO);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn restart_request_replaces_the_running_process() -> TestResult {
    init_tracing();
    let terminator = RecordingTerminator::new();
    let settings = WorkerSettingsBuilder::new()
        .grace(Duration::from_secs(1))
        .restart_delay(Duration::from_millis(50))
        .build();
    let worker = worker("sleep 30", settings, &terminator);
    let token = CancellationToken::new();
    let handle = spawn_run(&worker, &token);

    assert!(wait_running(&worker).await);
    let first_pid = worker.current_process().and_then(|p| p.pid);

    let outcome = with_timeout(worker.request_restart()).await;
    assert_eq!(outcome, RestartOutcome::Restarted);
    assert_eq!(terminator.graceful_calls(), 1);

    assert!(
        wait_until(Duration::from_secs(3), || {
            worker.status() == WorkerStatus::Running
                && worker.current_process().and_then(|p| p.pid) != first_pid
        })
        .await,
        "worker did not relaunch after restart"
    );

    let stats = worker.stats();
    assert_eq!(stats.restart_count, 2);
    assert_eq!(stats.exit_failure_count, 0);

    token.cancel();
    assert_eq!(with_timeout(handle).await?, WorkerExit::Shutdown);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn restart_request_with_nothing_running_is_a_no_op() -> TestResult {
    init_tracing();
    let terminator = RecordingTerminator::new();
    let settings = WorkerSettingsBuilder::new()
        .restart_delay(Duration::from_secs(10))
        .build();
    let worker = worker("sleep 30", settings, &terminator);
    let token = CancellationToken::new();
    let handle = spawn_run(&worker, &token);

    assert_eq!(worker.request_restart().await, RestartOutcome::NotRunning);
    assert_eq!(worker.stats().restart_count, 0);

    token.cancel();
    assert_eq!(with_timeout(handle).await?, WorkerExit::Shutdown);
    assert_eq!(terminator.graceful_calls(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn second_run_on_the_same_worker_is_refused() -> TestResult {
    init_tracing();
    let terminator = RecordingTerminator::new();
    let settings = WorkerSettingsBuilder::new()
        .restart_delay(Duration::from_secs(10))
        .build();
    let worker = worker("sleep 30", settings, &terminator);
    let token = CancellationToken::new();
    let handle = spawn_run(&worker, &token);

    // Give the first loop time to claim the restart channel.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = with_timeout(worker.run(token.clone())).await;
    assert_eq!(second, WorkerExit::AlreadyStarted);

    token.cancel();
    assert_eq!(with_timeout(handle).await?, WorkerExit::Shutdown);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn interactive_shell_hosts_are_force_stopped_without_a_graceful_request() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = dir.path().join("pwsh-host.sh");
    std::fs::write(&script, "trap '' TERM\nwhile true; do sleep 0.1; done\n")?;

    let terminator = RecordingTerminator::new();
    let settings = WorkerSettingsBuilder::new()
        .grace(Duration::from_secs(30))
        .restart_delay(Duration::from_millis(50))
        .build();
    let worker = worker(&format!("sh {}", script.display()), settings, &terminator);
    assert_eq!(worker.grace_period(), Duration::from_secs(2));

    let token = CancellationToken::new();
    let handle = spawn_run(&worker, &token);
    assert!(wait_running(&worker).await);

    let started = Instant::now();
    token.cancel();
    assert_eq!(with_timeout(handle).await?, WorkerExit::Shutdown);

    assert_eq!(terminator.graceful_calls(), 0);
    assert_eq!(terminator.force_calls(), 1);
    assert!(started.elapsed() < Duration::from_secs(2));
    Ok(())
}

/// A script that runs briefly and then exits with status 3.
fn failing_later_script() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("fail_later.sh");
    std::fs::write(&path, "sleep 0.2\nexit 3\n").expect("write script");
    let command = format!("sh {}", path.display());
    (dir, command)
}

// Single-threaded runtime: blocking the test thread keeps the worker loop
// from observing the exit, so the exit and the request arrive together.
#[tokio::test]
async fn exit_racing_a_restart_request_is_still_counted() -> TestResult {
    init_tracing();
    let (_dir, command) = failing_later_script();
    let terminator = RecordingTerminator::new();
    let settings = WorkerSettingsBuilder::new()
        .grace(Duration::from_secs(1))
        .restart_delay(Duration::from_millis(50))
        .build();
    let worker = worker(&command, settings, &terminator);
    let token = CancellationToken::new();
    let handle = spawn_run(&worker, &token);

    assert!(wait_running(&worker).await);
    assert_eq!(worker.stats().exit_failure_count, 0);
    std::thread::sleep(Duration::from_millis(600));

    let outcome = with_timeout(worker.request_restart()).await;

    assert_eq!(outcome, RestartOutcome::NotRunning);
    let stats = worker.stats();
    assert_eq!(stats.exit_failure_count, 1);
    assert!(stats.last_failure.is_some());
    assert_eq!(terminator.graceful_calls(), 0);

    token.cancel();
    assert_eq!(with_timeout(handle).await?, WorkerExit::Shutdown);
    Ok(())
}

#[tokio::test]
async fn exit_racing_shutdown_is_still_counted() -> TestResult {
    init_tracing();
    let (_dir, command) = failing_later_script();
    let terminator = RecordingTerminator::new();
    let settings = WorkerSettingsBuilder::new()
        .grace(Duration::from_secs(1))
        .restart_delay(Duration::from_millis(50))
        .build();
    let worker = worker(&command, settings, &terminator);
    let token = CancellationToken::new();
    let handle = spawn_run(&worker, &token);

    assert!(wait_running(&worker).await);
    std::thread::sleep(Duration::from_millis(600));

    token.cancel();
    assert_eq!(with_timeout(handle).await?, WorkerExit::Shutdown);

    let stats = worker.stats();
    assert_eq!(stats.exit_failure_count, 1);
    assert_eq!(stats.status, WorkerStatus::Failed);
    assert!(worker.current_process().is_none());
    assert_eq!(terminator.graceful_calls(), 0);
    assert_eq!(terminator.force_calls(), 0);
    Ok(())
}
