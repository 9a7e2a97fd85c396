// tests/launch_outcomes.rs
#![cfg(unix)]

mod common;
use crate::common::*;

use std::error::Error;
use std::time::Duration;

use tokio::sync::mpsc;

use appvisor::errors::{AppExitError, LaunchError};
use appvisor::exec::{ProcessSpec, RunOutput, RunSignal};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn clean_exit_signals_once_without_error() -> TestResult {
    init_tracing();

    let status = RecordingStatus::new();
    let (tx, mut rx) = mpsc::channel::<RunSignal>(2);
    let mut output = RunOutput::new();

    let handle = launcher(&status, Duration::from_secs(1)).launch(&mut output, &sh("exit 0"), tx)?;
    assert_eq!(output.app_pid, Some(handle.pid()));

    let outcome = expect_single_exit(&mut rx).await;
    assert!(outcome.is_success());
    assert!(!outcome.cancelled);
    assert_eq!(outcome.pid, handle.pid());

    assert_eq!(status.successes(), vec!["Exited app successfully".to_string()]);
    assert!(status.failures().is_empty());

    assert!(output.record_outcome(outcome));
    assert!(output.app_err().is_none());
    assert_eq!(output.exit_code(), 0);

    with_timeout(handle.join()).await?;
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_carries_the_code() -> TestResult {
    init_tracing();

    let status = RecordingStatus::new();
    let (tx, mut rx) = mpsc::channel::<RunSignal>(2);
    let mut output = RunOutput::new();

    launcher(&status, Duration::from_secs(1)).launch(&mut output, &sh("exit 7"), tx)?;

    let outcome = expect_single_exit(&mut rx).await;
    match &outcome.error {
        Some(AppExitError::NonZeroExit { code, signal }) => {
            assert_eq!(*code, 7);
            assert_eq!(*signal, None);
        }
        other => panic!("expected NonZeroExit, got {other:?}"),
    }

    let failures = status.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains('7'), "message should mention the code: {}", failures[0]);
    assert!(status.successes().is_empty());

    output.record_outcome(outcome);
    assert_eq!(output.exit_code(), 7);
    Ok(())
}

#[tokio::test]
async fn missing_binary_fails_synchronously_without_signal() -> TestResult {
    init_tracing();

    let status = RecordingStatus::new();
    let (tx, mut rx) = mpsc::channel::<RunSignal>(2);
    let mut output = RunOutput::new();

    let err = launcher(&status, Duration::from_secs(1))
        .launch(
            &mut output,
            &ProcessSpec::new("/nonexistent/appvisor-test-binary"),
            tx,
        )
        .unwrap_err();

    assert!(matches!(err, LaunchError::Spawn { .. }));
    assert!(err.to_string().contains("failed to start app"));

    // The only sender went away with the failed launch.
    assert!(with_timeout(rx.recv()).await.is_none());
    assert!(status.lines().is_empty());
    assert_eq!(output.app_pid, None);
    assert!(output.app_err().is_none());
    assert!(!output.is_finished());
    Ok(())
}

#[tokio::test]
async fn empty_binary_is_rejected() -> TestResult {
    let status = RecordingStatus::new();
    let (tx, mut rx) = mpsc::channel::<RunSignal>(2);
    let mut output = RunOutput::new();

    let err = launcher(&status, Duration::from_secs(1))
        .launch(&mut output, &ProcessSpec::new(""), tx)
        .unwrap_err();

    assert!(matches!(err, LaunchError::EmptyBinary));
    assert!(with_timeout(rx.recv()).await.is_none());
    assert_eq!(output.app_pid, None);
    Ok(())
}

#[tokio::test]
async fn externally_terminated_app_is_classified_once() -> TestResult {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    init_tracing();

    let status = RecordingStatus::new();
    let (tx, mut rx) = mpsc::channel::<RunSignal>(2);
    let mut output = RunOutput::new();

    let handle = launcher(&status, Duration::from_secs(1))
        .launch(&mut output, &sh("exec sleep 30"), tx)?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    kill(Pid::from_raw(handle.pid() as i32), Signal::SIGTERM)?;

    let outcome = expect_single_exit(&mut rx).await;
    assert!(!outcome.cancelled);
    match &outcome.error {
        Some(AppExitError::NonZeroExit { code, signal }) => {
            assert_eq!(*code, -1);
            assert_eq!(*signal, Some(Signal::SIGTERM as i32));
        }
        other => panic!("expected NonZeroExit, got {other:?}"),
    }
    assert_eq!(outcome.exit_code(), 128 + Signal::SIGTERM as i32);
    assert_eq!(status.failures().len(), 1);
    Ok(())
}

#[tokio::test]
async fn environment_replaces_the_inherited_one() -> TestResult {
    init_tracing();

    let status = RecordingStatus::new();
    let (tx, mut rx) = mpsc::channel::<RunSignal>(2);
    let mut output = RunOutput::new();

    let spec = sh(r#"test "$FOO" = bar && test -z "$HOME""#).env("FOO", "bar");
    launcher(&status, Duration::from_secs(1)).launch(&mut output, &spec, tx)?;

    let outcome = expect_single_exit(&mut rx).await;
    assert!(outcome.is_success(), "unexpected outcome: {outcome:?}");
    Ok(())
}

#[tokio::test]
async fn prepopulated_command_handle_is_reused() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let canonical = std::fs::canonicalize(dir.path())?;

    let status = RecordingStatus::new();
    let (tx, mut rx) = mpsc::channel::<RunSignal>(2);
    let mut output = RunOutput::new();
    output.app_cmd_mut().current_dir = Some(dir.path().to_path_buf());

    let script = format!(r#"test "$(pwd -P)" = "{}""#, canonical.display());
    launcher(&status, Duration::from_secs(1)).launch(&mut output, &sh(&script), tx)?;

    let outcome = expect_single_exit(&mut rx).await;
    assert!(outcome.is_success(), "app did not run in the preset dir: {outcome:?}");

    let app = output.app_cmd.as_ref().expect("handle kept");
    assert_eq!(app.current_dir.as_deref(), Some(dir.path()));
    assert_eq!(app.binary, std::path::PathBuf::from("/bin/sh"));
    Ok(())
}
