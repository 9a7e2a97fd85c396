#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use appvisor::exec::{AppOutcome, Launcher, ProcessSpec, RunSignal};
pub use appvisor_test_utils::fakes::{RecordingIsolation, RecordingStatus};
pub use appvisor_test_utils::{init_tracing, with_timeout};

/// `/bin/sh -c <script>` with only `PATH` in its environment.
pub fn sh(script: &str) -> ProcessSpec {
    ProcessSpec::new("/bin/sh")
        .args(["-c", script])
        .env("PATH", std::env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".into()))
}

pub fn launcher(status: &RecordingStatus, grace: Duration) -> Launcher {
    Launcher::new(Arc::new(status.clone()), grace)
}

/// Receive the single `AppExited` and check nothing else follows.
///
/// The caller must not hold another sender, so the channel closes once the
/// watcher is done.
pub async fn expect_single_exit(rx: &mut mpsc::Receiver<RunSignal>) -> AppOutcome {
    let outcome = match with_timeout(rx.recv()).await {
        Some(RunSignal::AppExited(outcome)) => outcome,
        other => panic!("expected AppExited, got {other:?}"),
    };
    assert!(
        with_timeout(rx.recv()).await.is_none(),
        "watcher must signal exactly once"
    );
    outcome
}
