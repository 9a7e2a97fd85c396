// src/exec/app.rs

//! Launch the app process and watch it until it exits.
//!
//! [`Launcher::launch`] starts the process synchronously and hands the child
//! to a completion watcher running in its own Tokio task. The watcher:
//!
//! - waits for the child to exit, or for a cancel request from the
//!   orchestrator (in which case it stops the child first),
//! - classifies the exit into an [`AppOutcome`],
//! - prints one status line,
//! - sends exactly one `RunSignal::AppExited` carrying the outcome.
//!
//! A launch failure returns immediately and schedules nothing.

use std::io;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::errors::{AppExitError, LaunchError};
use crate::exec::command::{ProcessSpec, RunOutput};
use crate::exec::{AppOutcome, RunSignal};
use crate::status::StatusReporter;

/// Starts app processes and their completion watchers.
#[derive(Clone)]
pub struct Launcher {
    status: Arc<dyn StatusReporter>,
    shutdown_grace: Duration,
}

impl std::fmt::Debug for Launcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launcher")
            .field("shutdown_grace", &self.shutdown_grace)
            .finish_non_exhaustive()
    }
}

impl Launcher {
    /// `shutdown_grace` is how long a cancelled app gets to exit after the
    /// terminate request before it is killed.
    pub fn new(status: Arc<dyn StatusReporter>, shutdown_grace: Duration) -> Self {
        Self {
            status,
            shutdown_grace,
        }
    }

    /// Start the app described by `spec` and schedule its watcher.
    ///
    /// An existing `output.app_cmd` is reconfigured in place, so attributes a
    /// collaborator set on it beforehand (process group, working directory)
    /// survive. On success `output.app_pid` is set and the watcher will send
    /// exactly one `RunSignal::AppExited` on `signal_tx`.
    ///
    /// On failure nothing is scheduled, nothing is sent, and `output.app_pid`
    /// is left as it was.
    pub fn launch(
        &self,
        output: &mut RunOutput,
        spec: &ProcessSpec,
        signal_tx: mpsc::Sender<RunSignal>,
    ) -> Result<AppHandle, LaunchError> {
        if spec.binary.as_os_str().is_empty() {
            return Err(LaunchError::EmptyBinary);
        }

        let app = output.app_cmd_mut();
        app.configure(spec);

        info!(
            binary = %app.binary.display(),
            args = ?app.args,
            grouped = app.is_grouped(),
            "starting app process"
        );

        let child = app
            .to_command()
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                binary: spec.binary.clone(),
                source,
            })?;

        // `id()` is only `None` once the child has been reaped.
        let pid = child.id().unwrap_or(0);
        let grouped = app.is_grouped();
        output.app_pid = Some(pid);
        info!(pid, "app process started");

        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let watcher = CompletionWatcher {
            pid,
            grouped,
            shutdown_grace: self.shutdown_grace,
            status: Arc::clone(&self.status),
        };
        let handle = tokio::spawn(watcher.watch(child, cancel_rx, signal_tx));

        Ok(AppHandle {
            pid,
            cancel: Some(cancel_tx),
            handle,
        })
    }
}

/// Orchestrator-side handle to a running app.
#[derive(Debug)]
pub struct AppHandle {
    pid: u32,
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl AppHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Ask the watcher to stop the app.
    ///
    /// The watcher still classifies the exit and sends its single
    /// `AppExited`. Returns false if a cancel was already requested or the
    /// watcher has already finished.
    pub fn cancel(&mut self) -> bool {
        match self.cancel.take() {
            Some(cancel) => {
                if cancel.send(()).is_err() {
                    debug!(pid = self.pid, "app watcher already finished while cancelling");
                    return false;
                }
                info!(pid = self.pid, "cancellation requested for app process");
                true
            }
            None => {
                debug!(pid = self.pid, "app cancellation already requested");
                false
            }
        }
    }

    /// Wait for the watcher task itself to end.
    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.handle.await
    }
}

/// State carried by the watcher task for one child.
struct CompletionWatcher {
    pid: u32,
    grouped: bool,
    shutdown_grace: Duration,
    status: Arc<dyn StatusReporter>,
}

impl CompletionWatcher {
    async fn watch(
        self,
        mut child: Child,
        mut cancel_rx: oneshot::Receiver<()>,
        signal_tx: mpsc::Sender<RunSignal>,
    ) {
        let mut cancelled = false;

        let status_res = tokio::select! {
            status_res = child.wait() => status_res,

            cancel = &mut cancel_rx => {
                match cancel {
                    Ok(()) => {
                        cancelled = true;
                        self.stop(&mut child).await
                    }
                    Err(_) => {
                        debug!(
                            pid = self.pid,
                            "cancel channel closed without explicit cancellation"
                        );
                        child.wait().await
                    }
                }
            }
        };

        let outcome = AppOutcome {
            pid: self.pid,
            error: classify_exit(status_res),
            cancelled,
        };
        self.report(&outcome);

        // Capacity >= 2 with one slot kept free by the signal forwarder, so
        // this only waits if the orchestrator misbehaves.
        if signal_tx.send(RunSignal::AppExited(outcome)).await.is_err() {
            debug!(pid = self.pid, "completion receiver dropped; app outcome discarded");
        }
    }

    /// Terminate the child, escalating to a kill after the grace period.
    async fn stop(&self, child: &mut Child) -> io::Result<ExitStatus> {
        info!(
            pid = self.pid,
            grouped = self.grouped,
            grace_ms = self.shutdown_grace.as_millis() as u64,
            "stopping app process"
        );

        if let Err(e) = request_terminate(child, self.pid, self.grouped) {
            warn!(pid = self.pid, error = %e, "failed to send terminate request to app");
        }

        match tokio::time::timeout(self.shutdown_grace, child.wait()).await {
            Ok(status_res) => status_res,
            Err(_) => {
                warn!(pid = self.pid, "app did not exit within grace period; killing");
                if let Err(e) = force_kill(child, self.pid, self.grouped) {
                    warn!(pid = self.pid, error = %e, "failed to kill app process");
                }
                child.wait().await
            }
        }
    }

    fn report(&self, outcome: &AppOutcome) {
        match &outcome.error {
            Some(AppExitError::Wait(e)) => {
                error!(pid = self.pid, error = %e, "waiting for app process failed");
                self.status
                    .failure(&format!("The app process exited with error: {e}"));
            }
            Some(AppExitError::NonZeroExit { code, signal }) => {
                info!(pid = self.pid, exit_code = code, signal = ?signal, "app process exited");
                self.status
                    .failure(&format!("The app process exited with error code: {code}"));
            }
            None => {
                info!(pid = self.pid, exit_code = 0, "app process exited");
                self.status.success("Exited app successfully");
            }
        }
    }
}

/// Map the result of waiting on the child to its terminal error.
pub(crate) fn classify_exit(status_res: io::Result<ExitStatus>) -> Option<AppExitError> {
    match status_res {
        Err(e) => Some(AppExitError::Wait(e)),
        Ok(status) if status.success() => None,
        Ok(status) => Some(AppExitError::NonZeroExit {
            code: status.code().unwrap_or(-1),
            signal: exit_signal(&status),
        }),
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

#[cfg(unix)]
fn request_terminate(_child: &mut Child, pid: u32, grouped: bool) -> io::Result<()> {
    send_unix_signal(pid, grouped, nix::sys::signal::Signal::SIGTERM)
}

#[cfg(not(unix))]
fn request_terminate(child: &mut Child, _pid: u32, _grouped: bool) -> io::Result<()> {
    child.start_kill()
}

#[cfg(unix)]
fn force_kill(child: &mut Child, pid: u32, grouped: bool) -> io::Result<()> {
    if grouped {
        // Reaches helpers the app spawned into its group as well. The app
        // itself is killed below even if the group is already gone.
        if let Err(e) = send_unix_signal(pid, true, nix::sys::signal::Signal::SIGKILL) {
            warn!(pid, error = %e, "failed to kill app process group");
        }
    }
    child.start_kill()
}

#[cfg(not(unix))]
fn force_kill(child: &mut Child, _pid: u32, _grouped: bool) -> io::Result<()> {
    child.start_kill()
}

#[cfg(unix)]
fn send_unix_signal(pid: u32, grouped: bool, signal: nix::sys::signal::Signal) -> io::Result<()> {
    use nix::sys::signal::{kill, killpg};
    use nix::unistd::Pid;

    // pid 0 would address our own process group.
    if pid == 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "app pid unknown"));
    }
    let pid = Pid::from_raw(pid as i32);
    let res = if grouped {
        killpg(pid, signal)
    } else {
        kill(pid, signal)
    };
    res.map_err(io::Error::from)
}
