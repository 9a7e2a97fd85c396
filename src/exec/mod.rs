// src/exec/mod.rs

//! App process execution layer.
//!
//! - [`command`] holds the launch inputs (`ProcessSpec`), the reusable
//!   command handle (`AppCommand`) and the per-run record (`RunOutput`).
//! - [`isolation`] decides whether the app gets its own process group.
//! - [`app`] launches the app and runs the completion watcher that reports
//!   back to the orchestrator through a `RunSignal` channel.

pub mod app;
pub mod command;
pub mod isolation;

pub use app::{AppHandle, Launcher};
pub use command::{AppCommand, ProcessSpec, RunOutput};
pub use isolation::{Isolation, NewProcessGroup, NoIsolation, isolation_for};

use crate::errors::AppExitError;

/// Why the orchestrator was interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptKind {
    /// Ctrl-C / SIGINT.
    CtrlC,
    /// SIGTERM.
    Terminate,
}

/// Final result of one app process, as classified by the watcher.
#[derive(Debug)]
pub struct AppOutcome {
    pub pid: u32,
    /// `None` means the app exited successfully.
    pub error: Option<AppExitError>,
    /// True when the watcher stopped the app because it was asked to.
    pub cancelled: bool,
}

impl AppOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Exit code the supervisor should exit with for this outcome.
    pub fn exit_code(&self) -> i32 {
        self.error
            .as_ref()
            .map_or(0, AppExitError::supervisor_exit_code)
    }
}

/// Events on the completion signal channel.
///
/// The completion watcher sends exactly one `AppExited` per launched app; the
/// OS signal forwarder sends `Interrupt`s. The orchestrator is the only
/// consumer.
#[derive(Debug)]
pub enum RunSignal {
    AppExited(AppOutcome),
    Interrupt(InterruptKind),
}
