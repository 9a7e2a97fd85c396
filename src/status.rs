// src/status.rs

//! Human-readable status lines for the person watching the console.
//!
//! This is separate from `tracing` logs: one line per app outcome, printed
//! whatever the log level is.

use std::io::Write;

/// Severity of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Failure,
}

/// Sink for status lines. Implementations must not block indefinitely.
pub trait StatusReporter: Send + Sync {
    fn report(&self, kind: StatusKind, message: &str);

    fn success(&self, message: &str) {
        self.report(StatusKind::Success, message);
    }

    fn failure(&self, message: &str) {
        self.report(StatusKind::Failure, message);
    }
}

/// Prints successes to stdout and failures to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleStatus;

impl StatusReporter for ConsoleStatus {
    fn report(&self, kind: StatusKind, message: &str) {
        let line = format_status(kind, message);
        // A closed stdout/stderr must not take the supervisor down.
        let _ = match kind {
            StatusKind::Success => writeln!(std::io::stdout().lock(), "{line}"),
            StatusKind::Failure => writeln!(std::io::stderr().lock(), "{line}"),
        };
    }
}

pub fn format_status(kind: StatusKind, message: &str) -> String {
    match kind {
        StatusKind::Success => format!("✅  {message}"),
        StatusKind::Failure => format!("❌  {message}"),
    }
}
