use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use appvisor::exec::{AppCommand, Isolation};
use appvisor::status::{StatusKind, StatusReporter};

/// A status reporter that records every line instead of printing it.
#[derive(Debug, Clone, Default)]
pub struct RecordingStatus {
    lines: Arc<Mutex<Vec<(StatusKind, String)>>>,
}

impl RecordingStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(StatusKind, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<String> {
        self.of_kind(StatusKind::Failure)
    }

    pub fn successes(&self) -> Vec<String> {
        self.of_kind(StatusKind::Success)
    }

    fn of_kind(&self, kind: StatusKind) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, msg)| msg)
            .collect()
    }
}

impl StatusReporter for RecordingStatus {
    fn report(&self, kind: StatusKind, message: &str) {
        self.lines.lock().unwrap().push((kind, message.to_string()));
    }
}

/// An isolation that counts how often it was applied and sets a fixed
/// process-group value.
#[derive(Debug, Default)]
pub struct RecordingIsolation {
    pub group: Option<i32>,
    applied: AtomicUsize,
}

impl RecordingIsolation {
    pub fn new(group: Option<i32>) -> Self {
        Self {
            group,
            applied: AtomicUsize::new(0),
        }
    }

    pub fn applied(&self) -> usize {
        self.applied.load(Ordering::SeqCst)
    }
}

impl Isolation for RecordingIsolation {
    fn apply(&self, app: &mut AppCommand) {
        self.applied.fetch_add(1, Ordering::SeqCst);
        app.process_group = self.group;
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
