// src/exec/command.rs

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::warn;

use crate::errors::AppExitError;
use crate::exec::AppOutcome;

/// What to launch. Immutable once handed to the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub binary: PathBuf,
    pub args: Vec<String>,
    /// Complete app environment; replaces the supervisor's own.
    pub env: Vec<(String, String)>,
}

impl ProcessSpec {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Reusable description of the app command.
///
/// Collaborators may create it before launch and set platform attributes on
/// it (see `exec::isolation`). The launcher then fills in binary, args and
/// env in place and keeps those attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppCommand {
    pub binary: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    /// Process group to join; `Some(0)` creates a new group led by the app.
    /// Ignored on platforms without process groups.
    pub process_group: Option<i32>,
    pub current_dir: Option<PathBuf>,
}

impl AppCommand {
    /// Overwrite what to run, leaving the platform attributes alone.
    pub fn configure(&mut self, spec: &ProcessSpec) {
        self.binary = spec.binary.clone();
        self.args = spec.args.clone();
        self.env = spec.env.clone();
    }

    /// True when the app will lead its own process group.
    pub fn is_grouped(&self) -> bool {
        cfg!(unix) && self.process_group == Some(0)
    }

    /// Build the tokio command: inherited stdio, cleared environment.
    pub(crate) fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(&self.args)
            .env_clear()
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(false);

        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        #[cfg(unix)]
        {
            if let Some(group) = self.process_group {
                cmd.process_group(group);
            }
        }

        cmd
    }
}

/// Per-run record shared between the orchestrator and the launcher.
///
/// The launcher fills in `app_cmd` and `app_pid`. The terminal error is
/// written once, by the orchestrator, from the outcome the completion
/// watcher delivered.
#[derive(Debug, Default)]
pub struct RunOutput {
    pub app_cmd: Option<AppCommand>,
    pub app_pid: Option<u32>,
    app_err: Option<AppExitError>,
    finished: bool,
    cancelled: bool,
}

impl RunOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Command handle, created empty on first access.
    pub fn app_cmd_mut(&mut self) -> &mut AppCommand {
        self.app_cmd.get_or_insert_with(AppCommand::default)
    }

    /// Record the app's terminal state.
    ///
    /// Only the first outcome is kept; returns false (and drops `outcome`)
    /// if one was already recorded.
    pub fn record_outcome(&mut self, outcome: AppOutcome) -> bool {
        if self.finished {
            warn!(pid = outcome.pid, "app outcome already recorded; ignoring");
            return false;
        }
        self.finished = true;
        self.cancelled = outcome.cancelled;
        self.app_err = outcome.error;
        true
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn app_err(&self) -> Option<&AppExitError> {
        self.app_err.as_ref()
    }

    /// Exit code for the recorded outcome; 0 while nothing failed.
    pub fn exit_code(&self) -> i32 {
        self.app_err
            .as_ref()
            .map_or(0, AppExitError::supervisor_exit_code)
    }
}
