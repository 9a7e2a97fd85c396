// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::types::IsolateMode;

/// Configuration exactly as read from a TOML file.
///
/// ```toml
/// [app]
/// command = "./my-app"
/// args = ["--port", "3000"]
/// env = ["APP_MODE=dev"]
///
/// [run]
/// isolate = "new-group"
/// shutdown_grace = "5s"
/// ```
///
/// All sections are optional. Use `ConfigFile::try_from` to validate.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub app: AppSection,

    #[serde(default)]
    pub run: RunSection,
}

/// `[app]` section: what to launch.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    /// Executable to launch. May be supplied on the command line instead.
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    /// Extra `KEY=VALUE` entries for the app environment.
    #[serde(default)]
    pub env: Vec<String>,

    /// Start from the supervisor's own environment before applying `env`.
    ///
    /// When false the app sees only the configured entries.
    #[serde(default = "default_inherit_env")]
    pub inherit_env: bool,
}

fn default_inherit_env() -> bool {
    true
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            env: Vec::new(),
            inherit_env: default_inherit_env(),
        }
    }
}

/// `[run]` section: how the app process is supervised.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    #[serde(default)]
    pub isolate: IsolateMode,

    /// How long a cancelled app gets between SIGTERM and a forced kill.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace: String,

    /// Capacity of the completion signal channel. Must be >= 2 so that one
    /// slot always stays free for the completion watcher.
    #[serde(default = "default_signal_capacity")]
    pub signal_capacity: usize,
}

fn default_shutdown_grace() -> String {
    "5s".to_string()
}

fn default_signal_capacity() -> usize {
    2
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            isolate: IsolateMode::default(),
            shutdown_grace: default_shutdown_grace(),
            signal_capacity: default_signal_capacity(),
        }
    }
}

/// Validated, typed form of `[run]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    pub isolate: IsolateMode,
    pub shutdown_grace: Duration,
    pub signal_capacity: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            isolate: IsolateMode::default(),
            shutdown_grace: Duration::from_secs(5),
            signal_capacity: default_signal_capacity(),
        }
    }
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>` (see `validate.rs`).
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub app: AppSection,
    pub run: RunConfig,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(app: AppSection, run: RunConfig) -> Self {
        Self { app, run }
    }
}
