// src/errors.rs

//! Crate-wide error types.
//!
//! - [`AppvisorError`] covers config and settings failures (file IO, TOML,
//!   validation).
//! - [`LaunchError`] is the synchronous failure of starting the app process.
//! - [`AppExitError`] is the terminal error of an app process that did start.
//!   It is never returned from a call; it travels inside the completion
//!   signal and ends up recorded in `RunOutput`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppvisorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// The app process could not be created at all.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("failed to start app: binary path is empty")]
    EmptyBinary,

    #[error("failed to start app '{}': {source}", .binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Terminal error of an app process that was started successfully.
#[derive(Error, Debug)]
pub enum AppExitError {
    /// Reaping the process failed; says nothing about the app itself.
    #[error("waiting for app process failed: {0}")]
    Wait(#[source] std::io::Error),

    /// The app ran to completion and reported failure.
    ///
    /// `code` is `-1` when the OS reports no exit code (killed by a signal);
    /// in that case `signal` holds the signal number on Unix.
    #[error("app exited with status {code}")]
    NonZeroExit { code: i32, signal: Option<i32> },
}

impl AppExitError {
    /// Numeric exit code carried by a `NonZeroExit`.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            AppExitError::NonZeroExit { code, .. } => Some(*code),
            AppExitError::Wait(_) => None,
        }
    }

    /// Exit code the supervisor should exit with for this error.
    ///
    /// A process killed by a signal reports no code; it maps to `128 + signal`
    /// like a shell would.
    pub fn supervisor_exit_code(&self) -> i32 {
        match self {
            AppExitError::Wait(_) => 1,
            AppExitError::NonZeroExit { code, .. } if *code >= 0 => *code,
            AppExitError::NonZeroExit { signal, .. } => signal.map(|s| 128 + s).unwrap_or(1),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppvisorError>;
