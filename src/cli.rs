// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::IsolateMode;

/// Command-line arguments for `appvisor`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "appvisor",
    version,
    about = "Run an application process and supervise it until it exits.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Appvisor.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Extra environment entry for the app; may be repeated.
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Do not pass the supervisor's own environment to the app.
    #[arg(long)]
    pub no_inherit_env: bool,

    /// Process-group isolation: auto, none or new-group.
    #[arg(long, value_name = "MODE")]
    pub isolate: Option<IsolateMode>,

    /// Time a stopped app gets before it is killed (e.g. `5s`, `500ms`).
    #[arg(long, value_name = "DURATION")]
    pub shutdown_grace: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `APPVISOR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve config and print what would be launched, without launching.
    #[arg(long)]
    pub dry_run: bool,

    /// App binary and its arguments, after `--`. Overrides `[app]`.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_command_after_double_dash() {
        let args = CliArgs::parse_from([
            "appvisor",
            "--env",
            "A=1",
            "--isolate",
            "none",
            "--",
            "./server",
            "--port",
            "3000",
        ]);
        assert_eq!(args.env, vec!["A=1".to_string()]);
        assert_eq!(args.isolate, Some(IsolateMode::None));
        assert_eq!(args.command, vec!["./server", "--port", "3000"]);
    }

    #[test]
    fn rejects_unknown_isolate_mode() {
        let res = CliArgs::try_parse_from(["appvisor", "--isolate", "job-object"]);
        assert!(res.is_err());
    }
}
