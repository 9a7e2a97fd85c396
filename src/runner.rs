// src/runner.rs

//! Run orchestration around the launcher.
//!
//! - [`resolve_settings`] merges config file and CLI flags into a
//!   `ProcessSpec` plus typed run options.
//! - [`run_app`] launches the app, waits for the first `RunSignal`, tears
//!   the app down on interrupt, and records the outcome.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, RunConfig};
use crate::errors::AppvisorError;
use crate::exec::{
    AppHandle, AppOutcome, Isolation, Launcher, ProcessSpec, RunOutput, RunSignal,
};
use crate::signals::spawn_signal_forwarder;
use crate::status::StatusReporter;
use crate::types::{parse_duration, split_env_entry};

/// Everything needed to launch one app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub spec: ProcessSpec,
    pub run: RunConfig,
}

/// Merge config and CLI flags. CLI values win.
///
/// `base_env` is the supervisor's own environment; it is only used when
/// environment inheritance is enabled.
pub fn resolve_settings(
    cfg: &ConfigFile,
    args: &CliArgs,
    base_env: impl IntoIterator<Item = (String, String)>,
) -> std::result::Result<RunSettings, AppvisorError> {
    let (binary, app_args) = match args.command.split_first() {
        Some((binary, rest)) => (binary.clone(), rest.to_vec()),
        None => match &cfg.app.command {
            Some(command) => (command.clone(), cfg.app.args.clone()),
            None => {
                return Err(AppvisorError::ConfigError(
                    "no app command given: set [app].command or pass it after `--`".to_string(),
                ));
            }
        },
    };

    let mut env: Vec<(String, String)> = Vec::new();
    if cfg.app.inherit_env && !args.no_inherit_env {
        env.extend(base_env);
    }
    for entry in cfg.app.env.iter().chain(args.env.iter()) {
        let (key, value) = split_env_entry(entry)
            .map_err(|e| AppvisorError::ConfigError(format!("--env: {e}")))?;
        set_env(&mut env, key, value);
    }

    let mut run = cfg.run;
    if let Some(isolate) = args.isolate {
        run.isolate = isolate;
    }
    if let Some(grace) = args.shutdown_grace.as_deref() {
        run.shutdown_grace = parse_duration(grace)
            .map_err(|e| AppvisorError::ConfigError(format!("--shutdown-grace: {e}")))?;
    }

    let mut spec = ProcessSpec::new(binary).args(app_args);
    spec.env = env;

    Ok(RunSettings { spec, run })
}

fn set_env(env: &mut Vec<(String, String)>, key: &str, value: &str) {
    match env.iter_mut().find(|(k, _)| k == key) {
        Some(slot) => slot.1 = value.to_string(),
        None => env.push((key.to_string(), value.to_string())),
    }
}

/// Launch the app and supervise it to completion.
///
/// `isolation` is applied to the command handle before launch. Returns the
/// filled-in `RunOutput`. A launch failure is returned as an error straight
/// away; nothing is left running in that case.
pub async fn run_app(
    settings: &RunSettings,
    isolation: &dyn Isolation,
    status: Arc<dyn StatusReporter>,
) -> Result<RunOutput> {
    let (signal_tx, signal_rx) = mpsc::channel::<RunSignal>(settings.run.signal_capacity);
    let _forwarder = spawn_signal_forwarder(signal_tx.clone());

    let mut output = RunOutput::new();
    isolation.apply(output.app_cmd_mut());
    debug!(isolation = isolation.name(), "applied app isolation");

    let launcher = Launcher::new(status, settings.run.shutdown_grace);
    let handle = launcher.launch(&mut output, &settings.spec, signal_tx)?;

    let outcome = supervise(handle, signal_rx).await?;
    output.record_outcome(outcome);
    Ok(output)
}

/// Wait for the app's outcome, stopping the app on the first interrupt.
///
/// Further interrupts while the app is being stopped are ignored; the
/// watcher's grace period bounds how long that takes.
pub async fn supervise(
    mut handle: AppHandle,
    mut signal_rx: mpsc::Receiver<RunSignal>,
) -> Result<AppOutcome> {
    loop {
        match signal_rx.recv().await {
            Some(RunSignal::AppExited(outcome)) => {
                debug!(pid = outcome.pid, "received app completion signal");
                handle
                    .join()
                    .await
                    .context("joining app watcher task")?;
                return Ok(outcome);
            }
            Some(RunSignal::Interrupt(kind)) => {
                info!(?kind, pid = handle.pid(), "interrupt received; stopping app");
                handle.cancel();
            }
            None => bail!("signal channel closed before the app exited"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::RawConfigFile;
    use crate::types::IsolateMode;

    fn config(toml_src: &str) -> ConfigFile {
        let raw: RawConfigFile = toml::from_str(toml_src).unwrap();
        ConfigFile::try_from(raw).unwrap()
    }

    fn base_env() -> Vec<(String, String)> {
        vec![
            ("PATH".to_string(), "/usr/bin".to_string()),
            ("APP_MODE".to_string(), "prod".to_string()),
        ]
    }

    #[test]
    fn config_command_used_without_cli_command() {
        let cfg = config(
            r#"
            [app]
            command = "./server"
            args = ["--port", "3000"]
            "#,
        );
        let settings = resolve_settings(&cfg, &CliArgs::default(), base_env()).unwrap();
        assert_eq!(settings.spec.binary, std::path::PathBuf::from("./server"));
        assert_eq!(settings.spec.args, vec!["--port", "3000"]);
    }

    #[test]
    fn cli_command_replaces_config_command_and_args() {
        let cfg = config(
            r#"
            [app]
            command = "./server"
            args = ["--port", "3000"]
            "#,
        );
        let args = CliArgs {
            command: vec!["python3".to_string(), "app.py".to_string()],
            ..Default::default()
        };
        let settings = resolve_settings(&cfg, &args, base_env()).unwrap();
        assert_eq!(settings.spec.binary, std::path::PathBuf::from("python3"));
        assert_eq!(settings.spec.args, vec!["app.py"]);
    }

    #[test]
    fn missing_command_is_an_error() {
        let err = resolve_settings(&ConfigFile::default(), &CliArgs::default(), base_env())
            .unwrap_err();
        assert!(err.to_string().contains("no app command"));
    }

    #[test]
    fn env_layers_override_in_order() {
        let cfg = config(
            r#"
            [app]
            command = "./server"
            env = ["APP_MODE=dev", "DEBUG=1"]
            "#,
        );
        let args = CliArgs {
            env: vec!["DEBUG=0".to_string()],
            ..Default::default()
        };
        let settings = resolve_settings(&cfg, &args, base_env()).unwrap();
        assert_eq!(
            settings.spec.env,
            vec![
                ("PATH".to_string(), "/usr/bin".to_string()),
                ("APP_MODE".to_string(), "dev".to_string()),
                ("DEBUG".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn no_inherit_env_drops_base_env() {
        let cfg = config(
            r#"
            [app]
            command = "./server"
            env = ["ONLY=this"]
            "#,
        );
        let args = CliArgs {
            no_inherit_env: true,
            ..Default::default()
        };
        let settings = resolve_settings(&cfg, &args, base_env()).unwrap();
        assert_eq!(
            settings.spec.env,
            vec![("ONLY".to_string(), "this".to_string())]
        );
    }

    #[test]
    fn run_overrides_from_cli() {
        let cfg = config(
            r#"
            [app]
            command = "./server"

            [run]
            isolate = "new-group"
            shutdown_grace = "10s"
            "#,
        );
        let args = CliArgs {
            isolate: Some(IsolateMode::None),
            shutdown_grace: Some("250ms".to_string()),
            ..Default::default()
        };
        let settings = resolve_settings(&cfg, &args, base_env()).unwrap();
        assert_eq!(settings.run.isolate, IsolateMode::None);
        assert_eq!(settings.run.shutdown_grace, Duration::from_millis(250));
    }

    #[test]
    fn bad_cli_env_entry_is_rejected() {
        let args = CliArgs {
            env: vec!["NOVALUE".to_string()],
            command: vec!["true".to_string()],
            ..Default::default()
        };
        assert!(resolve_settings(&ConfigFile::default(), &args, base_env()).is_err());
    }
}
