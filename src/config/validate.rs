// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, RunConfig};
use crate::errors::{AppvisorError, Result};
use crate::types::{parse_duration, split_env_entry};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AppvisorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_app(&raw)?;
        let run = validate_run(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.app, run))
    }
}

fn validate_app(cfg: &RawConfigFile) -> Result<()> {
    if let Some(command) = cfg.app.command.as_deref() {
        if command.trim().is_empty() {
            return Err(AppvisorError::ConfigError(
                "[app].command must not be empty".to_string(),
            ));
        }
    }

    for entry in cfg.app.env.iter() {
        split_env_entry(entry)
            .map_err(|e| AppvisorError::ConfigError(format!("[app].env: {e}")))?;
    }

    Ok(())
}

fn validate_run(cfg: &RawConfigFile) -> Result<RunConfig> {
    if cfg.run.signal_capacity < 2 {
        return Err(AppvisorError::ConfigError(format!(
            "[run].signal_capacity must be >= 2 (got {})",
            cfg.run.signal_capacity
        )));
    }

    let shutdown_grace = parse_duration(&cfg.run.shutdown_grace)
        .map_err(|e| AppvisorError::ConfigError(format!("[run].shutdown_grace: {e}")))?;

    Ok(RunConfig {
        isolate: cfg.run.isolate,
        shutdown_grace,
        signal_capacity: cfg.run.signal_capacity,
    })
}
