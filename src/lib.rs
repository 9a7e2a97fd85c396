// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod runner;
pub mod signals;
pub mod status;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate, load_or_default};
use crate::exec::isolation_for;
use crate::runner::{RunSettings, resolve_settings, run_app};
use crate::status::ConsoleStatus;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the OS signal forwarder
/// - the app launcher and its completion watcher
///
/// Returns the exit code the supervisor should exit with.
pub async fn run(args: CliArgs) -> Result<i32> {
    // An explicit --config must exist; the default one is optional.
    let cfg = match &args.config {
        Some(path) => load_and_validate(PathBuf::from(path))?,
        None => load_or_default(default_config_path())?,
    };

    let settings = resolve_settings(&cfg, &args, supervisor_env())?;

    if args.dry_run {
        print_dry_run(&settings);
        return Ok(0);
    }

    let isolation = isolation_for(settings.run.isolate);
    let output = run_app(&settings, isolation.as_ref(), Arc::new(ConsoleStatus)).await?;

    if let Some(err) = output.app_err() {
        info!(error = %err, cancelled = output.was_cancelled(), "app finished with error");
    }
    Ok(output.exit_code())
}

/// The supervisor's own environment, skipping entries that are not UTF-8.
fn supervisor_env() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
}

/// Simple dry-run output: print what would be launched and how.
fn print_dry_run(settings: &RunSettings) {
    println!("appvisor dry-run");
    println!("  binary: {}", settings.spec.binary.display());
    if !settings.spec.args.is_empty() {
        println!("  args: {:?}", settings.spec.args);
    }
    println!("  env: {} entries", settings.spec.env.len());
    println!(
        "  isolate: {:?} ({})",
        settings.run.isolate,
        isolation_for(settings.run.isolate).name()
    );
    println!("  shutdown_grace: {:?}", settings.run.shutdown_grace);
    println!("  signal_capacity: {}", settings.run.signal_capacity);

    debug!("dry-run complete (no execution)");
}
