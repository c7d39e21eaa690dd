// SPDX-License-Identifier: MIT

//! Startup: parse flags, layer an optional TOML config file under them,
//! validate into a [`sliver_core::Config`], resolve the slice secret and
//! Observer public key, then hand off to the daemon runtime.

mod args;
mod config_file;
mod exit_error;

use std::path::PathBuf;

use clap::Parser;
use sliver_core::{Config, SliceSecret};

use args::Args;
use exit_error::ExitError;

fn merged_config(args: &Args, file: &config_file::FileConfig) -> Result<Config, ExitError> {
    let file = file.clone();
    let mut builder = Config::builder();
    if let Some(url) = args.observer_url.clone().or(file.observer_url) {
        builder = builder.observer_url(url);
    }
    if let Some(path) = args.public_key.clone().or(file.public_key) {
        builder = builder.public_key_path(path);
    }
    if let Some(name) = args.slice_name.clone().or(file.slice_name) {
        builder = builder.slice_name(name);
    }
    if let Some(dir) = args.mountpoint_dir.clone().or(file.mountpoint_dir) {
        builder = builder.mountpoint_dir(dir);
    }
    if let Some(port) = args.port.or(file.port) {
        builder = builder.port(port);
    }
    if let Some(timeout) = args.poll_timeout.or(file.poll_timeout) {
        builder = builder.poll_interval_secs(timeout);
    }
    if let Some(dir) = args.logdir.clone().or(file.logdir) {
        builder = builder.logdir(dir);
    }
    if let Some(path) = args.pidfile.clone().or(file.pidfile) {
        builder = builder.pidfile(path);
    }
    builder = builder
        .debug(args.debug || file.debug.unwrap_or(false))
        .run_once(args.run_once || file.run_once.unwrap_or(false))
        .foreground(args.foreground || file.foreground.unwrap_or(false))
        .ug_only(args.ug_only || file.ug_only.unwrap_or(false))
        .rg_only(args.rg_only || file.rg_only.unwrap_or(false))
        .rg_public(args.rg_public || file.rg_public.unwrap_or(false));

    builder.build().map_err(|e| ExitError::startup_failure(e.to_string()))
}

fn resolve_slice_secret(args: &Args, file_secret: Option<String>) -> Result<Option<SliceSecret>, ExitError> {
    let Some(hex_secret) = args.slice_secret.clone().or(file_secret) else {
        return Ok(None);
    };
    SliceSecret::from_hex(&hex_secret)
        .map(Some)
        .map_err(|e| ExitError::startup_failure(format!("invalid hex slice secret: {e}")))
}

fn load_public_key(path: &PathBuf) -> Result<rsa::RsaPublicKey, ExitError> {
    let pem = std::fs::read_to_string(path).map_err(|e| ExitError::from_io("reading public key", e))?;
    sliver_crypto::load_public_key(&pem).map_err(|e| ExitError::startup_failure(format!("invalid public key: {e}")))
}

fn write_pidfile(path: &PathBuf) -> Result<(), ExitError> {
    std::fs::write(path, std::process::id().to_string()).map_err(|e| ExitError::from_io("writing pidfile", e))
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .init();
}

fn watchdog_binary_path() -> Result<PathBuf, ExitError> {
    let mut path = std::env::current_exe().map_err(|e| ExitError::from_io("resolving executable path", e))?;
    path.pop();
    path.push("sliver-watchdog");
    Ok(path)
}

async fn run() -> Result<(), ExitError> {
    let args = Args::parse();

    let file = match &args.config {
        Some(path) => config_file::load(path).map_err(|e| ExitError::from_io("reading config file", e))?,
        None => config_file::FileConfig::default(),
    };

    let config = merged_config(&args, &file)?;
    init_logging(config.debug);

    if !config.foreground {
        nix::unistd::daemon(true, false).map_err(|e| ExitError::new(-(e as i32), format!("daemonizing: {e}")))?;
    }

    if let Some(pidfile) = &config.pidfile {
        write_pidfile(pidfile)?;
    }

    let public_key = load_public_key(&config.public_key_path)?;
    let initial_secret = resolve_slice_secret(&args, file.slice_secret)?;
    let watchdog_binary_path = watchdog_binary_path()?;

    sliver_daemon::run(config, public_key, watchdog_binary_path, initial_secret)
        .await
        .map_err(|e| ExitError::from_io("running agent", e))
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("sliver-agent: {error}");
        std::process::exit(error.code);
    }
}
