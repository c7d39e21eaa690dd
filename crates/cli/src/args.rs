// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use clap::Parser;

/// Per-host sliver agent: reconciles running gateway watchdogs against
/// the volume set an Observer publishes for this slice.
#[derive(Debug, Parser)]
#[command(name = "sliver-agent")]
pub struct Args {
    /// Optional TOML config file, merged under these flags (flags win).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Stay attached to the controlling terminal instead of daemonizing.
    #[arg(long = "foreground")]
    pub foreground: bool,

    #[arg(long = "logdir")]
    pub logdir: Option<PathBuf>,

    #[arg(long = "pidfile")]
    pub pidfile: Option<PathBuf>,

    /// PEM file holding the Observer's RSA public key.
    #[arg(long = "public_key")]
    pub public_key: Option<PathBuf>,

    #[arg(long = "slice_name")]
    pub slice_name: Option<String>,

    /// Hex-encoded slice secret. If absent, fetched from the Observer.
    #[arg(long = "slice_secret")]
    pub slice_secret: Option<String>,

    #[arg(long = "observer_url")]
    pub observer_url: Option<String>,

    #[arg(long = "poll_timeout")]
    pub poll_timeout: Option<u64>,

    #[arg(long = "mountpoint_dir")]
    pub mountpoint_dir: Option<PathBuf>,

    #[arg(long = "port")]
    pub port: Option<u16>,

    #[arg(long = "debug")]
    pub debug: bool,

    /// Run exactly one poll+reconcile cycle, then exit.
    #[arg(long = "run_once")]
    pub run_once: bool,

    #[arg(long = "RG_only")]
    pub rg_only: bool,

    #[arg(long = "UG_only")]
    pub ug_only: bool,

    #[arg(long = "RG_public")]
    pub rg_public: bool,
}
