// SPDX-License-Identifier: MIT

//! Optional TOML underlay for the CLI flag surface. Values here are only
//! used where the matching flag was not given on the command line.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    pub foreground: Option<bool>,
    pub logdir: Option<PathBuf>,
    pub pidfile: Option<PathBuf>,
    pub public_key: Option<PathBuf>,
    pub slice_name: Option<String>,
    pub slice_secret: Option<String>,
    pub observer_url: Option<String>,
    pub poll_timeout: Option<u64>,
    pub mountpoint_dir: Option<PathBuf>,
    pub port: Option<u16>,
    pub debug: Option<bool>,
    pub run_once: Option<bool>,
    pub rg_only: Option<bool>,
    pub ug_only: Option<bool>,
    pub rg_public: Option<bool>,
}

pub fn load(path: &std::path::Path) -> std::io::Result<FileConfig> {
    let raw = std::fs::read_to_string(path)?;
    toml::from_str(&raw).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
