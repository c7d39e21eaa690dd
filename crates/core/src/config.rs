// SPDX-License-Identifier: MIT

use std::path::PathBuf;

/// Immutable, validated daemon configuration. Built once at startup via
/// [`ConfigBuilder`] and shared read-only for the life of the process.
#[derive(Debug, Clone)]
pub struct Config {
    pub observer_url: String,
    pub public_key_path: PathBuf,
    pub slice_name: String,
    pub mountpoint_dir: PathBuf,
    pub port: u16,
    pub poll_interval_secs: u64,
    pub debug: bool,
    pub run_once: bool,
    pub foreground: bool,
    pub logdir: Option<PathBuf>,
    pub pidfile: Option<PathBuf>,
    pub ug_only: bool,
    pub rg_only: bool,
    pub rg_public: bool,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Errors raised while validating a [`ConfigBuilder`] into a [`Config`].
///
/// This is the `ConfigInvalid` kind from the design's error taxonomy; it
/// is fatal only at startup, never encountered once the daemon is running.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required argument: {0}")]
    MissingRequired(&'static str),
    #[error("can have ug_only or rg_only, but not both")]
    MutuallyExclusiveModes,
    #[error("poll_interval must be positive")]
    NonPositivePollInterval,
    #[error("port must be positive")]
    NonPositivePort,
    #[error("invalid hex slice secret: {0}")]
    InvalidHexSecret(String),
}

/// Builder mirroring the CLI/config-file surface (`--observer_url`,
/// `--public_key`, ...). Every setter is optional; [`ConfigBuilder::build`]
/// fills defaults and then validates, matching `validate_config` in the
/// original implementation: required-arg checks, required-int checks, the
/// `UG_only`/`RG_only` exclusivity check, then default-fill.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    observer_url: Option<String>,
    public_key_path: Option<PathBuf>,
    slice_name: Option<String>,
    mountpoint_dir: Option<PathBuf>,
    port: Option<u16>,
    poll_interval_secs: Option<u64>,
    debug: bool,
    run_once: bool,
    foreground: bool,
    logdir: Option<PathBuf>,
    pidfile: Option<PathBuf>,
    ug_only: bool,
    rg_only: bool,
    rg_public: bool,
}

macro_rules! setter {
    ($name:ident, $ty:ty) => {
        pub fn $name(mut self, value: $ty) -> Self {
            self.$name = Some(value);
            self
        }
    };
}

impl ConfigBuilder {
    setter!(observer_url, String);
    setter!(public_key_path, PathBuf);
    setter!(slice_name, String);
    setter!(mountpoint_dir, PathBuf);
    setter!(port, u16);
    setter!(poll_interval_secs, u64);
    setter!(logdir, PathBuf);
    setter!(pidfile, PathBuf);

    pub fn debug(mut self, value: bool) -> Self {
        self.debug = value;
        self
    }

    pub fn run_once(mut self, value: bool) -> Self {
        self.run_once = value;
        self
    }

    pub fn foreground(mut self, value: bool) -> Self {
        self.foreground = value;
        self
    }

    pub fn ug_only(mut self, value: bool) -> Self {
        self.ug_only = value;
        self
    }

    pub fn rg_only(mut self, value: bool) -> Self {
        self.rg_only = value;
        self
    }

    pub fn rg_public(mut self, value: bool) -> Self {
        self.rg_public = value;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        let observer_url =
            self.observer_url.ok_or(ConfigError::MissingRequired("observer_url"))?;
        let public_key_path =
            self.public_key_path.ok_or(ConfigError::MissingRequired("public_key"))?;

        if self.ug_only && self.rg_only {
            return Err(ConfigError::MutuallyExclusiveModes);
        }

        let poll_interval_secs = self.poll_interval_secs.unwrap_or(43_200);
        if poll_interval_secs == 0 {
            return Err(ConfigError::NonPositivePollInterval);
        }

        let port = self.port.unwrap_or(5553);
        if port == 0 {
            return Err(ConfigError::NonPositivePort);
        }

        Ok(Config {
            observer_url,
            public_key_path,
            slice_name: self.slice_name.unwrap_or_default(),
            mountpoint_dir: self
                .mountpoint_dir
                .unwrap_or_else(|| PathBuf::from("/tmp/syndicate-mounts")),
            port,
            poll_interval_secs,
            debug: self.debug,
            run_once: self.run_once,
            foreground: self.foreground,
            logdir: self.logdir,
            pidfile: self.pidfile,
            ug_only: self.ug_only,
            rg_only: self.rg_only,
            rg_public: self.rg_public,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
