// SPDX-License-Identifier: MIT

use super::*;

fn minimal() -> ConfigBuilder {
    Config::builder()
        .observer_url("https://obs.test".to_string())
        .public_key_path(PathBuf::from("/etc/sliver/observer.pub"))
}

#[test]
fn fills_defaults() {
    let cfg = minimal().build().unwrap();
    assert_eq!(cfg.port, 5553);
    assert_eq!(cfg.poll_interval_secs, 43_200);
    assert_eq!(cfg.mountpoint_dir, PathBuf::from("/tmp/syndicate-mounts"));
    assert!(!cfg.ug_only);
    assert!(!cfg.rg_only);
}

#[test]
fn missing_observer_url_is_invalid() {
    let err = Config::builder()
        .public_key_path(PathBuf::from("/etc/sliver/observer.pub"))
        .build()
        .unwrap_err();
    assert_eq!(err, ConfigError::MissingRequired("observer_url"));
}

#[test]
fn missing_public_key_is_invalid() {
    let err = Config::builder().observer_url("https://obs.test".to_string()).build().unwrap_err();
    assert_eq!(err, ConfigError::MissingRequired("public_key"));
}

#[test]
fn ug_only_and_rg_only_are_mutually_exclusive() {
    let err = minimal().ug_only(true).rg_only(true).build().unwrap_err();
    assert_eq!(err, ConfigError::MutuallyExclusiveModes);
}

#[test]
fn zero_port_is_invalid() {
    let err = minimal().port(0).build().unwrap_err();
    assert_eq!(err, ConfigError::NonPositivePort);
}

#[test]
fn zero_poll_interval_is_invalid() {
    let err = minimal().poll_interval_secs(0).build().unwrap_err();
    assert_eq!(err, ConfigError::NonPositivePollInterval);
}
