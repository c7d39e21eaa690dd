// SPDX-License-Identifier: MIT

//! Shared domain types for the sliver agent: configuration, the cached
//! slice secret, volume descriptors, and gateway identity.
//!
//! This crate has no I/O of its own — it is the vocabulary the other
//! crates (`sliver-crypto`, `sliver-process`, `sliver-daemon`) share.

mod config;
mod error;
mod gateway;
mod secret;
mod volume;

pub use config::{Config, ConfigBuilder, ConfigError};
pub use error::{ReconcileError, ReconcileOutcome};
pub use gateway::{gateway_key_password, gateway_name, mountpoint_path, GatewayKind};
pub use secret::{SecretStore, SliceSecret};
pub use volume::VolumeDescriptor;
