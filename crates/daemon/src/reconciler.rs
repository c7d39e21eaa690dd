// SPDX-License-Identifier: MIT

//! Drives the running watchdog set towards a target map of volumes. See
//! the component design for the per-volume algorithm this implements.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use sliver_core::{
    gateway_key_password, gateway_name, mountpoint_path, Config, GatewayKind, ReconcileError,
    ReconcileOutcome, SecretStore, VolumeDescriptor,
};
use sliver_process::{GatewayRegistry, GatewaySpawnSpec};

use crate::observer::Observer;

const LOOPBACK_HOSTNAME: &str = "localhost";
const NAMESPACE: &str = "OpenCloud";

/// Everything the Reconciler needs to find, start, and stop watchdogs.
/// Abstracted behind a trait so tests can exercise the per-volume
/// algorithm without touching the real process table.
pub trait GatewaySupervisor: Send + Sync {
    fn find(&self, watchdog_binary: &str, required_attrs: &HashMap<String, String>) -> Vec<i32>;
    fn list(&self, watchdog_binary: &str) -> Vec<(i32, HashMap<String, String>)>;
    fn spawn(&self, spec: &GatewaySpawnSpec) -> std::io::Result<i32>;
    fn stop(&self, pid: i32) -> Result<(), ReconcileError>;
}

/// Supervisor backed by the real OS process table and a real
/// `sliver-watchdog` binary.
pub struct OsGatewaySupervisor {
    registry: GatewayRegistry,
    watchdog_binary_path: PathBuf,
}

impl OsGatewaySupervisor {
    pub fn new(watchdog_binary_path: PathBuf) -> Self {
        Self { registry: GatewayRegistry::new(), watchdog_binary_path }
    }
}

impl GatewaySupervisor for OsGatewaySupervisor {
    fn find(&self, watchdog_binary: &str, required_attrs: &HashMap<String, String>) -> Vec<i32> {
        self.registry.find(watchdog_binary, required_attrs)
    }

    fn list(&self, watchdog_binary: &str) -> Vec<(i32, HashMap<String, String>)> {
        self.registry.list(watchdog_binary)
    }

    fn spawn(&self, spec: &GatewaySpawnSpec) -> std::io::Result<i32> {
        let mut child = std::process::Command::new(&self.watchdog_binary_path)
            .stdin(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            let payload = serde_json::to_vec(spec).unwrap_or_default();
            stdin.write_all(&payload)?;
            // stdin drops (and closes) here, signalling EOF to the watchdog.
        }
        // Deliberately not waited here: the agent's Reaper reaps watchdog
        // exits via a process-wide wait-for-any-child loop.
        Ok(child.id() as i32)
    }

    fn stop(&self, pid: i32) -> Result<(), ReconcileError> {
        match signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
            Ok(()) | Err(nix::Error::ESRCH) => Ok(()),
            Err(source) => Err(ReconcileError::StopFailed { pid, reason: source.to_string() }),
        }
    }
}

struct DerivedNames {
    ug_name: String,
    rg_name: String,
    ug_key_password: String,
    rg_key_password: String,
    mountpoint: PathBuf,
}

pub struct Reconciler<S: GatewaySupervisor> {
    config: Config,
    secret_store: SecretStore,
    supervisor: S,
    lock: Mutex<()>,
    local_hostname: String,
    observer: Arc<Observer>,
}

impl<S: GatewaySupervisor> Reconciler<S> {
    pub fn new(config: Config, secret_store: SecretStore, supervisor: S, local_hostname: String, observer: Arc<Observer>) -> Self {
        Self { config, secret_store, supervisor, lock: Mutex::new(()), local_hostname, observer }
    }

    fn derive_names(&self, volume_name: &str, secret: &[u8]) -> DerivedNames {
        let rg_hostname = if self.config.rg_public { self.local_hostname.clone() } else { LOOPBACK_HOSTNAME.to_string() };
        let ug_name = gateway_name(NAMESPACE, GatewayKind::Ug, volume_name, &self.local_hostname);
        let rg_name = gateway_name(NAMESPACE, GatewayKind::Rg, volume_name, &rg_hostname);
        DerivedNames {
            ug_key_password: gateway_key_password(&ug_name, secret),
            rg_key_password: gateway_key_password(&rg_name, secret),
            ug_name,
            rg_name,
            mountpoint: mountpoint_path(&self.config.mountpoint_dir, volume_name),
        }
    }

    fn ensure_mountpoint(&self, path: &Path) -> Result<(), ReconcileError> {
        match std::fs::create_dir_all(path) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
            Err(source) => Err(ReconcileError::Mountpoint { path: path.display().to_string(), source }),
        }
    }

    /// Probe + spawn for one gateway kind. Returns `Ok(())` if exactly one
    /// instance ends up running (already running, or freshly spawned).
    fn ensure_running(&self, kind: GatewayKind, required_attrs: &HashMap<String, String>, spec: impl FnOnce() -> GatewaySpawnSpec) -> Result<(), ReconcileError> {
        let binary = kind.watchdog_binary();
        let found = self.supervisor.find(binary, required_attrs);
        match found.len() {
            1 => Ok(()),
            n if n > 1 => Err(ReconcileError::Transient(format!("{binary} {required_attrs:?}"))),
            _ => {
                let spawn_spec = spec();
                self.supervisor.spawn(&spawn_spec).map_err(|e| ReconcileError::SpawnFailed {
                    kind: kind_label(kind),
                    volume: required_attrs.get("volume").cloned().unwrap_or_default(),
                    reason: e.to_string(),
                })?;
                Ok(())
            }
        }
    }

    async fn reconcile_volume(&self, volume_name: &str, descriptor: &VolumeDescriptor, secret: &[u8]) -> Result<(), ReconcileError> {
        let names = self.derive_names(volume_name, secret);
        self.ensure_mountpoint(&names.mountpoint)?;

        if !self.config.ug_only {
            let mut rg_attrs = HashMap::new();
            rg_attrs.insert("volume".to_string(), volume_name.to_string());
            self.ensure_running(GatewayKind::Rg, &rg_attrs, || {
                rg_spawn_spec(descriptor, volume_name, &names)
            })?;
        }

        if !self.config.rg_only {
            let mut ug_attrs = HashMap::new();
            ug_attrs.insert("volume".to_string(), volume_name.to_string());
            ug_attrs.insert("mountpoint".to_string(), names.mountpoint.display().to_string());
            let first_attempt = self.ensure_running(GatewayKind::Ug, &ug_attrs, || {
                ug_spawn_spec(descriptor, volume_name, &names)
            });
            if let Err(ReconcileError::SpawnFailed { .. }) = &first_attempt {
                tracing::warn!(volume = volume_name, "UG spawn failed, registering gateway with observer before retry");
                self.observer
                    .ensure_ug_exists(
                        &descriptor.principal_id,
                        volume_name,
                        &names.ug_name,
                        &self.local_hostname,
                        descriptor.ug_port,
                        &names.ug_key_password,
                    )
                    .await
                    .map_err(|error| ReconcileError::SpawnFailed {
                        kind: kind_label(GatewayKind::Ug),
                        volume: volume_name.to_string(),
                        reason: format!("ensure-exists failed: {error}"),
                    })?;
                return self.ensure_running(GatewayKind::Ug, &ug_attrs, || ug_spawn_spec(descriptor, volume_name, &names));
            }
            first_attempt?;
        }

        Ok(())
    }

    fn stop_unauthorized(&self, target: &HashMap<String, VolumeDescriptor>) {
        for kind in [GatewayKind::Rg, GatewayKind::Ug] {
            for (pid, attrs) in self.supervisor.list(kind.watchdog_binary()) {
                let Some(volume) = attrs.get("volume") else { continue };
                if !target.contains_key(volume) {
                    if let Err(error) = self.supervisor.stop(pid) {
                        tracing::warn!(%error, pid, volume, "failed to stop stale watchdog");
                    } else {
                        tracing::info!(pid, volume, kind = %kind, "stopped stale watchdog");
                    }
                }
            }
        }
    }

    /// Reconcile the running watchdog set towards `target`. Non-blocking:
    /// returns `Aborted(Busy)` immediately if another reconcile is active.
    pub async fn reconcile(&self, target: &HashMap<String, VolumeDescriptor>) -> ReconcileOutcome {
        let Some(_guard) = self.lock.try_lock() else {
            return ReconcileOutcome::Aborted(ReconcileError::Busy);
        };

        let Some(secret) = self.secret_store.get() else {
            return ReconcileOutcome::Aborted(ReconcileError::NoSecret);
        };

        let mut failed = Vec::new();
        for (volume_name, descriptor) in target {
            if let Err(error) = self.reconcile_volume(volume_name, descriptor, secret.as_bytes()).await {
                tracing::warn!(%error, volume = volume_name, "reconcile failed for volume");
                failed.push((volume_name.clone(), error));
            }
        }

        self.stop_unauthorized(target);

        if failed.is_empty() {
            ReconcileOutcome::Ok { volumes: target.len() }
        } else {
            ReconcileOutcome::PartialFailure { volumes: target.len(), failed }
        }
    }
}

fn kind_label(kind: GatewayKind) -> &'static str {
    match kind {
        GatewayKind::Ug => "UG",
        GatewayKind::Rg => "RG",
    }
}

fn rg_spawn_spec(descriptor: &VolumeDescriptor, volume_name: &str, names: &DerivedNames) -> GatewaySpawnSpec {
    GatewaySpawnSpec {
        program: "syndicate-rg".to_string(),
        args: vec![
            "-m".to_string(), descriptor.syndicate_url.clone(),
            "-u".to_string(), descriptor.principal_id.clone(),
            "-v".to_string(), volume_name.to_string(),
            "-g".to_string(), names.rg_name.clone(),
            "-K".to_string(), names.rg_key_password.clone(),
            "-P".to_string(), descriptor.principal_private_key_pem.clone(),
        ],
        watchdog_binary: GatewayKind::Rg.watchdog_binary().to_string(),
        title_attrs: [("volume".to_string(), volume_name.to_string())].into_iter().collect(),
    }
}

fn ug_spawn_spec(descriptor: &VolumeDescriptor, volume_name: &str, names: &DerivedNames) -> GatewaySpawnSpec {
    GatewaySpawnSpec {
        program: "syndicate-ug".to_string(),
        args: vec![
            "-m".to_string(), descriptor.syndicate_url.clone(),
            "-u".to_string(), descriptor.principal_id.clone(),
            "-v".to_string(), volume_name.to_string(),
            "-g".to_string(), names.ug_name.clone(),
            "-K".to_string(), names.ug_key_password.clone(),
            "-P".to_string(), descriptor.principal_private_key_pem.clone(),
            names.mountpoint.display().to_string(),
        ],
        watchdog_binary: GatewayKind::Ug.watchdog_binary().to_string(),
        title_attrs: [
            ("volume".to_string(), volume_name.to_string()),
            ("mountpoint".to_string(), names.mountpoint.display().to_string()),
        ]
        .into_iter()
        .collect(),
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
