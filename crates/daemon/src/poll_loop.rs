// SPDX-License-Identifier: MIT

//! Periodically pulls the target volume set from the Observer and hands
//! it to the Reconciler. Never exits except on cancellation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sliver_core::{SecretStore, SliceSecret, VolumeDescriptor};
use tokio_util::sync::CancellationToken;

use crate::observer::Observer;
use crate::reconciler::{GatewaySupervisor, Reconciler};

pub struct PollLoop<S: GatewaySupervisor> {
    observer: Arc<Observer>,
    secret_store: SecretStore,
    reconciler: Arc<Reconciler<S>>,
    poll_interval: Duration,
}

impl<S: GatewaySupervisor> PollLoop<S> {
    pub fn new(observer: Arc<Observer>, secret_store: SecretStore, reconciler: Arc<Reconciler<S>>, poll_interval: Duration) -> Self {
        Self { observer, secret_store, reconciler, poll_interval }
    }

    async fn fetch_target(&self) -> HashMap<String, VolumeDescriptor> {
        let Some(secret) = self.ensure_secret().await else {
            return HashMap::new();
        };

        let volume_names = match self.observer.fetch_volume_list().await {
            Ok(names) => names,
            Err(error) => {
                tracing::warn!(%error, "failed to fetch volume list");
                return HashMap::new();
            }
        };

        let mut target = HashMap::new();
        for volume_name in volume_names {
            match self.observer.fetch_volume(&secret, &volume_name).await {
                Ok(descriptor) => {
                    target.insert(volume_name, descriptor);
                }
                Err(error) => {
                    tracing::warn!(%error, volume = volume_name, "skipping malformed volume record");
                }
            }
        }
        target
    }

    async fn ensure_secret(&self) -> Option<SliceSecret> {
        if let Some(secret) = self.secret_store.get() {
            return Some(secret);
        }
        match self.observer.fetch_secret().await {
            Ok(secret) => {
                self.secret_store.set(secret.clone());
                Some(secret)
            }
            Err(error) => {
                tracing::warn!(%error, "failed to fetch slice secret");
                None
            }
        }
    }

    /// Run one poll+reconcile cycle without sleeping. Used directly by
    /// `--run_once` and as the body of [`PollLoop::run`]'s loop.
    pub async fn run_once(&self) {
        let target = self.fetch_target().await;
        let outcome = self.reconciler.reconcile(&target).await;
        tracing::info!(%outcome, "poll cycle complete");
    }

    /// Run forever, sleeping `poll_interval` between cycles, until
    /// `cancel` fires. Cancellation is only observed between cycles, per
    /// the suspension-point model: a cycle in flight always finishes.
    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            self.run_once().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}
