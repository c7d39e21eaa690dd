// SPDX-License-Identifier: MIT

//! Wires PollLoop, PushEndpoint, and the Reaper onto one
//! `CancellationToken` and runs them as cooperating tasks until a
//! termination signal arrives (or, in `--run_once` mode, for exactly one
//! poll+reconcile cycle).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rsa::RsaPublicKey;
use sliver_core::{Config, SecretStore, SliceSecret};
use tokio_util::sync::CancellationToken;

use crate::observer::Observer;
use crate::poll_loop::PollLoop;
use crate::push_endpoint;
use crate::reconciler::{OsGatewaySupervisor, Reconciler};

/// Runs the full agent until a termination signal arrives. Returns once
/// every task has wound down.
pub async fn run(config: Config, public_key: RsaPublicKey, watchdog_binary_path: PathBuf, initial_secret: Option<SliceSecret>) -> std::io::Result<()> {
    let cancel = CancellationToken::new();
    let secret_store = match initial_secret {
        Some(secret) => SecretStore::with_secret(secret),
        None => SecretStore::new(),
    };
    let observer = Arc::new(Observer::new(config.observer_url.clone(), config.slice_name.clone(), public_key));
    let supervisor = OsGatewaySupervisor::new(watchdog_binary_path);
    let local_hostname = local_hostname();
    let reconciler = Arc::new(Reconciler::new(config.clone(), secret_store.clone(), supervisor, local_hostname, Arc::clone(&observer)));
    let poll_loop = PollLoop::new(Arc::clone(&observer), secret_store.clone(), Arc::clone(&reconciler), Duration::from_secs(config.poll_interval_secs));

    if config.run_once {
        poll_loop.run_once().await;
        return Ok(());
    }

    let reaper_cancel = cancel.clone();
    let reaper = tokio::spawn(sliver_process::run_reaper(reaper_cancel));

    let poll_cancel = cancel.clone();
    let poll_task = tokio::spawn(async move { poll_loop.run(poll_cancel).await });

    let router = push_endpoint::router(observer, Arc::clone(&reconciler), secret_store);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    let server_cancel = cancel.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { server_cancel.cancelled().await })
            .await
    });

    wait_for_termination().await;
    cancel.cancel();

    let _ = poll_task.await;
    let _ = server.await;
    let _ = reaper.await;
    Ok(())
}

fn local_hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string())
}

async fn wait_for_termination() {
    let mut terminate = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(signal) => signal,
        Err(error) => {
            tracing::error!(%error, "failed to install SIGTERM handler");
            std::future::pending().await
        }
    };
    tokio::select! {
        _ = terminate.recv() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}
