// SPDX-License-Identifier: MIT

//! Thin supervisor binary. Reads a [`GatewaySpawnSpec`] from its own
//! stdin, rewrites its process title for discovery, and runs
//! `sliver_process::Watchdog` over the real gateway binary.

use std::io::Read;
use std::process::{ExitStatus, Stdio};

use sliver_process::{split_sensitive_args, GatewaySpawnSpec, Watchdog};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

fn read_spec_from_stdin() -> std::io::Result<GatewaySpawnSpec> {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    serde_json::from_str(&buf).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

fn exit_code_for(status: Option<ExitStatus>) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match status {
        None => 0,
        Some(status) => status.code().unwrap_or_else(|| -status.signal().unwrap_or(1)),
    }
}

async fn spawn_gateway_child(spec: &GatewaySpawnSpec) -> std::io::Result<tokio::process::Child> {
    let (non_sensitive_args, sensitive) = split_sensitive_args(&spec.args);
    let mut child = tokio::process::Command::new(&spec.program)
        .args(&non_sensitive_args)
        .stdin(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        let payload = serde_json::to_vec(&sensitive).unwrap_or_default();
        let _ = stdin.write_all(&payload).await;
        let _ = stdin.shutdown().await;
    }

    Ok(child)
}

async fn wait_for_terminate() {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut term) => {
            term.recv().await;
        }
        Err(error) => {
            tracing::error!(%error, "failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let spec = match read_spec_from_stdin() {
        Ok(spec) => spec,
        Err(error) => {
            tracing::error!(%error, "failed to read gateway spawn spec from stdin");
            std::process::exit(1);
        }
    };

    setproctitle::set_title(spec.process_title());

    let cancel = CancellationToken::new();
    let watchdog_cancel = cancel.clone();
    tokio::spawn(async move {
        wait_for_terminate().await;
        watchdog_cancel.cancel();
    });

    let spec_for_spawn = spec.clone();
    let watchdog = Watchdog::new(move || {
        let spec = spec_for_spawn.clone();
        async move { spawn_gateway_child(&spec).await }
    });

    let result = watchdog.run(cancel).await;
    match result {
        Ok(status) => std::process::exit(exit_code_for(status)),
        Err(error) => {
            tracing::error!(%error, "watchdog supervision failed");
            std::process::exit(1);
        }
    }
}
