// SPDX-License-Identifier: MIT

//! Reaps watchdog processes the agent itself spawned, so they never
//! accumulate as zombies. It does not restart anything — each Watchdog
//! restarts its own child; this only waits on the watchdogs.

use std::time::Duration;

use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use tokio_util::sync::CancellationToken;

/// Blocks on wait-for-any-child, logging each reaped pid, until
/// `cancel` fires or there are no children left to wait for (`ECHILD`),
/// in which case it sleeps 1s and retries — a new watchdog may be spawned
/// after this one exits.
pub async fn run(cancel: CancellationToken) {
    loop {
        if cancel.is_cancelled() {
            return;
        }

        let outcome = tokio::task::spawn_blocking(|| waitpid(Pid::from_raw(-1), Some(WaitPidFlag::empty())))
            .await
            .unwrap_or(Err(nix::Error::ECHILD));

        match outcome {
            Ok(WaitStatus::Exited(pid, code)) => {
                tracing::info!(pid = pid.as_raw(), exit_code = code, "reaped watchdog");
            }
            Ok(WaitStatus::Signaled(pid, signal, _)) => {
                tracing::info!(pid = pid.as_raw(), ?signal, "reaped signaled watchdog");
            }
            Ok(_) => {}
            Err(nix::Error::ECHILD) => {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                    _ = cancel.cancelled() => return,
                }
            }
            Err(source) => {
                tracing::warn!(%source, "waitpid failed");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}
