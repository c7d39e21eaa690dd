// SPDX-License-Identifier: MIT

use std::fmt;

/// The per-volume and per-reconcile-call error taxonomy described in the
/// design's error-handling section. Every variant is deliberately named
/// after the failure *kind*, not the call site, so log lines and exit
/// behavior stay traceable back to this list.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The slice secret has not been obtained yet; transient, retry next cycle.
    #[error("no slice secret cached")]
    NoSecret,

    /// Another reconcile is already running; this call is dropped, not queued.
    #[error("reconcile already in progress")]
    Busy,

    /// More than one watchdog matched the same (kind, volume[, mountpoint]).
    #[error("multiple watchdogs found for {0}")]
    Transient(String),

    /// The gateway child process could not be launched (after the retry).
    #[error("failed to spawn {kind} watchdog for volume {volume}: {reason}")]
    SpawnFailed { kind: &'static str, volume: String, reason: String },

    /// A running watchdog could not be stopped for a reason other than
    /// "already gone" (`ESRCH`, which is treated as success).
    #[error("failed to stop watchdog pid {pid}: {reason}")]
    StopFailed { pid: i32, reason: String },

    /// Creating or probing the mountpoint directory failed for a reason
    /// other than `EEXIST`.
    #[error("failed to prepare mountpoint {path}: {source}")]
    Mountpoint { path: String, #[source] source: std::io::Error },
}

/// Aggregate result of a single `reconcile()` call, distinguishing the
/// three outcomes the design calls out: all volumes reconciled cleanly,
/// some failed (but were isolated), or the whole call was aborted before
/// any per-volume work started.
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// Every targeted volume ended in the desired state.
    Ok { volumes: usize },
    /// Per-volume failures were isolated; siblings still ran.
    PartialFailure { volumes: usize, failed: Vec<(String, ReconcileError)> },
    /// The call never got past its precondition (`NoSecret`) or lock
    /// acquisition (`Busy`).
    Aborted(ReconcileError),
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileOutcome::Ok { volumes } => write!(f, "reconciled {volumes} volume(s)"),
            ReconcileOutcome::PartialFailure { volumes, failed } => {
                write!(f, "reconciled {volumes} volume(s), {} failed", failed.len())
            }
            ReconcileOutcome::Aborted(e) => write!(f, "aborted: {e}"),
        }
    }
}
