// SPDX-License-Identifier: MIT

/// Failures from sending a signal to, or waiting on, an OS process.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("process {0} does not exist")]
    NoSuchProcess(i32),

    #[error("failed to signal process {pid}: {source}")]
    StopFailed { pid: i32, #[source] source: nix::Error },

    #[error("failed to spawn child: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("failed to wait on child: {0}")]
    WaitFailed(#[source] std::io::Error),
}
