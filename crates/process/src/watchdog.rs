// SPDX-License-Identifier: MIT

//! Child-process supervision: spawn, respawn-on-exit with flap control,
//! and a graceful-then-forceful shutdown sequence. This is a library so it
//! can be driven in tests without forking a real binary; `sliver-watchdog`
//! is the thin executable that wires it to a real child command.

use std::process::ExitStatus;
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::process::Child;
use tokio_util::sync::CancellationToken;

use crate::error::ProcessError;

/// Below this time-since-last-spawn, a respawn is considered "flapping".
pub const FLAP_THRESHOLD: Duration = Duration::from_secs(600);
/// Above this time-since-last-spawn, the flap delay resets to its floor.
pub const FLAP_RESET: Duration = Duration::from_secs(3600);
const FLAP_DELAY_FLOOR: Duration = Duration::from_secs(1);

/// Given how long the child ran and the current flap delay, decide whether
/// to wait before respawning and what the delay should be next time.
/// Returns `(next_flap_delay, wait_before_respawn)`.
pub fn flap_wait(elapsed_since_last_spawn: Duration, mut flap_delay: Duration) -> (Duration, Option<Duration>) {
    if elapsed_since_last_spawn > FLAP_RESET {
        flap_delay = FLAP_DELAY_FLOOR;
    }
    if elapsed_since_last_spawn < FLAP_THRESHOLD {
        let wait = flap_delay;
        flap_delay = std::cmp::min(flap_delay * 2, FLAP_RESET);
        (flap_delay, Some(wait))
    } else {
        (flap_delay, None)
    }
}

/// Send the child through `SIGTERM`, then poll up to 3 times at 1s
/// intervals, then `SIGKILL` if it's still alive.
pub async fn stop_child(child: &mut Child) -> Result<(), ProcessError> {
    let Some(raw_pid) = child.id() else {
        return Ok(());
    };
    let pid = Pid::from_raw(raw_pid as i32);

    match signal::kill(pid, Signal::SIGTERM) {
        Ok(()) => {}
        Err(nix::Error::ESRCH) => return Ok(()),
        Err(source) => return Err(ProcessError::StopFailed { pid: raw_pid as i32, source }),
    }

    for _ in 0..3 {
        if child.try_wait().map_err(ProcessError::WaitFailed)?.is_some() {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    if child.try_wait().map_err(ProcessError::WaitFailed)?.is_none() {
        match signal::kill(pid, Signal::SIGKILL) {
            Ok(()) | Err(nix::Error::ESRCH) => {}
            Err(source) => return Err(ProcessError::StopFailed { pid: raw_pid as i32, source }),
        }
        let _ = child.wait().await;
    }
    Ok(())
}

/// Decides whether a qualifying termination should trigger a respawn.
/// Default: respawn unconditionally, matching `check_exit_status` called
/// with no restricting status/signal list.
pub fn default_respawn_predicate(_status: &ExitStatus) -> bool {
    true
}

/// Supervises a single child process across respawns until told to stop.
pub struct Watchdog<F, Fut> {
    spawn: F,
    respawn: Box<dyn Fn(&ExitStatus) -> bool + Send>,
    _fut: std::marker::PhantomData<Fut>,
}

impl<F, Fut> Watchdog<F, Fut>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = std::io::Result<Child>>,
{
    pub fn new(spawn: F) -> Self {
        Self { spawn, respawn: Box::new(default_respawn_predicate), _fut: std::marker::PhantomData }
    }

    pub fn with_respawn_predicate(mut self, predicate: impl Fn(&ExitStatus) -> bool + Send + 'static) -> Self {
        self.respawn = Box::new(predicate);
        self
    }

    /// Run the supervision loop until the child exits without qualifying
    /// for respawn, or `cancel` fires (in which case the child is stopped
    /// gracefully and `None` is returned).
    pub async fn run(&self, cancel: CancellationToken) -> Result<Option<ExitStatus>, ProcessError> {
        let mut child = (self.spawn)().await.map_err(ProcessError::SpawnFailed)?;
        let mut last_spawn = tokio::time::Instant::now();
        let mut flap_delay = FLAP_DELAY_FLOOR;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    stop_child(&mut child).await?;
                    return Ok(None);
                }
                wait_result = child.wait() => {
                    let status = wait_result.map_err(ProcessError::WaitFailed)?;
                    tracing::info!(exit_status = ?status, "child exited");

                    if !(self.respawn)(&status) {
                        return Ok(Some(status));
                    }

                    let elapsed = last_spawn.elapsed();
                    let (next_delay, wait) = flap_wait(elapsed, flap_delay);
                    flap_delay = next_delay;
                    if let Some(delay) = wait {
                        tracing::warn!(?delay, "child respawning too quickly, waiting");
                        tokio::time::sleep(delay).await;
                    }

                    child = (self.spawn)().await.map_err(ProcessError::SpawnFailed)?;
                    last_spawn = tokio::time::Instant::now();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_wait_when_child_ran_past_threshold() {
        let (_, wait) = flap_wait(Duration::from_secs(601), Duration::from_secs(1));
        assert_eq!(wait, None);
    }

    #[test]
    fn waits_and_doubles_when_flapping() {
        let (next, wait) = flap_wait(Duration::from_secs(1), Duration::from_secs(4));
        assert_eq!(wait, Some(Duration::from_secs(4)));
        assert_eq!(next, Duration::from_secs(8));
    }

    #[test]
    fn doubling_is_capped_at_flap_reset() {
        let (next, wait) = flap_wait(Duration::from_secs(1), FLAP_RESET);
        assert_eq!(wait, Some(FLAP_RESET));
        assert_eq!(next, FLAP_RESET);
    }

    #[test]
    fn delay_resets_after_flap_reset_elapsed() {
        let (next, wait) = flap_wait(Duration::from_secs(3601), Duration::from_secs(64));
        assert_eq!(wait, None);
        assert_eq!(next, Duration::from_secs(64), "only a subsequent flapping respawn applies the reset floor");
    }

    #[tokio::test]
    async fn respawns_child_on_exit_until_cancelled() {
        let watchdog = Watchdog::new(|| std::future::ready(tokio::process::Command::new("true").spawn()));
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        let handle = tokio::spawn(async move { watchdog.run(cancel_clone).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        let result = handle.await.expect("join").expect("run");
        assert_eq!(result, None);
    }
}
