// SPDX-License-Identifier: MIT

use sysinfo::System;

/// One row of the OS process table, as seen by [`ProcessProbe`].
#[derive(Debug, Clone)]
pub struct ProcessInfo {
    pub pid: i32,
    /// Raw argv as reported by the OS. `cmdline[0]` is what watchdogs
    /// rewrite their title into, so it's the only element
    /// [`crate::registry::GatewayRegistry`] inspects.
    pub cmdline: Vec<String>,
}

/// Enumerates the live process table. Refreshed fresh on every call — the
/// process table is the only source of truth for which watchdogs are
/// running, so there's nothing useful to cache across calls.
#[derive(Debug, Default)]
pub struct ProcessProbe;

impl ProcessProbe {
    pub fn new() -> Self {
        Self
    }

    pub fn list_processes(&self) -> Vec<ProcessInfo> {
        let mut system = System::new();
        system.refresh_processes(sysinfo::ProcessesToUpdate::All, true);
        system
            .processes()
            .values()
            .map(|process| ProcessInfo {
                pid: process.pid().as_u32() as i32,
                cmdline: process.cmd().iter().map(|s| s.to_string_lossy().into_owned()).collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_at_least_the_current_process() {
        let probe = ProcessProbe::new();
        let pid = std::process::id() as i32;
        let processes = probe.list_processes();
        assert!(processes.iter().any(|p| p.pid == pid));
    }
}
