// SPDX-License-Identifier: MIT

//! Process-table introspection and OS-process supervision: finding live
//! watchdogs, running the spawn/respawn/flap-control loop, and reaping
//! watchdogs the agent spawned.

mod error;
mod probe;
mod reaper;
mod registry;
mod spawn_spec;
pub mod watchdog;

pub use error::ProcessError;
pub use probe::{ProcessInfo, ProcessProbe};
pub use reaper::run as run_reaper;
pub use registry::{find_in, list_in, GatewayRegistry};
pub use spawn_spec::{split_sensitive_args, GatewaySpawnSpec};
pub use watchdog::{stop_child, Watchdog};
