// SPDX-License-Identifier: MIT

//! The sliver agent's runtime: fetching the target volume set from the
//! Observer (by poll and by push) and driving the Reconciler towards it.

mod error;
mod observer;
mod orchestrator;
mod poll_loop;
mod push_endpoint;
mod reconciler;

pub use error::ObserverError;
pub use observer::Observer;
pub use orchestrator::run;
pub use poll_loop::PollLoop;
pub use reconciler::{GatewaySupervisor, OsGatewaySupervisor, Reconciler};
