// SPDX-License-Identifier: MIT

//! The credential pipeline: verifying Observer envelopes, unsealing their
//! payloads under the slice secret, and parsing the resulting volume
//! records. Nothing downstream of [`unseal`] is trusted until it has
//! passed through here.

mod envelope;
mod error;
mod record;
mod seal;

pub use envelope::{load_public_key, verify_json};
pub use error::PipelineError;
pub use record::{parse_volume_list, parse_volume_record};
pub use seal::unseal;
