// SPDX-License-Identifier: MIT

use std::fmt;

/// A volume this slice is entitled to, as produced by the credential
/// pipeline. Immutable once parsed.
#[derive(Clone, PartialEq, Eq)]
pub struct VolumeDescriptor {
    pub volume_name: String,
    pub principal_id: String,
    pub syndicate_url: String,
    pub ug_port: u16,
    pub principal_private_key_pem: String,
}

impl fmt::Debug for VolumeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VolumeDescriptor")
            .field("volume_name", &self.volume_name)
            .field("principal_id", &self.principal_id)
            .field("syndicate_url", &self.syndicate_url)
            .field("ug_port", &self.ug_port)
            .field("principal_private_key_pem", &"<redacted>")
            .finish()
    }
}
