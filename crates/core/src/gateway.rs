// SPDX-License-Identifier: MIT

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::fmt;

/// Which half of a volume's gateway pair an instance is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayKind {
    /// Client-side gateway providing a filesystem mountpoint.
    Ug,
    /// Server-side gateway that stores volume data.
    Rg,
}

impl GatewayKind {
    /// The `attr:`-encoded watchdog binary name [`sliver-process::registry`]
    /// matches against, and the name [`sliver-watchdog`] rewrites its own
    /// process title to.
    pub fn watchdog_binary(self) -> &'static str {
        match self {
            GatewayKind::Ug => "syndicate-ug",
            GatewayKind::Rg => "syndicate-rg",
        }
    }
}

impl fmt::Display for GatewayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GatewayKind::Ug => "UG",
            GatewayKind::Rg => "RG",
        })
    }
}

/// Deterministic gateway name, reproducing `provisioning.make_gateway_name`
/// from the original: a stable hash of the identifying tuple, prefixed
/// with the kind so collisions across UG/RG are impossible even if the
/// hash collided. The original's exact algorithm was not recoverable from
/// the retained source; this is a documented open-question decision (see
/// DESIGN.md), not a guess at unseen spec behavior — what's required is
/// only that it be a stable pure function of the four inputs.
pub fn gateway_name(namespace: &str, kind: GatewayKind, volume_name: &str, hostname: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b"/");
    hasher.update(kind.to_string().as_bytes());
    hasher.update(b"/");
    hasher.update(volume_name.as_bytes());
    hasher.update(b"/");
    hasher.update(hostname.as_bytes());
    let digest = hasher.finalize();
    format!("{kind}-{}", hex::encode(&digest[..12]))
}

type HmacSha256 = Hmac<Sha256>;

/// Per-gateway private-key password, deterministic in `(gateway_name,
/// slice_secret)` — mirrors `provisioning.make_gateway_private_key_password`.
pub fn gateway_key_password(gateway_name: &str, slice_secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(slice_secret).expect("HMAC accepts any key length");
    mac.update(gateway_name.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Derive the UG mountpoint path: `mountpoint_root/volume_name` with `/`
/// replaced by `.` in the volume name, matching `make_UG_mountpoint_path`.
pub fn mountpoint_path(mountpoint_root: &std::path::Path, volume_name: &str) -> std::path::PathBuf {
    let sanitized = volume_name.replace('/', ".");
    mountpoint_root.join(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_name_is_deterministic() {
        let a = gateway_name("OpenCloud", GatewayKind::Ug, "v1", "host1");
        let b = gateway_name("OpenCloud", GatewayKind::Ug, "v1", "host1");
        assert_eq!(a, b);
    }

    #[test]
    fn gateway_name_differs_by_kind() {
        let ug = gateway_name("OpenCloud", GatewayKind::Ug, "v1", "host1");
        let rg = gateway_name("OpenCloud", GatewayKind::Rg, "v1", "host1");
        assert_ne!(ug, rg);
        assert!(ug.starts_with("UG-"));
        assert!(rg.starts_with("RG-"));
    }

    #[test]
    fn key_password_is_deterministic_and_secret_dependent() {
        let a = gateway_key_password("UG-abc", b"secret-one");
        let b = gateway_key_password("UG-abc", b"secret-one");
        let c = gateway_key_password("UG-abc", b"secret-two");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn mountpoint_path_replaces_slashes() {
        let root = std::path::Path::new("/tmp/syndicate-mounts");
        let p = mountpoint_path(root, "team/proj-vol");
        assert_eq!(p, std::path::PathBuf::from("/tmp/syndicate-mounts/team.proj-vol"));
    }

    #[test]
    fn mountpoint_path_is_idempotent_for_plain_names() {
        let root = std::path::Path::new("/mnt");
        assert_eq!(mountpoint_path(root, "v1"), std::path::PathBuf::from("/mnt/v1"));
    }
}
