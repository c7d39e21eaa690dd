// SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// The symmetric key shared between the Observer and every sliver of a
/// slice. Opaque on purpose: nothing outside `sliver-crypto` needs to look
/// inside it, and `Debug` never prints the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SliceSecret(Arc<Vec<u8>>);

impl SliceSecret {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(Arc::new(bytes))
    }

    /// Decode a hex-encoded secret, as supplied via `--slice_secret`.
    pub fn from_hex(hex_str: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self(Arc::new(hex::decode(hex_str)?)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SliceSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SliceSecret({} bytes, redacted)", self.0.len())
    }
}

/// Process-wide, single-writer-many-reader cache of the slice secret.
///
/// Reads copy the `Arc` out under a short-held lock and never block on
/// I/O; the lazy fetch-from-Observer happens entirely outside this type
/// (see `sliver-daemon::observer`), which then calls [`SecretStore::set`]
/// once it has a value.
#[derive(Clone, Default)]
pub struct SecretStore {
    inner: Arc<Mutex<Option<SliceSecret>>>,
}

impl SecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(secret: SliceSecret) -> Self {
        Self { inner: Arc::new(Mutex::new(Some(secret))) }
    }

    /// Snapshot the cached secret, if any.
    pub fn get(&self) -> Option<SliceSecret> {
        self.inner.lock().clone()
    }

    /// Cache a freshly obtained secret. Overwrites whatever was there.
    pub fn set(&self, secret: SliceSecret) {
        *self.inner.lock() = Some(secret);
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_by_default() {
        let store = SecretStore::new();
        assert!(store.is_empty());
        assert!(store.get().is_none());
    }

    #[test]
    fn set_then_get_roundtrips() {
        let store = SecretStore::new();
        store.set(SliceSecret::from_bytes(vec![1, 2, 3]));
        assert_eq!(store.get().unwrap().as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn from_hex_decodes() {
        let secret = SliceSecret::from_hex("00aabb").unwrap();
        assert_eq!(secret.as_bytes(), &[0x00, 0xaa, 0xbb]);
    }

    #[test]
    fn debug_never_prints_bytes() {
        let secret = SliceSecret::from_bytes(vec![0xde, 0xad, 0xbe, 0xef]);
        let rendered = format!("{secret:?}");
        assert!(!rendered.contains("222"));
        assert!(rendered.contains("4 bytes"));
    }
}
