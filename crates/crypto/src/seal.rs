// SPDX-License-Identifier: MIT

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use sha2::{Digest, Sha256};
use sliver_core::SliceSecret;

use crate::error::PipelineError;

const NONCE_LEN: usize = 12;

/// Derive the 256-bit AEAD key from the slice secret: `SHA-256(secret)`.
/// The slice secret the Observer hands out is an opaque token of whatever
/// length the operator configured, so it's hashed down to a fixed-size key
/// rather than relied on directly.
fn derive_key(secret: &SliceSecret) -> Key<Aes256Gcm> {
    let digest = Sha256::digest(secret.as_bytes());
    *Key::<Aes256Gcm>::from_slice(&digest)
}

/// Open a sealed blob framed as `nonce (12 bytes) || ciphertext+tag`,
/// keyed by the slice secret. This is the symmetric half of the envelope:
/// the Observer's RSA signature (see [`crate::verify_json`]) proves the
/// payload came from the Observer; this proves the payload is for this
/// slice.
pub fn unseal(secret: &SliceSecret, sealed: &[u8]) -> Result<Vec<u8>, PipelineError> {
    if sealed.len() <= NONCE_LEN {
        return Err(PipelineError::Truncated);
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let key = derive_key(secret);
    let cipher = Aes256Gcm::new(&key);
    let nonce = Nonce::from_slice(nonce_bytes);
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| PipelineError::DecryptFailed)
}

/// Seal plaintext for a given slice secret, generating a fresh random
/// nonce. Exposed for tests and for any tooling that needs to produce
/// fixtures in the same framing `unseal` expects.
#[cfg(test)]
pub fn seal(secret: &SliceSecret, plaintext: &[u8]) -> Vec<u8> {
    use aes_gcm::aead::OsRng;
    use aes_gcm::AeadCore;

    let key = derive_key(secret);
    let cipher = Aes256Gcm::new(&key);
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .unwrap_or_else(|_| Vec::new());
    let mut out = nonce.to_vec();
    out.extend_from_slice(&ciphertext);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let secret = SliceSecret::from_bytes(b"a-slice-secret".to_vec());
        let sealed = seal(&secret, b"hello gateway");
        let opened = unseal(&secret, &sealed).expect("unseal");
        assert_eq!(opened, b"hello gateway");
    }

    #[test]
    fn wrong_secret_fails() {
        let secret = SliceSecret::from_bytes(b"secret-a".to_vec());
        let other = SliceSecret::from_bytes(b"secret-b".to_vec());
        let sealed = seal(&secret, b"payload");
        assert!(matches!(unseal(&other, &sealed), Err(PipelineError::DecryptFailed)));
    }

    #[test]
    fn truncated_blob_is_rejected() {
        let secret = SliceSecret::from_bytes(b"secret".to_vec());
        assert!(matches!(unseal(&secret, b"short"), Err(PipelineError::Truncated)));
    }

    #[test]
    fn tampered_ciphertext_fails_auth() {
        let secret = SliceSecret::from_bytes(b"secret".to_vec());
        let mut sealed = seal(&secret, b"payload");
        let last = sealed.len() - 1;
        sealed[last] ^= 0xFF;
        assert!(matches!(unseal(&secret, &sealed), Err(PipelineError::DecryptFailed)));
    }
}
