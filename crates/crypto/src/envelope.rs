// SPDX-License-Identifier: MIT

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::pss::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use serde::Deserialize;
use sha2::Sha256;

use crate::error::PipelineError;

/// Wire shape of a signed envelope from the Observer, per the external
/// interface contract: `{"payload_b64": ..., "signature_b64": ...}`.
#[derive(Deserialize)]
struct Envelope {
    payload_b64: String,
    signature_b64: String,
}

/// Load the Observer's RSA public key from PEM text. Failure here is the
/// `UnknownKey` mode: the key we were configured with isn't usable.
pub fn load_public_key(pem: &str) -> Result<RsaPublicKey, PipelineError> {
    use rsa::pkcs8::DecodePublicKey;
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| PipelineError::UnknownKey(e.to_string()))
}

/// Verify a signed JSON envelope against the Observer's public key and
/// return the still-sealed (base64-decoded) payload bytes.
///
/// The signature covers the raw `payload_b64` string as it appears in the
/// envelope, not the decoded bytes — this keeps "bad JSON" and "bad
/// signature" independently diagnosable, since the signature check never
/// has to decode anything first.
pub fn verify_json(public_key: &RsaPublicKey, envelope_json: &str) -> Result<Vec<u8>, PipelineError> {
    let envelope: Envelope = serde_json::from_str(envelope_json)
        .map_err(|e| PipelineError::MalformedEnvelope(e.to_string()))?;

    let signature_bytes = BASE64
        .decode(envelope.signature_b64.as_bytes())
        .map_err(|e| PipelineError::MalformedEnvelope(format!("bad signature_b64: {e}")))?;
    let signature = Signature::try_from(signature_bytes.as_slice())
        .map_err(|e| PipelineError::MalformedEnvelope(format!("bad signature encoding: {e}")))?;

    let verifying_key = VerifyingKey::<Sha256>::new(public_key.clone());
    verifying_key
        .verify(envelope.payload_b64.as_bytes(), &signature)
        .map_err(|_| PipelineError::BadSignature)?;

    BASE64
        .decode(envelope.payload_b64.as_bytes())
        .map_err(|e| PipelineError::MalformedEnvelope(format!("bad payload_b64: {e}")))
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
