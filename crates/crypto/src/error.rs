// SPDX-License-Identifier: MIT

/// Failure modes of the credential pipeline, named after the conceptual
/// taxonomy the design calls out in its component design for
/// `CredentialPipeline`.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The envelope wasn't valid JSON, or was missing `payload_b64` /
    /// `signature_b64`, or either field wasn't valid base64.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The signature didn't verify under the configured Observer public key.
    #[error("signature verification failed")]
    BadSignature,

    /// The configured public key could not be loaded or is not a usable
    /// RSA public key (e.g. a private key was supplied by mistake).
    #[error("unusable observer public key: {0}")]
    UnknownKey(String),

    /// AEAD decryption under the slice secret failed (wrong key, or the
    /// ciphertext was tampered with).
    #[error("decrypt failed")]
    DecryptFailed,

    /// The sealed blob was shorter than the minimum nonce+tag framing.
    #[error("sealed blob truncated")]
    Truncated,

    /// The plaintext parsed as JSON but was missing required fields, or a
    /// field had the wrong type. The offending record is dropped, never
    /// partially applied.
    #[error("malformed data: {0}")]
    MalformedData(String),
}
