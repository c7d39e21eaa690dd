use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use proptest::prelude::*;
use rand::thread_rng;
use rsa::pkcs8::EncodePublicKey;
use rsa::pss::SigningKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use super::*;

fn test_keypair() -> (RsaPrivateKey, RsaPublicKey) {
    let mut rng = thread_rng();
    let private = RsaPrivateKey::new(&mut rng, 2048).expect("generate key");
    let public = RsaPublicKey::from(&private);
    (private, public)
}

fn sign_envelope(private: &RsaPrivateKey, payload: &[u8]) -> String {
    let payload_b64 = BASE64.encode(payload);
    let signing_key = SigningKey::<Sha256>::new(private.clone());
    let signature = signing_key.sign_with_rng(&mut thread_rng(), payload_b64.as_bytes());
    let signature_b64 = BASE64.encode(signature.to_bytes());
    serde_json::json!({ "payload_b64": payload_b64, "signature_b64": signature_b64 }).to_string()
}

#[test]
fn valid_envelope_round_trips() {
    let (private, public) = test_keypair();
    let envelope = sign_envelope(&private, b"sealed-payload-bytes");
    let recovered = verify_json(&public, &envelope).expect("verify");
    assert_eq!(recovered, b"sealed-payload-bytes");
}

#[test]
fn tampered_payload_fails_signature() {
    let (private, public) = test_keypair();
    let envelope = sign_envelope(&private, b"original");
    let mut value: serde_json::Value = serde_json::from_str(&envelope).expect("parse");
    value["payload_b64"] = serde_json::Value::String(BASE64.encode(b"forged!!"));
    let tampered = value.to_string();
    assert!(matches!(verify_json(&public, &tampered), Err(PipelineError::BadSignature)));
}

#[test]
fn wrong_key_fails_signature() {
    let (private, _) = test_keypair();
    let (_, other_public) = test_keypair();
    let envelope = sign_envelope(&private, b"payload");
    assert!(matches!(verify_json(&other_public, &envelope), Err(PipelineError::BadSignature)));
}

#[test]
fn malformed_json_is_rejected() {
    let (_, public) = test_keypair();
    assert!(matches!(verify_json(&public, "not json"), Err(PipelineError::MalformedEnvelope(_))));
}

#[test]
fn missing_fields_are_rejected() {
    let (_, public) = test_keypair();
    assert!(matches!(verify_json(&public, r#"{"payload_b64": "x"}"#), Err(PipelineError::MalformedEnvelope(_))));
}

#[test]
fn load_public_key_rejects_garbage_pem() {
    assert!(matches!(load_public_key("not a pem"), Err(PipelineError::UnknownKey(_))));
}

#[test]
fn load_public_key_accepts_spki_pem() {
    let (_, public) = test_keypair();
    let pem = public.to_public_key_pem(Default::default()).expect("encode");
    let loaded = load_public_key(&pem).expect("load");
    assert_eq!(loaded, public);
}

/// Shared across every proptest case: generating a 2048-bit RSA key per
/// case would make the property test minutes slower for no benefit, since
/// the property being checked doesn't depend on which key is used.
fn shared_keypair() -> &'static (RsaPrivateKey, RsaPublicKey) {
    static KEYPAIR: OnceLock<(RsaPrivateKey, RsaPublicKey)> = OnceLock::new();
    KEYPAIR.get_or_init(test_keypair)
}

proptest! {
    #[test]
    fn arbitrary_payload_round_trips(payload in proptest::collection::vec(any::<u8>(), 0..256)) {
        let (private, public) = shared_keypair();
        let envelope = sign_envelope(private, &payload);
        let recovered = verify_json(public, &envelope).expect("verify");
        prop_assert_eq!(recovered, payload);
    }
}
