// SPDX-License-Identifier: MIT

//! HTTP client for the Observer: slice-secret bootstrap, the signed volume
//! list, and per-volume signed+sealed records.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use rsa::RsaPublicKey;
use sliver_core::{SliceSecret, VolumeDescriptor};

use crate::error::ObserverError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Observer {
    client: Client,
    observer_url: String,
    slice_name: String,
    public_key: RsaPublicKey,
}

impl Observer {
    pub fn new(observer_url: String, slice_name: String, public_key: RsaPublicKey) -> Self {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build().unwrap_or_default();
        Self { client, observer_url, slice_name, public_key }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/{}{}", self.observer_url.trim_end_matches('/'), self.slice_name, suffix)
    }

    /// Fetch the slice secret. The body is the raw secret, never hex —
    /// only the `--slice_secret` CLI/config path is hex-encoded.
    pub async fn fetch_secret(&self) -> Result<SliceSecret, ObserverError> {
        let url = self.url("/SYNDICATE_SLICE_SECRET");
        let response = self.client.get(&url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(ObserverError::UnexpectedStatus { status: response.status().as_u16(), url });
        }
        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(ObserverError::EmptySecret);
        }
        Ok(SliceSecret::from_bytes(body.to_vec()))
    }

    async fn fetch_envelope(&self, url: &str) -> Result<Vec<u8>, ObserverError> {
        let response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(ObserverError::UnexpectedStatus { status: response.status().as_u16(), url: url.to_string() });
        }
        let envelope_json = response.text().await?;
        Ok(sliver_crypto::verify_json(&self.public_key, &envelope_json)?)
    }

    /// The slice's current volume names.
    pub async fn fetch_volume_list(&self) -> Result<Vec<String>, ObserverError> {
        let sealed = self.fetch_envelope(&self.url("")).await?;
        Ok(sliver_crypto::parse_volume_list(&sealed)?)
    }

    /// A single volume's sealed detail record, unsealed and parsed.
    pub async fn fetch_volume(&self, secret: &SliceSecret, volume_name: &str) -> Result<VolumeDescriptor, ObserverError> {
        let sealed = self.fetch_envelope(&self.url(&format!("/{volume_name}"))).await?;
        let plaintext = sliver_crypto::unseal(secret, &sealed)?;
        Ok(sliver_crypto::parse_volume_record(&plaintext)?)
    }

    /// Verify-only entry point used by the push endpoint: same envelope
    /// verification as the list/detail fetches, but over a body we
    /// already have in hand rather than one we fetched ourselves.
    pub fn verify_envelope(&self, envelope_json: &str) -> Result<Vec<u8>, sliver_crypto::PipelineError> {
        sliver_crypto::verify_json(&self.public_key, envelope_json)
    }

    /// Register a UG's gateway record with the Observer. Unlike an RG, a
    /// UG is node-specific, so a brand-new one has to be instantiated at
    /// the Observer before it will ever be found running; this must be
    /// called once before the first retried `ensure_UG_running` for a
    /// volume whose UG record doesn't exist yet.
    pub async fn ensure_ug_exists(
        &self,
        principal_id: &str,
        volume_name: &str,
        ug_name: &str,
        ug_hostname: &str,
        ug_port: u16,
        ug_key_password: &str,
    ) -> Result<(), ObserverError> {
        let url = self.url(&format!("/{volume_name}/UG"));
        let body = serde_json::json!({
            "principal_id": principal_id,
            "UG_name": ug_name,
            "UG_hostname": ug_hostname,
            "UG_portnum": ug_port,
            "UG_key_password": ug_key_password,
        });
        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(ObserverError::UnexpectedStatus { status: response.status().as_u16(), url });
        }
        Ok(())
    }
}
