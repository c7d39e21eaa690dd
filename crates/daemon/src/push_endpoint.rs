// SPDX-License-Identifier: MIT

//! Push delta ingestion: a small `axum` router accepting a signed
//! envelope from the Observer and triggering an asynchronous reconcile.
//! The response only ever reports envelope-level validity; decryption
//! and reconcile happen after the response is sent.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{header::CONTENT_TYPE, StatusCode};
use axum::routing::post;
use axum::Router;

use sliver_core::SecretStore;

use crate::observer::Observer;
use crate::reconciler::{GatewaySupervisor, Reconciler};

const FORM_FIELD: &str = "observer_message";

struct PushState<S: GatewaySupervisor> {
    observer: Arc<Observer>,
    reconciler: Arc<Reconciler<S>>,
    secret_store: SecretStore,
}

pub fn router<S: GatewaySupervisor + 'static>(observer: Arc<Observer>, reconciler: Arc<Reconciler<S>>, secret_store: SecretStore) -> Router {
    let state = Arc::new(PushState { observer, reconciler, secret_store });
    Router::new().route("/", post(handle::<S>)).with_state(state)
}

async fn extract_observer_message(req: Request) -> Option<String> {
    let is_multipart = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/form-data"))
        .unwrap_or(false);

    if is_multipart {
        let mut multipart = Multipart::from_request(req, &()).await.ok()?;
        while let Ok(Some(field)) = multipart.next_field().await {
            if field.name() == Some(FORM_FIELD) {
                return field.text().await.ok();
            }
        }
        None
    } else {
        let body = Bytes::from_request(req, &()).await.ok()?;
        let fields: HashMap<String, String> = serde_urlencoded::from_bytes(&body).ok()?;
        fields.get(FORM_FIELD).cloned()
    }
}

async fn handle<S: GatewaySupervisor + 'static>(
    State(state): State<Arc<PushState<S>>>,
    req: Request,
) -> (StatusCode, &'static str) {
    let Some(envelope_json) = extract_observer_message(req).await else {
        return (StatusCode::BAD_REQUEST, "Missing data");
    };

    let sealed = match state.observer.verify_envelope(&envelope_json) {
        Ok(sealed) => sealed,
        Err(error) => {
            tracing::warn!(%error, "rejected push with invalid envelope");
            return (StatusCode::BAD_REQUEST, "Invalid request");
        }
    };

    let reconciler = Arc::clone(&state.reconciler);
    let secret_store = state.secret_store.clone();
    tokio::spawn(async move {
        reconcile_pushed_volume(reconciler, secret_store, sealed).await;
    });

    (StatusCode::OK, "OK")
}

async fn reconcile_pushed_volume<S: GatewaySupervisor>(reconciler: Arc<Reconciler<S>>, secret_store: SecretStore, sealed: Vec<u8>) {
    let Some(secret) = secret_store.get() else {
        tracing::warn!("dropping push: no slice secret cached yet");
        return;
    };

    let plaintext = match sliver_crypto::unseal(&secret, &sealed[..]) {
        Ok(plaintext) => plaintext,
        Err(error) => {
            tracing::warn!(%error, "dropping push: unseal failed");
            return;
        }
    };

    let record = match sliver_crypto::parse_volume_record(&plaintext) {
        Ok(record) => record,
        Err(error) => {
            tracing::warn!(%error, "dropping push: malformed volume record");
            return;
        }
    };

    let target = HashMap::from([(record.volume_name.clone(), record)]);
    let outcome = reconciler.reconcile(&target).await;
    tracing::info!(%outcome, "push-triggered reconcile complete");
}
