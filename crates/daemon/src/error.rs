// SPDX-License-Identifier: MIT

/// Failures talking to the Observer over HTTP. Every variant is
/// transient — `NetworkError` in the design's taxonomy — except a
/// credential-pipeline failure, which is attributed to its own record.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("observer returned {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("secret response body was empty")]
    EmptySecret,

    #[error(transparent)]
    Pipeline(#[from] sliver_crypto::PipelineError),

    #[error("malformed secret: {0}")]
    MalformedSecret(#[from] hex::FromHexError),
}
