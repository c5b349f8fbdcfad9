//! Typed errors for the upstream model providers
//!
//! Tool and scraping failures stay `anyhow` all the way up (they become
//! error-status JSON on the wire); provider failures are typed so the HTTP
//! layer can distinguish a caller mistake (unknown model) from an upstream
//! fault.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The requested model is not in the served list; a client error.
    #[error("Model '{0}' not found or owner not configured")]
    UnknownModel(String),

    /// The model is served but its provider credentials are missing.
    #[error("Provider credentials not configured: {0}")]
    MissingCredentials(&'static str),

    /// The provider answered with a non-success status.
    #[error("Upstream API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The request never completed (connect, timeout, mid-stream drop).
    #[error("Upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider sent a stream event we could not decode.
    #[error("Malformed stream event: {0}")]
    Decode(#[from] serde_json::Error),
}
