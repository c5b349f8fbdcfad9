//! HTTP error mapping for the proxy
//!
//! Handlers bubble `anyhow::Error` up through `?`; this wrapper turns it
//! into a JSON error body with a status that distinguishes caller mistakes
//! from upstream faults.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reki_core::UpstreamError;
use serde_json::json;
use tracing::error;

pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<UpstreamError>() {
            Some(UpstreamError::UnknownModel(_)) => StatusCode::BAD_REQUEST,
            Some(UpstreamError::Api { .. }) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = self.0.to_string();
        error!(%status, %message, "request failed");
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
