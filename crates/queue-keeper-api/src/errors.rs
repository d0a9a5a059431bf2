//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use queue_keeper_core::ingestion::{IngestionError, SignatureError};
use tracing::{error, warn};

/// Webhook handler errors with HTTP status code mapping (spec §7).
///
/// - `400 Bad Request`: `BAD_SIGNATURE` — the signature matched neither the
///   active secret nor any previous secret.
/// - `413 Payload Too Large`: `BODY_TOO_LARGE` — body exceeded the 2 MiB cap.
/// - `500 Internal Server Error`: `PARSE_ERROR` / `PUBLISH_ERROR` / `INTERNAL`
///   — malformed payload, publish failure (upstream retries), or a store
///   failure. Every other ingestion outcome (`REPO_NOT_FOUND`,
///   `REPO_IS_PRIVATE`, `ARTIFACT_NOT_FOUND`, `NOT_HANDLED`, `ping`, an
///   ignored event type) is benign and returns `200 OK` with
///   `accepted: false` directly from the handler, never through this type.
///
/// Error messages returned to clients are sanitized to prevent information
/// disclosure. Detailed error information is logged server-side.
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    /// Signature did not match any configured secret.
    ///
    /// Maps to: `400 Bad Request`.
    #[error("bad signature")]
    BadSignature,

    /// Request body exceeded the 2 MiB cap.
    ///
    /// Maps to: `413 Payload Too Large`.
    #[error("body too large")]
    BodyTooLarge,

    /// Payload could not be parsed into the shape a handler expected.
    ///
    /// Maps to: `500 Internal Server Error`.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Publishing the normalized work item to the bus failed.
    ///
    /// Maps to: `500 Internal Server Error` (upstream retries the delivery).
    #[error("publish failed: {0}")]
    Publish(String),

    /// Entity store transaction failed.
    ///
    /// Maps to: `500 Internal Server Error`.
    #[error("store error: {0}")]
    Store(String),

    /// Webhook provider class not found in configuration.
    ///
    /// Maps to: `404 Not Found` (permanent error, the provider is not configured)
    ///
    /// Occurs when the `{provider}` URL segment does not match any entry
    /// in [`crate::config::ServiceConfig::providers`].
    #[error("Webhook provider not found: {provider}")]
    ProviderNotFound { provider: String },
}

impl From<SignatureError> for WebhookHandlerError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::BadSignature => Self::BadSignature,
            SignatureError::BodyTooLarge => Self::BodyTooLarge,
        }
    }
}

impl From<IngestionError> for WebhookHandlerError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::MalformedPayload(m) => Self::MalformedPayload(m),
            IngestionError::Publish(e) => Self::Publish(e.to_string()),
            IngestionError::Store(e) => Self::Store(e.to_string()),
        }
    }
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadSignature => {
                warn!("webhook signature did not match any configured secret");
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            Self::BodyTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            Self::MalformedPayload(ref m) => {
                error!(error = %m, "webhook payload could not be parsed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            Self::Publish(ref e) => {
                error!(error = %e, "failed to publish work item");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            Self::Store(ref e) => {
                error!(error = %e, "entity store transaction failed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            Self::ProviderNotFound { ref provider } => {
                warn!(provider = %provider, "Webhook provider not found");
                (StatusCode::NOT_FOUND, self.to_string())
            }
        };

        // Build JSON error response
        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Health check failed: {message}")]
    HealthCheckFailed { message: String },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration parsing failed: {0}")]
    Parsing(#[from] toml::de::Error),

    #[error("Provider configuration invalid: {message}")]
    ProviderValidation { message: String },
}
