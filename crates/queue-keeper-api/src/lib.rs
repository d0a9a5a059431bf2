//! # Queue-Keeper HTTP Service
//!
//! HTTP server exposing:
//! - The webhook-ingestion surface (C1-C6, spec §2, §4.1-§4.6): `/api/v1/webhook/{provider}/`,
//!   `/api/v1/ghapp/`, `/api/v1/gh-marketplace/`.
//! - The RPC/HTTP gateway (C7 interceptor chain + C8 handlers, spec §4.7-§4.8), via
//!   [`create_rpc_router`], mounted on the same listener when an [`RpcState`] is supplied.
//! - Health check and Prometheus metrics endpoints.

// Public modules
pub mod azure_config;
pub mod config;
pub mod dlq_storage;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod responses;
pub mod rpc_state;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    middleware as axum_middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use bytes::Bytes;
use prometheus::TextEncoder;
use queue_keeper_core::ingestion::{ingest, verify_signature, IngestionContext};
use queue_keeper_core::{EntityStore, FeatureFlagClient, PropertyRefresher, Timestamp, WorkItemPublisher};
use queue_runtime::QueueClient;
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, cors::CorsLayer,
    limit::RequestBodyLimitLayer, trace::TraceLayer,
};
use tracing::{info, instrument, warn};

// Re-export public types
pub use azure_config::{
    AzureBlobStorageConfig, AzureConfigError, AzureKeyVaultConfig, AzureProductionConfig,
    AzureServiceBusConfig, AzureTelemetryConfig,
};
pub use config::{
    InvalidProviderIdError, LoggingConfig, ProviderConfig, ProviderId, ProviderSecretConfig,
    SecurityConfig, ServerConfig, ServiceConfig, WebhookConfig,
};
pub use errors::{ConfigError, ServiceError, WebhookHandlerError};
pub use metrics::{ServiceMetrics, TelemetryConfig};
pub use responses::*;
pub use rpc_state::RpcState;

/// Builds the RPC/HTTP gateway router (C7 interceptor chain + C8 handlers,
/// spec §4.7-§4.8), mounted under `/v1`. Kept separate from
/// [`create_router`]'s webhook surface: the interceptor chain is "skipped
/// for webhook HTTP endpoints, which carry their own signature-based trust
/// model" (§4.7), so the two routers carry different middleware stacks and
/// different state types entirely.
pub fn create_rpc_router(state: RpcState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/v1/providers", post(handlers::create_provider_handler))
        .route(
            "/v1/providers/{provider_id}",
            axum::routing::delete(handlers::delete_provider_handler),
        )
        .route("/v1/entities", get(handlers::list_entities_handler))
        .route(
            "/v1/entities/by-id/{entity_id}",
            get(handlers::get_entity_by_id_handler),
        )
        .route(
            "/v1/entities/by-name/{name}",
            get(handlers::get_entity_by_name_handler),
        )
        .route("/v1/entities", put(handlers::create_entity_handler))
        .route(
            "/v1/entities/reconcile",
            post(handlers::create_entity_reconciliation_task_handler),
        )
        .route("/v1/users", post(handlers::create_user_handler))
        .route(
            "/v1/users/{user_id}",
            axum::routing::delete(handlers::delete_user_handler),
        )
        .route(
            "/v1/invitations/{code}",
            post(handlers::resolve_invitation_handler),
        )
        .route("/v1/rule-types", post(handlers::create_rule_type_handler))
        .route(
            "/v1/rule-types/{rule_type_id}",
            put(handlers::update_rule_type_handler),
        )
        .route("/v1/projects", get(handlers::list_projects_handler))
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(max_body_bytes))
                .layer(CatchPanicLayer::custom(middleware::handle_panic))
                .layer(axum_middleware::from_fn(middleware::request_id))
                .layer(axum_middleware::from_fn(middleware::logger))
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    middleware::token_validation,
                ))
                .layer(axum_middleware::from_fn(middleware::entity_context))
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    middleware::project_authorization,
                ))
                .into_inner(),
        )
        .with_state(state)
}

// ============================================================================
// Application State
// ============================================================================

/// Reserved provider id for the fixed GitHub App webhook endpoint
/// (spec §6 `POST /api/v1/ghapp/`), distinct from the per-provider OAuth-app
/// path which takes its provider id from the URL.
pub const GH_APP_PROVIDER_ID: &str = "ghapp";

/// Shared application state for the webhook-ingestion router (C1-C6).
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: ServiceConfig,

    /// Resolved signature secrets per configured provider id, ordered
    /// current-secret-first (spec §5 "the active secret plus a list of
    /// previous secrets are loaded at startup").
    pub secrets: Arc<HashMap<String, Vec<String>>>,

    /// Entity store (C4) — persists resolved repositories, pull requests,
    /// and artifacts within a single ingestion transaction.
    pub entity_store: Arc<dyn EntityStore>,

    /// Feature-flag client the repository resolver (C3) consults for
    /// `private_repositories_enabled`.
    pub features: Arc<dyn FeatureFlagClient>,

    /// Refreshes an entity's property bag from the upstream provider (C3).
    pub refresher: Arc<dyn PropertyRefresher>,

    /// Queue client the publisher (C6) sends normalized work items through.
    pub queue_client: Arc<dyn QueueClient>,

    /// Health checker for system monitoring
    pub health_checker: Arc<dyn HealthChecker>,

    /// Metrics collector for observability
    pub metrics: Arc<ServiceMetrics>,

    /// OpenTelemetry configuration for tracing
    pub telemetry_config: Arc<TelemetryConfig>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ServiceConfig,
        secrets: HashMap<String, Vec<String>>,
        entity_store: Arc<dyn EntityStore>,
        features: Arc<dyn FeatureFlagClient>,
        refresher: Arc<dyn PropertyRefresher>,
        queue_client: Arc<dyn QueueClient>,
        health_checker: Arc<dyn HealthChecker>,
        metrics: Arc<ServiceMetrics>,
        telemetry_config: Arc<TelemetryConfig>,
    ) -> Self {
        Self {
            config,
            secrets: Arc::new(secrets),
            entity_store,
            features,
            refresher,
            queue_client,
            health_checker,
            metrics,
            telemetry_config,
        }
    }

    fn ingestion_context(&self) -> IngestionContext<'_> {
        IngestionContext {
            store: self.entity_store.as_ref(),
            features: self.features.as_ref(),
            refresher: self.refresher.as_ref(),
            publisher: WorkItemPublisher::new(self.queue_client.as_ref()),
        }
    }
}

/// Resolves each configured provider's active secret plus its previous
/// secrets into a flat, current-first list `verify_signature` can consume
/// directly. Key Vault-backed sources are not fetched by this reference
/// binary (see the `key_vault` module in `queue_keeper_core` for the trait
/// seam); a provider with only Key Vault sources configured has no entry
/// here and every request against it fails signature validation.
pub fn resolve_provider_secrets(providers: &[ProviderConfig]) -> HashMap<String, Vec<String>> {
    let mut resolved = HashMap::new();
    for provider in providers {
        let mut secrets = Vec::new();
        for source in std::iter::once(&provider.secret)
            .filter_map(|s| s.as_ref())
            .chain(provider.previous_secrets.iter())
        {
            match source {
                ProviderSecretConfig::Literal { value } => secrets.push(value.clone()),
                ProviderSecretConfig::KeyVault { secret_name } => {
                    warn!(
                        provider = %provider.id,
                        secret_name = %secret_name,
                        "Key Vault-backed provider secrets are not wired in this binary; \
                         requests signed with this secret will fail validation"
                    );
                }
            }
        }
        if !secrets.is_empty() {
            resolved.insert(provider.id.clone(), secrets);
        }
    }
    resolved
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let webhook_routes = Router::new()
        .route(
            "/api/v1/webhook/{provider_class}/",
            post(handle_oauth_app_webhook),
        )
        .route("/api/v1/ghapp/", post(handle_ghapp_webhook))
        .route(
            "/api/v1/gh-marketplace/",
            post(handle_gh_marketplace_webhook),
        );

    let health_routes = Router::new()
        .route("/health", get(handle_health_check))
        .route("/health/deep", get(handle_deep_health_check))
        .route("/health/live", get(handle_liveness_check))
        .route("/ready", get(handle_readiness_check));

    let observability_routes = Router::new().route("/metrics", get(metrics_endpoint));

    Router::new()
        .merge(webhook_routes)
        .merge(health_routes)
        .merge(observability_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive())
                .layer(axum_middleware::from_fn(request_logging_middleware))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
///
/// `rpc_state` is `None` when the deployment only needs the webhook-ingestion
/// surface (C1-C6); when present, the RPC/HTTP gateway (C7 interceptor chain
/// + C8 handlers) is mounted alongside it on the same listener, matching
/// spec §6 "A REST<->RPC transcoder exposes the RPC surface over HTTP/JSON
/// on the same port."
#[allow(clippy::too_many_arguments)]
pub async fn start_server(
    config: ServiceConfig,
    entity_store: Arc<dyn EntityStore>,
    features: Arc<dyn FeatureFlagClient>,
    refresher: Arc<dyn PropertyRefresher>,
    queue_client: Arc<dyn QueueClient>,
    health_checker: Arc<dyn HealthChecker>,
    rpc_state: Option<RpcState>,
) -> Result<(), ServiceError> {
    // Validate configuration before initializing any infrastructure
    config.validate().map_err(ServiceError::Configuration)?;

    // Warn when literal secrets are present — they should only be used in
    // development or testing, never in production deployments.
    for provider in &config.providers {
        if let Some(config::ProviderSecretConfig::Literal { .. }) = &provider.secret {
            warn!(
                provider = %provider.id,
                "Provider is configured with a literal webhook secret. \
                 Literal secrets are for development and testing only. \
                 Use a Key Vault secret source for production deployments."
            );
        }
    }

    let secrets = resolve_provider_secrets(&config.providers);

    // Initialize observability components
    let metrics = ServiceMetrics::new().map_err(|e| {
        ServiceError::Configuration(ConfigError::Invalid {
            message: format!("Failed to initialize metrics: {}", e),
        })
    })?;

    let telemetry_config = Arc::new(TelemetryConfig::new(
        "queue-keeper".to_string(),
        "development".to_string(),
    ));

    let max_body_bytes = config.server.max_body_size;
    let state = AppState::new(
        config.clone(),
        secrets,
        entity_store,
        features,
        refresher,
        queue_client,
        health_checker,
        metrics,
        telemetry_config,
    );
    let app = match rpc_state {
        Some(rpc_state) => create_router(state).merge(create_rpc_router(rpc_state, max_body_bytes)),
        None => create_router(state),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.to_string(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", addr);

    let shutdown_timeout = std::time::Duration::from_secs(config.server.shutdown_timeout_seconds);

    let shutdown_signal = async move {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C signal handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
            },
            _ = terminate => {
                info!("Received SIGTERM, initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
            },
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

// ============================================================================
// Webhook Handlers
// ============================================================================

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Runs C1 (signature verification) through C6 (publish) for one webhook
/// delivery against the provider registered under `provider_id`.
async fn ingest_webhook(
    state: &AppState,
    provider_id: &str,
    headers: HeaderMap,
    body: Bytes,
) -> Result<WebhookResponse, WebhookHandlerError> {
    let event_type = header_str(&headers, "x-github-event")
        .unwrap_or("unknown")
        .to_string();
    let delivery_id = header_str(&headers, "x-github-delivery")
        .unwrap_or("unknown")
        .to_string();
    let signature_256 = header_str(&headers, "x-hub-signature-256").map(str::to_string);
    let signature_1 = header_str(&headers, "x-hub-signature").map(str::to_string);

    let record_outcome = |accepted: bool, status: u16| {
        state.metrics.record_webhook_event_type(&event_type, accepted);
        state.metrics.record_webhook_status_code(status);
    };

    let secrets = match state.secrets.get(provider_id) {
        Some(secrets) => secrets,
        None => {
            record_outcome(false, 404);
            return Err(WebhookHandlerError::ProviderNotFound {
                provider: provider_id.to_string(),
            });
        }
    };

    let start = std::time::Instant::now();

    if let Err(e) = verify_signature(
        &body,
        signature_256.as_deref(),
        signature_1.as_deref(),
        secrets,
    ) {
        let status = match e {
            queue_keeper_core::ingestion::SignatureError::BadSignature => 400,
            queue_keeper_core::ingestion::SignatureError::BodyTooLarge => 413,
        };
        state.metrics.record_webhook_request(start.elapsed(), false);
        record_outcome(false, status);
        return Err(e.into());
    }

    if let Some(provider_config) = state.config.providers.iter().find(|p| p.id == provider_id) {
        if !provider_config.allowed_event_types.is_empty()
            && !provider_config.allowed_event_types.contains(&event_type)
        {
            state.metrics.record_webhook_request(start.elapsed(), false);
            record_outcome(false, 200);
            return Ok(WebhookResponse {
                accepted: false,
                reason: Some("NOT_HANDLED"),
                published: 0,
            });
        }
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            state.metrics.record_webhook_request(start.elapsed(), false);
            record_outcome(false, 500);
            return Err(WebhookHandlerError::MalformedPayload(e.to_string()));
        }
    };

    let ctx = state.ingestion_context();
    let report = ingest(&ctx, &delivery_id, provider_id, &event_type, &payload).await?;

    state
        .metrics
        .record_webhook_request(start.elapsed(), report.accepted);
    record_outcome(report.accepted, 200);

    info!(
        provider = %provider_id,
        event_type = %event_type,
        delivery_id = %delivery_id,
        accepted = report.accepted,
        reason = ?report.reason,
        published = report.published,
        "Webhook ingested"
    );

    Ok(WebhookResponse {
        accepted: report.accepted,
        reason: report.reason,
        published: report.published,
    })
}

/// `POST /api/v1/webhook/{provider_class}/` — OAuth-app webhook (spec §6).
#[instrument(skip(state, headers, body), fields(provider_class = %provider_class))]
pub async fn handle_oauth_app_webhook(
    State(state): State<AppState>,
    Path(provider_class): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookHandlerError> {
    ingest_webhook(&state, &provider_class, headers, body)
        .await
        .map(Json)
}

/// `POST /api/v1/ghapp/` — GitHub App webhook, same shape as the OAuth-app
/// path but bound to the reserved [`GH_APP_PROVIDER_ID`] (spec §6).
#[instrument(skip(state, headers, body))]
pub async fn handle_ghapp_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookHandlerError> {
    ingest_webhook(&state, GH_APP_PROVIDER_ID, headers, body)
        .await
        .map(Json)
}

/// `POST /api/v1/gh-marketplace/` — always a no-op 200 (spec §6).
pub async fn handle_gh_marketplace_webhook() -> StatusCode {
    StatusCode::OK
}

// ============================================================================
// Health Check Handlers
// ============================================================================

/// Basic health check endpoint
#[instrument(skip(state))]
async fn handle_health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let status = state.health_checker.check_basic_health().await;

    let response = HealthResponse {
        status: if status.is_healthy {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        timestamp: Timestamp::now(),
        checks: status.checks,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    if status.is_healthy {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

/// Deep health check with dependency validation
#[instrument(skip(state))]
async fn handle_deep_health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let status = state.health_checker.check_deep_health().await;

    let response = HealthResponse {
        status: if status.is_healthy {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        timestamp: Timestamp::now(),
        checks: status.checks,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    if status.is_healthy {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

/// Readiness check for Kubernetes
#[instrument(skip(state))]
async fn handle_readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, StatusCode> {
    let is_ready = state.health_checker.check_readiness().await;

    let response = ReadinessResponse {
        ready: is_ready,
        timestamp: Timestamp::now(),
    };

    if is_ready {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

/// Liveness check endpoint (for Kubernetes)
#[instrument(skip(_state))]
async fn handle_liveness_check(State(_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive".to_string(),
        timestamp: Timestamp::now(),
        checks: HashMap::new(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Observability Handlers
// ============================================================================

/// Prometheus metrics endpoint
#[instrument(skip_all)]
async fn metrics_endpoint(State(_state): State<AppState>) -> Result<String, StatusCode> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder
        .encode_to_string(&metric_families)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware with correlation ID tracking
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::Span::current().record("correlation_id", correlation_id.as_str());
    request.extensions_mut().insert(correlation_id.clone());

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert("x-correlation-id", header_value);
    }

    let status = response.status();
    if status.is_server_error() {
        tracing::error!(correlation_id = %correlation_id, method = %method, uri = %uri, status = %status, duration_ms = %duration.as_millis(), "Request completed with server error");
    } else if status.is_client_error() {
        warn!(correlation_id = %correlation_id, method = %method, uri = %uri, status = %status, duration_ms = %duration.as_millis(), "Request completed with client error");
    } else {
        info!(correlation_id = %correlation_id, method = %method, uri = %uri, status = %status, duration_ms = %duration.as_millis(), "Request completed successfully");
    }

    response
}

impl IntoResponse for WebhookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
