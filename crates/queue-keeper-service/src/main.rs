//! # Queue-Keeper Service
//!
//! Binary entry point for the Queue-Keeper HTTP service.
//!
//! This executable:
//! - Loads configuration from environment and files
//! - Initializes observability (logging, metrics, tracing)
//! - Wires the webhook-ingestion collaborators (C1-C6) and the RPC/HTTP
//!   gateway (C7 interceptor chain + C8 handlers), and starts the identity
//!   reconciler (C9)
//! - Starts the HTTP server from queue-keeper-api
//!
//! See specs/interfaces/http-service.md for complete specification.

mod identity_reconciler;

use queue_keeper_api::{start_server, DefaultHealthChecker, RpcState, ServiceConfig, ServiceError};
use queue_keeper_core::{
    InMemoryAuthorizationClient, InMemoryEntityStore, InMemoryFeatureFlagClient,
    InMemoryIdentityProvider, NoopDeregistrar, NoopRefresher,
};
use queue_runtime::{InMemoryProvider, QueueConfig, StandardQueueClient};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "queue_keeper_service=info,queue_keeper_api=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Queue-Keeper Service");

    // Load configuration (TODO: from file/environment)
    let config = ServiceConfig::default();

    let health_checker = Arc::new(DefaultHealthChecker);

    // Every collaborator here is the in-memory reference adapter for an
    // external collaborator out of scope per the control plane's contract
    // boundary (persistent storage, the authorization service, the identity
    // provider, the feature-flag service, the message bus transport);
    // swapping in production adapters means supplying different
    // `Arc<dyn Trait>` values below. `entity_store` and `queue_client` are
    // shared between the webhook-ingestion state and the RPC state so both
    // routers observe the same underlying data.
    let entity_store = Arc::new(InMemoryEntityStore::new());
    let features = Arc::new(InMemoryFeatureFlagClient::new());
    let refresher = Arc::new(NoopRefresher);
    let deregistrar = Arc::new(NoopDeregistrar);
    let identity_provider = Arc::new(InMemoryIdentityProvider::new());
    let authz = Arc::new(InMemoryAuthorizationClient::new());
    let queue_client = Arc::new(StandardQueueClient::new(
        Box::new(InMemoryProvider::default()),
        QueueConfig::default(),
    ));

    let rpc_state = RpcState::new(
        entity_store.clone(),
        deregistrar,
        identity_provider.clone(),
        authz.clone(),
        queue_client.clone(),
    );

    // Start the identity reconciler (C9): polls the identity provider for
    // account-lifecycle events and propagates deletions into the authz and
    // data stores. Runs independently of the HTTP server so a slow or wedged
    // poll never blocks request handling.
    let reconciler = identity_reconciler::IdentityReconciler::new(entity_store.clone(), identity_provider, authz);
    tokio::spawn(async move {
        reconciler.run().await;
    });

    info!(
        host = %config.server.host,
        port = config.server.port,
        "Starting HTTP server"
    );

    // Start the server
    if let Err(e) = start_server(
        config,
        entity_store,
        features,
        refresher,
        queue_client,
        health_checker,
        Some(rpc_state),
    )
    .await
    {
        error!("Failed to start server: {}", e);

        let exit_code = match e {
            ServiceError::BindFailed { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => 3,
            ServiceError::HealthCheckFailed { .. } => 4,
        };

        std::process::exit(exit_code);
    }

    Ok(())
}
