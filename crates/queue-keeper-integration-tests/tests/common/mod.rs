//! Common test utilities for queue-keeper-api integration tests
//!
//! This module provides:
//! - Mock implementations of [`HealthChecker`]
//! - Helper functions for building a signed webhook request and an [`AppState`]
//!   wired with in-memory reference adapters

use queue_keeper_api::{AppState, HealthChecker, ProviderConfig, ServiceConfig, ServiceMetrics, TelemetryConfig};
use queue_keeper_api::config::ProviderSecretConfig;
use queue_keeper_core::{InMemoryEntityStore, InMemoryFeatureFlagClient, NoopRefresher};
use queue_runtime::{InMemoryProvider, QueueConfig, StandardQueueClient};
use std::sync::{Arc, Mutex, OnceLock};

// ============================================================================
// Mock Health Checker
// ============================================================================

#[derive(Clone)]
#[allow(dead_code)]
pub struct MockHealthChecker {
    healthy: Arc<Mutex<bool>>,
}

impl MockHealthChecker {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self {
            healthy: Arc::new(Mutex::new(true)),
        }
    }

    #[allow(dead_code)]
    pub fn set_healthy(&self, healthy: bool) {
        *self.healthy.lock().unwrap() = healthy;
    }
}

#[async_trait::async_trait]
impl HealthChecker for MockHealthChecker {
    async fn check_basic_health(&self) -> queue_keeper_api::HealthStatus {
        let healthy = *self.healthy.lock().unwrap();
        let mut checks = std::collections::HashMap::new();
        checks.insert(
            "service".to_string(),
            queue_keeper_api::HealthCheckResult {
                healthy,
                duration_ms: 0,
                message: "Mock health check".to_string(),
            },
        );
        queue_keeper_api::HealthStatus {
            is_healthy: healthy,
            checks,
        }
    }

    async fn check_deep_health(&self) -> queue_keeper_api::HealthStatus {
        self.check_basic_health().await
    }

    async fn check_readiness(&self) -> bool {
        *self.healthy.lock().unwrap()
    }
}

// ============================================================================
// Test Fixture Builders
// ============================================================================

/// Prometheus registers metrics with a global registry that rejects
/// duplicate registrations; reuse one [`ServiceMetrics`] across tests.
static TEST_METRICS: OnceLock<Arc<ServiceMetrics>> = OnceLock::new();

#[allow(dead_code)]
pub fn test_metrics() -> Arc<ServiceMetrics> {
    TEST_METRICS
        .get_or_init(|| ServiceMetrics::new().expect("ServiceMetrics::new must succeed in tests"))
        .clone()
}

/// Canonical secret used by [`create_test_app_state`]'s "github" provider.
#[allow(dead_code)]
pub const TEST_WEBHOOK_SECRET: &str = "integration-test-secret";

/// Create a test [`AppState`] with a single "github" provider configured
/// with [`TEST_WEBHOOK_SECRET`], and in-memory reference adapters for every
/// other collaborator.
#[allow(dead_code)]
pub fn create_test_app_state() -> AppState {
    create_test_app_state_with_providers(vec![ProviderConfig {
        id: "github".to_string(),
        require_signature: true,
        secret: Some(ProviderSecretConfig::Literal {
            value: TEST_WEBHOOK_SECRET.to_string(),
        }),
        previous_secrets: vec![],
        allowed_event_types: vec![],
    }])
}

/// Create a test [`AppState`] with a custom health checker, keeping the
/// default "github" provider configuration.
#[allow(dead_code)]
pub fn create_test_app_state_with_health_checker(
    health_checker: Arc<dyn HealthChecker>,
) -> AppState {
    create_test_app_state_with_providers_and_health_checker(
        vec![ProviderConfig {
            id: "github".to_string(),
            require_signature: true,
            secret: Some(ProviderSecretConfig::Literal {
                value: TEST_WEBHOOK_SECRET.to_string(),
            }),
            previous_secrets: vec![],
            allowed_event_types: vec![],
        }],
        health_checker,
    )
}

/// Create a test [`AppState`] with an explicit set of provider configurations.
#[allow(dead_code)]
pub fn create_test_app_state_with_providers(providers: Vec<ProviderConfig>) -> AppState {
    create_test_app_state_with_providers_and_health_checker(
        providers,
        Arc::new(MockHealthChecker::new()),
    )
}

#[allow(dead_code)]
pub fn create_test_app_state_with_providers_and_health_checker(
    providers: Vec<ProviderConfig>,
    health_checker: Arc<dyn HealthChecker>,
) -> AppState {
    let mut config = ServiceConfig::default();
    config.providers = providers;
    let secrets = queue_keeper_api::resolve_provider_secrets(&config.providers);

    AppState::new(
        config,
        secrets,
        Arc::new(InMemoryEntityStore::new()),
        Arc::new(InMemoryFeatureFlagClient::new()),
        Arc::new(NoopRefresher),
        Arc::new(StandardQueueClient::new(
            Box::new(InMemoryProvider::default()),
            QueueConfig::default(),
        )),
        health_checker,
        test_metrics(),
        Arc::new(TelemetryConfig::new(
            "integration-test".to_string(),
            "test".to_string(),
        )),
    )
}

/// Sign `body` with [`TEST_WEBHOOK_SECRET`] and return the
/// `X-Hub-Signature-256` header value.
#[allow(dead_code)]
pub fn sign_with_test_secret(body: &[u8]) -> String {
    sign(body, TEST_WEBHOOK_SECRET)
}

#[allow(dead_code)]
pub fn sign(body: &[u8], secret: &str) -> String {
    let mut mac = hmac::Hmac::<sha2::Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    hmac::Mac::update(&mut mac, body);
    format!("sha256={}", hex::encode(hmac::Mac::finalize(mac).into_bytes()))
}
