//! Shared state for the RPC surface (C8) and its interceptor chain (C7).
//!
//! Distinct from [`crate::AppState`], which backs the webhook-ingestion
//! router (C1-C6): the RPC router is mounted separately with its own state
//! type, since it depends on the identity provider and authorization client
//! rather than per-provider webhook secrets.

use queue_keeper_core::{
    AuthorizationClient, EntityStore, IdentityProvider, InMemoryInvitationStore,
    InMemoryRuleTypeStore, InvitationStore, RuleTypeStore, UpstreamDeregistrar,
    WorkItemPublisher,
};
use queue_runtime::QueueClient;
use std::sync::Arc;

#[derive(Clone)]
pub struct RpcState {
    pub entity_store: Arc<dyn EntityStore>,
    pub deregistrar: Arc<dyn UpstreamDeregistrar>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub authz: Arc<dyn AuthorizationClient>,
    pub invitations: Arc<dyn InvitationStore>,
    pub rule_types: Arc<dyn RuleTypeStore>,
    pub queue_client: Arc<dyn QueueClient>,
}

impl RpcState {
    pub fn new(
        entity_store: Arc<dyn EntityStore>,
        deregistrar: Arc<dyn UpstreamDeregistrar>,
        identity_provider: Arc<dyn IdentityProvider>,
        authz: Arc<dyn AuthorizationClient>,
        queue_client: Arc<dyn QueueClient>,
    ) -> Self {
        Self {
            entity_store,
            deregistrar,
            identity_provider,
            authz,
            invitations: Arc::new(InMemoryInvitationStore::new()),
            rule_types: Arc::new(InMemoryRuleTypeStore::new()),
            queue_client,
        }
    }

    pub fn publisher(&self) -> WorkItemPublisher<'_> {
        WorkItemPublisher::new(self.queue_client.as_ref())
    }
}
