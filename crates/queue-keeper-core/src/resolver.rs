//! # Repository resolver (C3, spec §4.3)
//!
//! Maps an upstream repository id to the locally known [`Entity`] and
//! enforces the privacy policy before any event derived from that repo is
//! allowed to reach the normalizer.

use crate::entity::Entity;
use crate::entity_store::EntityStore;
use crate::{EntityType, ProjectId};
use async_trait::async_trait;
use std::collections::HashMap;

/// Feature-flag lookups the resolver needs (§4.3 `private_repositories_enabled`).
/// A thin seam over the feature-flag client named as an external collaborator
/// in spec §1.
#[async_trait]
pub trait FeatureFlagClient: Send + Sync {
    async fn is_enabled(&self, project_id: ProjectId, flag: &str) -> bool;
}

pub const PRIVATE_REPOSITORIES_FLAG: &str = "private_repositories_enabled";

/// Refreshes an entity's property bag from the upstream provider (§4.3
/// "refreshes the entity's property bag from the upstream provider on every
/// hit"). Implemented against `github-bot-sdk`'s repository client in
/// production; mocked in tests.
#[async_trait]
pub trait PropertyRefresher: Send + Sync {
    async fn refresh(&self, entity: &Entity) -> Result<HashMap<String, serde_json::Value>, ResolverError>;
}

/// In-memory reference adapter for the feature-flag client named as an
/// external collaborator in spec §1. Flags default to disabled; callers
/// that need a flag on for a test or a deployment without a real
/// feature-flag service wire it through [`Self::set`].
#[derive(Default)]
pub struct InMemoryFeatureFlagClient {
    enabled: std::sync::Mutex<HashMap<(ProjectId, String), bool>>,
}

impl InMemoryFeatureFlagClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, project_id: ProjectId, flag: &str, value: bool) {
        self.enabled
            .lock()
            .unwrap()
            .insert((project_id, flag.to_string()), value);
    }
}

#[async_trait]
impl FeatureFlagClient for InMemoryFeatureFlagClient {
    async fn is_enabled(&self, project_id: ProjectId, flag: &str) -> bool {
        self.enabled
            .lock()
            .unwrap()
            .get(&(project_id, flag.to_string()))
            .copied()
            .unwrap_or(false)
    }
}

/// A refresher that never fails and changes nothing, for delete paths where
/// a refresh failure must not be fatal (§4.3).
pub struct NoopRefresher;

#[async_trait]
impl PropertyRefresher for NoopRefresher {
    async fn refresh(&self, _entity: &Entity) -> Result<HashMap<String, serde_json::Value>, ResolverError> {
        Ok(HashMap::new())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("REPO_NOT_FOUND")]
    RepoNotFound,

    #[error("REPO_IS_PRIVATE")]
    RepoIsPrivate,

    #[error("NOT_HANDLED")]
    NotHandled,

    #[error("property refresh failed: {0}")]
    RefreshFailed(String),

    #[error("store error: {0}")]
    Store(#[from] crate::entity_store::EntityStoreError),
}

/// Successful resolution of an upstream repository id to a local entity.
#[derive(Debug, Clone)]
pub struct RepositoryResolution {
    pub entity: Entity,
    pub properties: HashMap<String, serde_json::Value>,
}

/// Resolves upstream repository ids to local entities (§4.3).
pub struct RepositoryResolver<'a> {
    store: &'a dyn EntityStore,
    features: &'a dyn FeatureFlagClient,
}

impl<'a> RepositoryResolver<'a> {
    pub fn new(store: &'a dyn EntityStore, features: &'a dyn FeatureFlagClient) -> Self {
        Self { store, features }
    }

    /// Resolve for an evaluate/reconcile path: a refresh failure is fatal.
    pub async fn resolve(
        &self,
        upstream_id: &serde_json::Value,
        upstream_private: bool,
        hook_id: Option<i64>,
        refresher: &dyn PropertyRefresher,
    ) -> Result<RepositoryResolution, ResolverError> {
        self.resolve_inner(upstream_id, upstream_private, hook_id, refresher, true)
            .await
    }

    /// Resolve for a delete path: a refresh failure is logged, not fatal
    /// (§4.3 "failures to refresh are non-fatal for delete paths").
    pub async fn resolve_for_delete(
        &self,
        upstream_id: &serde_json::Value,
        upstream_private: bool,
        hook_id: Option<i64>,
        refresher: &dyn PropertyRefresher,
    ) -> Result<RepositoryResolution, ResolverError> {
        self.resolve_inner(upstream_id, upstream_private, hook_id, refresher, false)
            .await
    }

    async fn resolve_inner(
        &self,
        upstream_id: &serde_json::Value,
        upstream_private: bool,
        hook_id: Option<i64>,
        refresher: &dyn PropertyRefresher,
        refresh_is_fatal: bool,
    ) -> Result<RepositoryResolution, ResolverError> {
        let entity = self
            .store
            .find_entity_by_upstream_id(EntityType::Repository, upstream_id)
            .await?
            .ok_or(ResolverError::RepoNotFound)?;

        // Data-integrity guard (§4.3): a project-less entity is treated as
        // not found rather than surfaced as an internal error.
        if entity.project_id.as_uuid().is_nil() {
            return Err(ResolverError::RepoNotFound);
        }

        if upstream_private
            && !self
                .features
                .is_enabled(entity.project_id, PRIVATE_REPOSITORIES_FLAG)
                .await
        {
            return Err(ResolverError::RepoIsPrivate);
        }

        if let Some(hook_id) = hook_id {
            let recorded = self.store.get_property(entity.id, "hook_id").await?;
            let matches = recorded
                .as_ref()
                .and_then(|v| v.as_i64())
                .map(|recorded_id| recorded_id == hook_id)
                .unwrap_or(false);
            if !matches {
                return Err(ResolverError::NotHandled);
            }
        }

        match refresher.refresh(&entity).await {
            Ok(properties) => Ok(RepositoryResolution { entity, properties }),
            Err(err) if refresh_is_fatal => Err(err),
            Err(err) => {
                tracing::warn!(entity_id = %entity.id, error = %err, "property refresh failed on delete path; continuing");
                Ok(RepositoryResolution {
                    entity,
                    properties: HashMap::new(),
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
