//! # Entity store (C4, spec §4.4)
//!
//! The transactional home of the data model in [`crate::entity`]. Every
//! multi-statement operation runs inside one transaction acquired from
//! [`EntityStore::begin`]; the transaction handle is dropped (rolled back)
//! unless [`EntityStoreTransaction::commit`] is called, mirroring the
//! teacher's `BeginTransaction`/deferred-rollback discipline (§4.4
//! "Transaction discipline").
//!
//! The real store is the external relational database named in spec §1;
//! [`InMemoryEntityStore`] here is the reference adapter used by tests and
//! by the in-process reconciliation paths that don't need a real database.

use crate::entity::{
    Artifact, ArtifactVersion, Entity, Installation, Project, Provider, PullRequestRow,
};
use crate::identity::UserRow;
use crate::{EntityId, EntityType, ProjectId, ProviderId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Errors the entity store can raise (mapped to the §7 RPC error kinds by
/// callers: `AlreadyExists` -> `ALREADY_EXISTS`, `NotFound` -> `NOT_FOUND`,
/// everything else -> `INTERNAL`).
#[derive(Debug, thiserror::Error)]
pub enum EntityStoreError {
    #[error("entity '{name}' already exists in project/type scope")]
    AlreadyExists { name: String },

    #[error("entity not found")]
    EntityNotFound,

    #[error("provider not found")]
    ProviderNotFound,

    #[error("pull request not found")]
    PullRequestNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("transaction already committed")]
    AlreadyCommitted,

    #[error("store error: {0}")]
    Internal(String),
}

/// Best-effort upstream deregistration hook invoked once per entity during
/// [`EntityStoreTransaction::delete_provider`] (§4.4 provider deletion).
/// Failures are logged by the caller and do not abort the cascade.
#[async_trait]
pub trait UpstreamDeregistrar: Send + Sync {
    async fn deregister(&self, provider: &Provider, entity: &Entity) -> Result<(), String>;
}

/// A no-op deregistrar for tests and for provider classes with nothing to
/// tell upstream (e.g. a bare OAuth provider with no webhook to unregister).
pub struct NoopDeregistrar;

#[async_trait]
impl UpstreamDeregistrar for NoopDeregistrar {
    async fn deregister(&self, _provider: &Provider, _entity: &Entity) -> Result<(), String> {
        Ok(())
    }
}

/// A single transactional scope over the entity store (§4.4).
///
/// All writes made through a transaction are invisible to other readers
/// until [`commit`](Self::commit) returns `Ok`; dropping the transaction
/// without committing rolls back every staged change.
#[async_trait]
pub trait EntityStoreTransaction: Send {
    /// Idempotent ensure: returns the existing entity if one with this id
    /// is already present, otherwise creates it. Fails `AlreadyExists` if
    /// `name` collides with another entity in the same `(project, type)`.
    async fn create_or_ensure_entity_by_id(
        &mut self,
        id: EntityId,
        entity_type: EntityType,
        name: String,
        project_id: ProjectId,
        provider_id: ProviderId,
        originated_from: Option<EntityId>,
    ) -> Result<Entity, EntityStoreError>;

    async fn upsert_property(
        &mut self,
        entity_id: EntityId,
        key: String,
        value: serde_json::Value,
    ) -> Result<(), EntityStoreError>;

    async fn get_properties(
        &self,
        entity_id: EntityId,
    ) -> Result<HashMap<String, serde_json::Value>, EntityStoreError>;

    async fn get_pull_request(
        &self,
        repository_id: EntityId,
        pr_number: u64,
    ) -> Result<Option<PullRequestRow>, EntityStoreError>;

    async fn upsert_pull_request(
        &mut self,
        repository_id: EntityId,
        pr_number: u64,
        entity_id: EntityId,
    ) -> Result<PullRequestRow, EntityStoreError>;

    /// Deletes the pull request row and its mirrored entity. Absorbs a
    /// "not found" as success (§8 property 5: closed-on-already-closed is a
    /// no-op).
    async fn delete_pull_request(
        &mut self,
        repository_id: EntityId,
        pr_number: u64,
    ) -> Result<(), EntityStoreError>;

    async fn upsert_artifact(
        &mut self,
        repository_id: EntityId,
        name: String,
        artifact_type: String,
    ) -> Result<Artifact, EntityStoreError>;

    /// Tag-conflict resolution (§4.4): reassigns every incoming tag away
    /// from whichever version currently holds it, pruning versions whose
    /// tag set becomes empty, then upserts the new version.
    async fn upsert_artifact_version(
        &mut self,
        artifact_id: EntityId,
        version_id: String,
        incoming_tags: Vec<String>,
        sha: String,
        created_at: crate::Timestamp,
    ) -> Result<ArtifactVersion, EntityStoreError>;

    async fn find_artifact_version_by_sha(
        &self,
        artifact_id: EntityId,
        sha: &str,
    ) -> Result<Option<ArtifactVersion>, EntityStoreError>;

    async fn delete_entity_by_name(
        &mut self,
        project_id: ProjectId,
        entity_type: EntityType,
        name: &str,
    ) -> Result<(), EntityStoreError>;

    /// Cascades: deregister each entity with upstream (best-effort, logged
    /// by the caller on error), delete the installation record if
    /// app-class, delete the provider row. All inside this transaction.
    async fn delete_provider(
        &mut self,
        provider_id: ProviderId,
        deregistrar: &dyn UpstreamDeregistrar,
    ) -> Result<Provider, EntityStoreError>;

    /// Persists the user row created on self-enrollment (§4.8 `CreateUser`),
    /// keyed on its IdP subject.
    async fn create_user(&mut self, user: UserRow) -> Result<UserRow, EntityStoreError>;

    /// Deletes the user row keyed on `subject`. Absorbs "not found" as
    /// success, mirroring the pull-request delete's idempotence (§8
    /// property 5's pattern applied to `DeleteUser`, §4.8).
    async fn delete_user(&mut self, subject: &str) -> Result<(), EntityStoreError>;

    /// Transaction-scoped project create, used by `CreateUser` so the user
    /// row, default project, and installation claim commit atomically
    /// (§4.8 "All in one transaction").
    async fn create_project(&mut self, project: Project) -> Result<Project, EntityStoreError>;

    /// Deletes a project row (§4.8 `DeleteUser` "deletes all projects where
    /// this user was the sole member").
    async fn delete_project(&mut self, project_id: ProjectId) -> Result<(), EntityStoreError>;

    /// Whether a project with this display name already exists, for the
    /// `CreateUser` default-project collision check (§8 property 14).
    async fn project_name_taken(&self, name: &str) -> Result<bool, EntityStoreError>;

    /// Transaction-scoped provider create, used to bind a fresh `gh-app`
    /// provider to a claimed installation inside `CreateUser`'s transaction.
    async fn create_provider(&mut self, provider: Provider) -> Result<Provider, EntityStoreError>;

    /// Transaction-scoped installation upsert, used to bind `project_id`/
    /// `provider_id` onto a claimed installation (§3 Installation "claimed
    /// by binding to a project on the first user login").
    async fn upsert_installation(
        &mut self,
        installation: Installation,
    ) -> Result<Installation, EntityStoreError>;

    /// Looks up a pending (unclaimed, i.e. `project_id.is_none()`)
    /// installation whose `enrolling_user_id` matches the token's `gh_id`
    /// claim (§3 Installation, §4.8 `CreateUser`).
    async fn find_installation_by_enroller(
        &self,
        gh_id: i64,
    ) -> Result<Option<Installation>, EntityStoreError>;

    /// Commits every staged change atomically. Consuming `self` prevents a
    /// transaction from being committed twice.
    async fn commit(self: Box<Self>) -> Result<(), EntityStoreError>;
}

/// Read-heavy accessors plus the ability to open a transaction (§5
/// "readers use the pool directly; only the transaction holder may write").
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn EntityStoreTransaction>, EntityStoreError>;

    async fn get_entity(&self, id: EntityId) -> Result<Option<Entity>, EntityStoreError>;

    async fn get_entity_by_name(
        &self,
        project_id: ProjectId,
        entity_type: EntityType,
        name: &str,
    ) -> Result<Option<Entity>, EntityStoreError>;

    /// Looks up the entity whose `upstream_id` property equals `upstream_id`
    /// (§4.3 repository resolver core lookup).
    async fn find_entity_by_upstream_id(
        &self,
        entity_type: EntityType,
        upstream_id: &serde_json::Value,
    ) -> Result<Option<Entity>, EntityStoreError>;

    async fn get_property(
        &self,
        entity_id: EntityId,
        key: &str,
    ) -> Result<Option<serde_json::Value>, EntityStoreError>;

    async fn list_entities(
        &self,
        project_id: ProjectId,
        entity_type: EntityType,
        after: Option<EntityId>,
        limit: usize,
    ) -> Result<Vec<Entity>, EntityStoreError>;

    async fn get_provider_by_name(
        &self,
        project_id: ProjectId,
        name: &str,
    ) -> Result<Option<Provider>, EntityStoreError>;

    async fn get_provider(&self, id: ProviderId) -> Result<Option<Provider>, EntityStoreError>;

    async fn create_provider(&self, provider: Provider) -> Result<Provider, EntityStoreError>;

    async fn create_project(&self, project: Project) -> Result<Project, EntityStoreError>;

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, EntityStoreError>;

    async fn get_installation(
        &self,
        installation_id: i64,
    ) -> Result<Option<Installation>, EntityStoreError>;

    async fn upsert_installation(
        &self,
        installation: Installation,
    ) -> Result<Installation, EntityStoreError>;

    async fn delete_installation(&self, installation_id: i64) -> Result<(), EntityStoreError>;
}

// ============================================================================
// In-memory reference implementation
// ============================================================================

#[derive(Default, Clone)]
struct StoreState {
    projects: HashMap<ProjectId, Project>,
    providers: HashMap<ProviderId, Provider>,
    entities: HashMap<EntityId, Entity>,
    properties: HashMap<EntityId, HashMap<String, serde_json::Value>>,
    pull_requests: HashMap<(EntityId, u64), PullRequestRow>,
    artifacts: HashMap<EntityId, Artifact>,
    artifact_versions: HashMap<(EntityId, String), ArtifactVersion>,
    installations: HashMap<i64, Installation>,
    users: HashMap<String, UserRow>,
}

impl StoreState {
    fn name_taken(&self, project_id: ProjectId, entity_type: EntityType, name: &str) -> bool {
        self.entities.values().any(|e| {
            e.project_id == project_id && e.entity_type == entity_type && e.name == name
        })
    }
}

/// In-memory reference [`EntityStore`]. Used by unit/integration tests and
/// by tooling that doesn't have a real relational store available; the
/// transaction semantics (stage-then-swap on commit) are real, so tests
/// exercising rollback behavior are meaningful.
#[derive(Clone, Default)]
pub struct InMemoryEntityStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn begin(&self) -> Result<Box<dyn EntityStoreTransaction>, EntityStoreError> {
        let staged = self.state.lock().unwrap().clone();
        Ok(Box::new(InMemoryTransaction {
            store: self.state.clone(),
            staged,
            committed: false,
        }))
    }

    async fn get_entity(&self, id: EntityId) -> Result<Option<Entity>, EntityStoreError> {
        Ok(self.state.lock().unwrap().entities.get(&id).cloned())
    }

    async fn get_entity_by_name(
        &self,
        project_id: ProjectId,
        entity_type: EntityType,
        name: &str,
    ) -> Result<Option<Entity>, EntityStoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .entities
            .values()
            .find(|e| e.project_id == project_id && e.entity_type == entity_type && e.name == name)
            .cloned())
    }

    async fn find_entity_by_upstream_id(
        &self,
        entity_type: EntityType,
        upstream_id: &serde_json::Value,
    ) -> Result<Option<Entity>, EntityStoreError> {
        let state = self.state.lock().unwrap();
        for entity in state.entities.values() {
            if entity.entity_type != entity_type {
                continue;
            }
            if let Some(props) = state.properties.get(&entity.id) {
                if props.get(crate::entity::UPSTREAM_ID_KEY) == Some(upstream_id) {
                    return Ok(Some(entity.clone()));
                }
            }
        }
        Ok(None)
    }

    async fn get_property(
        &self,
        entity_id: EntityId,
        key: &str,
    ) -> Result<Option<serde_json::Value>, EntityStoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .properties
            .get(&entity_id)
            .and_then(|props| props.get(key))
            .cloned())
    }

    async fn list_entities(
        &self,
        project_id: ProjectId,
        entity_type: EntityType,
        after: Option<EntityId>,
        limit: usize,
    ) -> Result<Vec<Entity>, EntityStoreError> {
        let state = self.state.lock().unwrap();
        let mut matching: Vec<_> = state
            .entities
            .values()
            .filter(|e| e.project_id == project_id && e.entity_type == entity_type)
            .cloned()
            .collect();
        matching.sort_by_key(|e| e.id.as_uuid());
        let start = match after {
            Some(cursor) => matching
                .iter()
                .position(|e| e.id == cursor)
                .map(|idx| idx + 1)
                .unwrap_or(0),
            None => 0,
        };
        Ok(matching.into_iter().skip(start).take(limit).collect())
    }

    async fn get_provider_by_name(
        &self,
        project_id: ProjectId,
        name: &str,
    ) -> Result<Option<Provider>, EntityStoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .providers
            .values()
            .find(|p| p.project_id == project_id && p.name == name)
            .cloned())
    }

    async fn get_provider(&self, id: ProviderId) -> Result<Option<Provider>, EntityStoreError> {
        Ok(self.state.lock().unwrap().providers.get(&id).cloned())
    }

    async fn create_provider(&self, provider: Provider) -> Result<Provider, EntityStoreError> {
        let mut state = self.state.lock().unwrap();
        if state
            .providers
            .values()
            .any(|p| p.project_id == provider.project_id && p.name == provider.name)
        {
            return Err(EntityStoreError::AlreadyExists {
                name: provider.name,
            });
        }
        state.providers.insert(provider.id, provider.clone());
        Ok(provider)
    }

    async fn create_project(&self, project: Project) -> Result<Project, EntityStoreError> {
        let mut state = self.state.lock().unwrap();
        state.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, EntityStoreError> {
        Ok(self.state.lock().unwrap().projects.get(&id).cloned())
    }

    async fn get_installation(
        &self,
        installation_id: i64,
    ) -> Result<Option<Installation>, EntityStoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .installations
            .get(&installation_id)
            .cloned())
    }

    async fn upsert_installation(
        &self,
        installation: Installation,
    ) -> Result<Installation, EntityStoreError> {
        let mut state = self.state.lock().unwrap();
        state
            .installations
            .insert(installation.installation_id, installation.clone());
        Ok(installation)
    }

    async fn delete_installation(&self, installation_id: i64) -> Result<(), EntityStoreError> {
        self.state.lock().unwrap().installations.remove(&installation_id);
        Ok(())
    }
}

struct InMemoryTransaction {
    store: Arc<Mutex<StoreState>>,
    staged: StoreState,
    committed: bool,
}

#[async_trait]
impl EntityStoreTransaction for InMemoryTransaction {
    async fn create_or_ensure_entity_by_id(
        &mut self,
        id: EntityId,
        entity_type: EntityType,
        name: String,
        project_id: ProjectId,
        provider_id: ProviderId,
        originated_from: Option<EntityId>,
    ) -> Result<Entity, EntityStoreError> {
        if let Some(existing) = self.staged.entities.get(&id) {
            return Ok(existing.clone());
        }
        if self.staged.name_taken(project_id, entity_type, &name) {
            return Err(EntityStoreError::AlreadyExists { name });
        }
        let entity = Entity {
            id,
            entity_type,
            name,
            project_id,
            provider_id,
            originated_from,
        };
        self.staged.entities.insert(id, entity.clone());
        self.staged.properties.entry(id).or_default();
        Ok(entity)
    }

    async fn upsert_property(
        &mut self,
        entity_id: EntityId,
        key: String,
        value: serde_json::Value,
    ) -> Result<(), EntityStoreError> {
        self.staged
            .properties
            .entry(entity_id)
            .or_default()
            .insert(key, value);
        Ok(())
    }

    async fn get_properties(
        &self,
        entity_id: EntityId,
    ) -> Result<HashMap<String, serde_json::Value>, EntityStoreError> {
        Ok(self
            .staged
            .properties
            .get(&entity_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_pull_request(
        &self,
        repository_id: EntityId,
        pr_number: u64,
    ) -> Result<Option<PullRequestRow>, EntityStoreError> {
        Ok(self
            .staged
            .pull_requests
            .get(&(repository_id, pr_number))
            .cloned())
    }

    async fn upsert_pull_request(
        &mut self,
        repository_id: EntityId,
        pr_number: u64,
        entity_id: EntityId,
    ) -> Result<PullRequestRow, EntityStoreError> {
        let row = PullRequestRow {
            repository_id,
            pr_number,
            entity_id,
        };
        self.staged
            .pull_requests
            .insert((repository_id, pr_number), row.clone());
        Ok(row)
    }

    async fn delete_pull_request(
        &mut self,
        repository_id: EntityId,
        pr_number: u64,
    ) -> Result<(), EntityStoreError> {
        if let Some(row) = self.staged.pull_requests.remove(&(repository_id, pr_number)) {
            self.staged.entities.remove(&row.entity_id);
            self.staged.properties.remove(&row.entity_id);
        }
        // Absorbed if already gone (§8 property 5).
        Ok(())
    }

    async fn upsert_artifact(
        &mut self,
        repository_id: EntityId,
        name: String,
        artifact_type: String,
    ) -> Result<Artifact, EntityStoreError> {
        if let Some(existing) = self.staged.artifacts.values().find(|a| {
            a.repository_id == repository_id && a.name == name && a.artifact_type == artifact_type
        }) {
            return Ok(existing.clone());
        }
        let artifact = Artifact {
            id: EntityId::new(),
            repository_id,
            name,
            artifact_type,
        };
        self.staged.artifacts.insert(artifact.id, artifact.clone());
        Ok(artifact)
    }

    async fn upsert_artifact_version(
        &mut self,
        artifact_id: EntityId,
        version_id: String,
        incoming_tags: Vec<String>,
        sha: String,
        created_at: crate::Timestamp,
    ) -> Result<ArtifactVersion, EntityStoreError> {
        let incoming_tags = ArtifactVersion::canonicalize_tags(incoming_tags);

        let conflicting_keys: Vec<(EntityId, String)> = self
            .staged
            .artifact_versions
            .iter()
            .filter(|((aid, vid), version)| {
                *aid == artifact_id
                    && *vid != version_id
                    && version.tags.iter().any(|t| incoming_tags.contains(t))
            })
            .map(|(key, _)| key.clone())
            .collect();

        for key in conflicting_keys {
            let version = self.staged.artifact_versions.get_mut(&key).unwrap();
            version.tags.retain(|t| !incoming_tags.contains(t));
            if version.tags.is_empty() {
                self.staged.artifact_versions.remove(&key);
            }
        }

        let new_version = ArtifactVersion {
            artifact_id,
            version_id: version_id.clone(),
            tags: incoming_tags,
            sha,
            created_at,
        };
        self.staged
            .artifact_versions
            .insert((artifact_id, version_id), new_version.clone());
        Ok(new_version)
    }

    async fn find_artifact_version_by_sha(
        &self,
        artifact_id: EntityId,
        sha: &str,
    ) -> Result<Option<ArtifactVersion>, EntityStoreError> {
        Ok(self
            .staged
            .artifact_versions
            .values()
            .find(|v| v.artifact_id == artifact_id && v.sha == sha)
            .cloned())
    }

    async fn delete_entity_by_name(
        &mut self,
        project_id: ProjectId,
        entity_type: EntityType,
        name: &str,
    ) -> Result<(), EntityStoreError> {
        let id = self
            .staged
            .entities
            .values()
            .find(|e| e.project_id == project_id && e.entity_type == entity_type && e.name == name)
            .map(|e| e.id);
        if let Some(id) = id {
            self.staged.entities.remove(&id);
            self.staged.properties.remove(&id);
        }
        Ok(())
    }

    async fn delete_provider(
        &mut self,
        provider_id: ProviderId,
        deregistrar: &dyn UpstreamDeregistrar,
    ) -> Result<Provider, EntityStoreError> {
        let provider = self
            .staged
            .providers
            .get(&provider_id)
            .cloned()
            .ok_or(EntityStoreError::ProviderNotFound)?;

        let owned_entities: Vec<Entity> = self
            .staged
            .entities
            .values()
            .filter(|e| e.provider_id == provider_id)
            .cloned()
            .collect();

        for entity in &owned_entities {
            if let Err(err) = deregistrar.deregister(&provider, entity).await {
                tracing::warn!(
                    entity_id = %entity.id,
                    provider_id = %provider_id,
                    error = %err,
                    "failed to deregister entity with upstream provider during provider delete"
                );
            }
        }

        if provider.class.is_app() {
            self.staged
                .installations
                .retain(|_, inst| inst.provider_id != Some(provider_id));
        }

        for entity in &owned_entities {
            self.staged.entities.remove(&entity.id);
            self.staged.properties.remove(&entity.id);
        }
        self.staged.providers.remove(&provider_id);

        Ok(provider)
    }

    async fn create_user(&mut self, user: UserRow) -> Result<UserRow, EntityStoreError> {
        self.staged.users.insert(user.subject.clone(), user.clone());
        Ok(user)
    }

    async fn delete_user(&mut self, subject: &str) -> Result<(), EntityStoreError> {
        self.staged.users.remove(subject);
        Ok(())
    }

    async fn create_project(&mut self, project: Project) -> Result<Project, EntityStoreError> {
        self.staged.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn delete_project(&mut self, project_id: ProjectId) -> Result<(), EntityStoreError> {
        self.staged.projects.remove(&project_id);
        Ok(())
    }

    async fn project_name_taken(&self, name: &str) -> Result<bool, EntityStoreError> {
        Ok(self
            .staged
            .projects
            .values()
            .any(|p| p.metadata.display_name == name))
    }

    async fn create_provider(&mut self, provider: Provider) -> Result<Provider, EntityStoreError> {
        if self
            .staged
            .providers
            .values()
            .any(|p| p.project_id == provider.project_id && p.name == provider.name)
        {
            return Err(EntityStoreError::AlreadyExists {
                name: provider.name,
            });
        }
        self.staged.providers.insert(provider.id, provider.clone());
        Ok(provider)
    }

    async fn upsert_installation(
        &mut self,
        installation: Installation,
    ) -> Result<Installation, EntityStoreError> {
        self.staged
            .installations
            .insert(installation.installation_id, installation.clone());
        Ok(installation)
    }

    async fn find_installation_by_enroller(
        &self,
        gh_id: i64,
    ) -> Result<Option<Installation>, EntityStoreError> {
        Ok(self
            .staged
            .installations
            .values()
            .find(|inst| inst.enrolling_user_id == gh_id.to_string() && inst.project_id.is_none())
            .cloned())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), EntityStoreError> {
        if self.committed {
            return Err(EntityStoreError::AlreadyCommitted);
        }
        let mut guard = self.store.lock().unwrap();
        *guard = std::mem::take(&mut self.staged);
        self.committed = true;
        Ok(())
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if !self.committed {
            tracing::debug!("entity store transaction dropped without commit; rolled back");
        }
    }
}

#[cfg(test)]
#[path = "entity_store_tests.rs"]
mod tests;
