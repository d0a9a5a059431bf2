//! # RPC surface (C8, spec §4.8)
//!
//! The handler bodies behind the transport-neutral RPC contract: every
//! function here assumes steps 1-2 of §4.8 (read [`EntityContext`] from
//! request context, resolve the [`Provider`] row) have already happened and
//! that the project-authorization interceptor (§4.7 step 7) has already
//! admitted the caller at the required [`Role`]. What's left is input
//! validation, the transactional operation, and the typed response — the
//! part of each handler worth unit-testing independently of a transport.

use crate::entity::{EntityContext, Invitation, Project, ProjectMetadata, Provider, ProviderClass};
use crate::entity_store::{EntityStore, EntityStoreError};
use crate::identity::{AuthorizationClient, AuthorizationError, IdentityProvider, Role, UserRow};
use crate::normalizer::WorkItem;
use crate::queue_integration::WorkItemPublisher;
use crate::{EntityId, EntityType, ProjectId, ProviderId, Timestamp, UserRowId};
use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

/// Standard RPC error kinds (§6, §7).
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<EntityStoreError> for RpcError {
    fn from(err: EntityStoreError) -> Self {
        match err {
            EntityStoreError::AlreadyExists { name } => Self::AlreadyExists(name),
            EntityStoreError::EntityNotFound
            | EntityStoreError::ProviderNotFound
            | EntityStoreError::PullRequestNotFound
            | EntityStoreError::UserNotFound => Self::NotFound(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<AuthorizationError> for RpcError {
    fn from(err: AuthorizationError) -> Self {
        Self::Internal(err.to_string())
    }
}

// ============================================================================
// CreateProvider / DeleteProvider
// ============================================================================

/// Validated inputs to `CreateProvider` (§4.8).
pub struct CreateProviderRequest {
    pub name: String,
    pub class: String,
    pub config: serde_json::Value,
}

fn validate_provider_config(class: ProviderClass, config: &serde_json::Value) -> Result<(), RpcError> {
    match class {
        ProviderClass::GhApp => {
            if let Some(auto) = config.get("auto_registration").and_then(|v| v.get("entities")) {
                let obj = auto.as_object().ok_or_else(|| {
                    RpcError::InvalidArgument("auto_registration.entities must be an object".into())
                })?;
                for key in obj.keys() {
                    if key != "repository" {
                        return Err(RpcError::InvalidArgument(format!(
                            "auto_registration.entities key '{key}' is not supported"
                        )));
                    }
                }
            }
            Ok(())
        }
        ProviderClass::DockerHub => {
            let namespace = config.get("namespace").and_then(|v| v.as_str());
            if namespace.map(str::is_empty).unwrap_or(true) {
                Err(RpcError::InvalidArgument(
                    "dockerhub provider requires a non-empty 'namespace'".into(),
                ))
            } else {
                Ok(())
            }
        }
        ProviderClass::GhOauth => Ok(()),
    }
}

/// `CreateProvider(class, config)` (§4.8).
pub async fn create_provider(
    store: &dyn EntityStore,
    context: &EntityContext,
    request: CreateProviderRequest,
) -> Result<Provider, RpcError> {
    let class = ProviderClass::parse(&request.class)
        .map_err(|e| RpcError::InvalidArgument(e.to_string()))?;
    validate_provider_config(class, &request.config)?;

    if store
        .get_provider_by_name(context.project_id, &request.name)
        .await?
        .is_some()
    {
        return Err(RpcError::AlreadyExists(request.name));
    }

    let provider = Provider::new(context.project_id, request.name, class, request.config);
    Ok(store.create_provider(provider).await?)
}

/// `DeleteProvider` (by name, resolved via §4.8 step 2) / `DeleteProviderByID`.
/// Returns the deleted provider's name and id so either RPC shape can report
/// what was removed (§4.4 provider-deletion contract, §8 property 10).
pub async fn delete_provider(
    store: &dyn EntityStore,
    deregistrar: &dyn crate::entity_store::UpstreamDeregistrar,
    provider_id: ProviderId,
) -> Result<Provider, RpcError> {
    let mut tx = store.begin().await?;
    let provider = tx.delete_provider(provider_id, deregistrar).await;
    match provider {
        Ok(provider) => {
            tx.commit().await?;
            Ok(provider)
        }
        Err(err) => Err(err.into()),
    }
}

// ============================================================================
// ListEntities / GetEntityById / GetEntityByName
// ============================================================================

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone)]
pub struct EntityPage {
    pub entities: Vec<crate::entity::Entity>,
    /// Opaque cursor for the next page; `None` once exhausted.
    pub next: Option<EntityId>,
}

/// `ListEntities(type, cursor)` (§4.8): default page size 20, opaque cursor.
pub async fn list_entities(
    store: &dyn EntityStore,
    context: &EntityContext,
    entity_type: EntityType,
    cursor: Option<EntityId>,
    page_size: Option<usize>,
) -> Result<EntityPage, RpcError> {
    let limit = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    let entities = store
        .list_entities(context.project_id, entity_type, cursor, limit)
        .await?;
    let next = if entities.len() == limit {
        entities.last().map(|e| e.id)
    } else {
        None
    };
    Ok(EntityPage { entities, next })
}

/// `GetEntityById` (§4.8): strict tenant check.
pub async fn get_entity_by_id(
    store: &dyn EntityStore,
    context: &EntityContext,
    id: EntityId,
) -> Result<crate::entity::Entity, RpcError> {
    let entity = store
        .get_entity(id)
        .await?
        .ok_or_else(|| RpcError::NotFound(format!("entity {id} not found")))?;
    if entity.project_id != context.project_id {
        return Err(RpcError::NotFound(format!("entity {id} not found")));
    }
    Ok(entity)
}

/// `GetEntityByName` (§4.8).
pub async fn get_entity_by_name(
    store: &dyn EntityStore,
    context: &EntityContext,
    entity_type: EntityType,
    name: &str,
) -> Result<crate::entity::Entity, RpcError> {
    store
        .get_entity_by_name(context.project_id, entity_type, name)
        .await?
        .ok_or_else(|| RpcError::NotFound(format!("entity '{name}' not found")))
}

// ============================================================================
// CreateEntity / RegisterEntity
// ============================================================================

const MAX_IDENTIFYING_PROPERTIES_BYTES: usize = 32 * 1024;
const MAX_PROPERTY_KEY_CHARS: usize = 200;

/// `CreateEntity`/`RegisterEntity` (§4.8): either a legacy `name` or an
/// `identifying_properties` bag, not both unset.
pub enum EntityIdentity {
    Name(String),
    Properties(Vec<(String, serde_json::Value)>),
}

pub async fn create_entity(
    store: &dyn EntityStore,
    context: &EntityContext,
    provider_id: ProviderId,
    entity_type: EntityType,
    identity: EntityIdentity,
    originated_from: Option<EntityId>,
) -> Result<crate::entity::Entity, RpcError> {
    if entity_type == EntityType::Unspecified {
        return Err(RpcError::InvalidArgument("entity_type must not be unspecified".into()));
    }

    let (name, properties) = match identity {
        EntityIdentity::Name(name) => (name, Vec::new()),
        EntityIdentity::Properties(properties) => {
            let encoded = serde_json::to_vec(&properties)
                .map_err(|e| RpcError::InvalidArgument(e.to_string()))?;
            if encoded.len() > MAX_IDENTIFYING_PROPERTIES_BYTES {
                return Err(RpcError::InvalidArgument(
                    "identifying_properties exceeds 32 KiB".into(),
                ));
            }
            for (key, _) in &properties {
                if key.chars().count() > MAX_PROPERTY_KEY_CHARS {
                    return Err(RpcError::InvalidArgument(format!(
                        "property key '{key}' exceeds 200 characters"
                    )));
                }
            }
            let name = properties
                .iter()
                .find(|(k, _)| k == crate::entity::UPSTREAM_ID_KEY)
                .map(|(_, v)| v.to_string())
                .ok_or_else(|| {
                    RpcError::InvalidArgument(
                        "identifying_properties must include 'upstream_id'".into(),
                    )
                })?;
            (name, properties)
        }
    };

    let mut tx = store.begin().await?;
    let entity = tx
        .create_or_ensure_entity_by_id(
            EntityId::new(),
            entity_type,
            name,
            context.project_id,
            provider_id,
            originated_from,
        )
        .await?;
    for (key, value) in properties {
        tx.upsert_property(entity.id, key, value).await?;
    }
    tx.commit().await?;
    Ok(entity)
}

/// `CreateEntityReconciliationTask(entity)` (§4.8): builds an
/// `EntityReconcileAdd`-shaped message and publishes it. Publish failure is
/// non-fatal — logged, not surfaced (§4.8).
pub async fn create_entity_reconciliation_task(
    publisher: &WorkItemPublisher<'_>,
    context: &EntityContext,
    provider_id: ProviderId,
    repository_name: &str,
    owner: &str,
) -> Result<(), RpcError> {
    let item = WorkItem::EntityReconcileAdd {
        project_id: context.project_id,
        provider_id,
        entity_type: EntityType::Repository,
        attributes: serde_json::json!({ "name": repository_name, "owner": owner }),
    };
    if let Err(err) = publisher
        .publish(&item, "rpc-reconcile", "rpc", "reconciliation-task")
        .await
    {
        tracing::warn!(error = %err, "failed to publish reconciliation task; continuing");
    }
    Ok(())
}

// ============================================================================
// CreateUser / DeleteUser
// ============================================================================

/// `CreateUser` (§4.8): self-enrollment, all in one transaction. Persists
/// the user row, claims a pending installation matching the token's
/// `gh_id` claim (§3 Installation "claimed by binding to a project on the
/// first user login"), and creates a default project named after the
/// preferred username (with a random 4-hex suffix on collision, §8
/// property 14).
pub async fn create_user(
    store: &dyn EntityStore,
    subject: &str,
    gh_id: Option<i64>,
    preferred_username: &str,
) -> Result<(UserRow, Option<ProjectId>), RpcError> {
    let mut tx = store.begin().await?;

    let user = UserRow::new(subject.to_string());
    tx.create_user(user.clone()).await?;

    let project_name = unique_project_name(tx.as_ref(), preferred_username).await?;
    let project = Project::new(
        None,
        ProjectMetadata {
            display_name: project_name,
            description: String::new(),
        },
    );
    let project = tx.create_project(project).await?;

    if let Some(gh_id) = gh_id {
        if let Some(mut installation) = tx.find_installation_by_enroller(gh_id).await? {
            // Claiming an installation binds it to the enrollee's fresh
            // project and to a `gh-app` provider scoped to that project
            // (§3: both `provider-id` and `project-id` are nullable until
            // claimed).
            let provider = Provider::new(
                project.id,
                format!("gh-app-{}", installation.installation_id),
                ProviderClass::GhApp,
                serde_json::json!({}),
            );
            let provider = tx.create_provider(provider).await?;
            installation.enrolling_user_id = subject.to_string();
            installation.project_id = Some(project.id);
            installation.provider_id = Some(provider.id);
            tx.upsert_installation(installation).await?;
        }
    }

    tx.commit().await?;
    Ok((user, Some(project.id)))
}

/// §8 property 14: two concurrent registrations for the same preferred
/// username must not collide on project display name.
async fn unique_project_name(
    tx: &dyn crate::entity_store::EntityStoreTransaction,
    preferred: &str,
) -> Result<String, RpcError> {
    if !tx.project_name_taken(preferred).await? {
        return Ok(preferred.to_string());
    }
    let suffix = format!("{:04x}", rand::random::<u16>());
    Ok(format!("{preferred}-{suffix}"))
}

/// `DeleteUser` (§4.8): data-store first (rollback on failure), authz last
/// (no rollback available, log only).
pub async fn delete_user(
    store: &dyn EntityStore,
    authz: &dyn AuthorizationClient,
    identity_provider: &dyn IdentityProvider,
    subject: &str,
) -> Result<(), RpcError> {
    let candidate_projects = authz.projects_for_user(subject).await?;
    let mut sole_member_projects = Vec::with_capacity(candidate_projects.len());
    for project_id in candidate_projects {
        let members = authz.subjects_for_project(project_id).await?;
        if members.len() == 1 && members[0] == subject {
            sole_member_projects.push(project_id);
        }
    }

    let mut tx = store.begin().await?;
    tx.delete_user(subject).await?;
    for project_id in sole_member_projects {
        tx.delete_project(project_id).await?;
    }
    tx.commit().await?;

    if let Err(err) = authz.delete_user(subject).await {
        tracing::error!(subject = %subject, error = %err, "authorization store delete_user failed; leaving a dangling-tuple reconciliation task (§9)");
    }
    identity_provider
        .delete_account(subject)
        .await
        .map_err(|e| RpcError::Internal(e.to_string()))
}

// ============================================================================
// ResolveInvitation
// ============================================================================

/// `ResolveInvitation(code, accept)` (§4.8, §8 properties 11-12).
pub async fn resolve_invitation(
    authz: &dyn AuthorizationClient,
    invitation: Invitation,
    accepter: UserRowId,
    accept: bool,
    now: Timestamp,
) -> Result<(), RpcError> {
    if invitation.is_expired(now) {
        return Err(RpcError::PermissionDenied("invitation expired".into()));
    }
    if invitation.sponsor == accepter {
        return Err(RpcError::InvalidArgument(
            "cannot resolve an invitation you sponsored yourself".into(),
        ));
    }
    if accept {
        let role = parse_role(&invitation.role)?;
        authz
            .revoke_all_roles(&accepter.to_string(), invitation.project_id)
            .await?;
        authz
            .assign_role(&accepter.to_string(), role, invitation.project_id)
            .await?;
    }
    Ok(())
}

fn parse_role(role: &str) -> Result<Role, RpcError> {
    match role {
        "viewer" => Ok(Role::Viewer),
        "editor" => Ok(Role::Editor),
        "admin" => Ok(Role::Admin),
        other => Err(RpcError::InvalidArgument(format!("unknown role '{other}'"))),
    }
}

// ============================================================================
// CreateRuleType / UpdateRuleType guidance validation
// ============================================================================

const MAX_GUIDANCE_BYTES: usize = 4 * 1024;

fn html_tag_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| regex::Regex::new(r"<[a-zA-Z!/][^>]*>").unwrap())
}

/// Validates a rule type's `guidance` field: must be valid UTF-8 (guaranteed
/// by `&str`'s invariant at the call boundary), ≤ 4 KiB, and free of
/// HTML-unsafe tags (§4.8, §8 property 13).
pub fn validate_guidance(guidance: &str) -> Result<(), RpcError> {
    if guidance.len() > MAX_GUIDANCE_BYTES {
        return Err(RpcError::InvalidArgument(
            "guidance exceeds 4 KiB".to_string(),
        ));
    }
    if html_tag_pattern().is_match(guidance) {
        return Err(RpcError::InvalidArgument(
            "guidance must not contain HTML tags".to_string(),
        ));
    }
    Ok(())
}

/// Decodes a byte slice as UTF-8 and validates it as rule-type guidance in
/// one step, so callers that receive raw bytes (not yet a `&str`) get the
/// `0xff 0xfe 0xfd`-style invalid-UTF-8 rejection from §8 property 13 too.
pub fn validate_guidance_bytes(guidance: &[u8]) -> Result<String, RpcError> {
    let text = std::str::from_utf8(guidance)
        .map_err(|_| RpcError::InvalidArgument("guidance is not valid UTF-8".to_string()))?;
    validate_guidance(text)?;
    Ok(text.to_string())
}

// ============================================================================
// ListProjects
// ============================================================================

/// `ListProjects` (§4.8, §8 property 6): iterates project ids the authz
/// store returns, silently skipping ids whose project row no longer exists.
pub async fn list_projects(
    store: &dyn EntityStore,
    authz: &dyn AuthorizationClient,
    subject: &str,
) -> Result<Vec<Project>, RpcError> {
    let ids = authz.projects_for_user(subject).await?;
    let mut projects = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(project) = store.get_project(id).await? {
            projects.push(project);
        }
    }
    Ok(projects)
}

#[cfg(test)]
#[path = "rpc_tests.rs"]
mod tests;
