//! # Event normalizer (C5, spec §4.5)
//!
//! Builds the typed [`WorkItem`] the publisher hands to the bus, given a
//! classified event family, the action string, and (when the family needs
//! it) a resolved repository entity. This module owns the routing table in
//! §4.5 verbatim, including the container-signature-tag special case and
//! the canonical tag ordering.

use crate::entity::{is_signature_tag, Artifact, ArtifactVersion, Entity, ProviderClass};
use crate::entity_store::{EntityStoreError, EntityStoreTransaction};
use crate::resolver::ResolverError;
use crate::{EntityId, EntityType, ProjectId, ProviderId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The four work-item shapes the normalizer emits (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkItem {
    EntityEvaluate {
        project_id: ProjectId,
        provider_id: ProviderId,
        entity_type: EntityType,
        entity_id: EntityId,
        snapshot: serde_json::Value,
    },
    EntityReconcileAdd {
        project_id: ProjectId,
        provider_id: ProviderId,
        entity_type: EntityType,
        attributes: serde_json::Value,
    },
    EntityReconcileDelete {
        project_id: ProjectId,
        provider_id: ProviderId,
        entity_type: EntityType,
        entity_id: EntityId,
    },
    InstallationLifecycle {
        class: ProviderClass,
        payload: serde_json::Value,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizerError {
    #[error("ARTIFACT_NOT_FOUND")]
    ArtifactNotFound,

    #[error("NOT_HANDLED")]
    NotHandled,

    #[error("malformed payload: {0}")]
    Parse(String),

    #[error(transparent)]
    Resolver(#[from] ResolverError),

    #[error(transparent)]
    Store(#[from] EntityStoreError),
}

fn properties_snapshot(properties: &HashMap<String, serde_json::Value>) -> serde_json::Value {
    serde_json::to_value(properties).unwrap_or(serde_json::Value::Null)
}

/// `repo-relevant`, action `deleted`/`transferred` -> delete; any other
/// action (including a meta event whose hook id matched) -> evaluate
/// (§4.5 table, §9 Open Question (c)).
pub fn normalize_repo_relevant(
    entity: Entity,
    action: &str,
    properties: &HashMap<String, serde_json::Value>,
) -> WorkItem {
    if matches!(action, "deleted" | "transferred") {
        WorkItem::EntityReconcileDelete {
            project_id: entity.project_id,
            provider_id: entity.provider_id,
            entity_type: EntityType::Repository,
            entity_id: entity.id,
        }
    } else {
        WorkItem::EntityEvaluate {
            project_id: entity.project_id,
            provider_id: entity.provider_id,
            entity_type: EntityType::Repository,
            entity_id: entity.id,
            snapshot: properties_snapshot(properties),
        }
    }
}

/// `repo-other`, any action -> evaluate (§4.5 table).
pub fn normalize_repo_other(
    entity: Entity,
    properties: &HashMap<String, serde_json::Value>,
) -> WorkItem {
    WorkItem::EntityEvaluate {
        project_id: entity.project_id,
        provider_id: entity.provider_id,
        entity_type: EntityType::Repository,
        entity_id: entity.id,
        snapshot: properties_snapshot(properties),
    }
}

/// Inputs describing a `package` `published` event, pre-extracted from the
/// GitHub payload by the caller.
pub struct PackageEventInput {
    pub artifact_name: String,
    pub artifact_type: String,
    pub version_id: String,
    /// The tag the registry push primarily identifies, e.g. `latest` or
    /// `sha256-<hex>` for a cosign signature attachment.
    pub primary_tag: String,
    /// The full tag set currently associated with this version.
    pub tags: Vec<String>,
    pub sha: String,
    pub created_at: Timestamp,
}

/// `package` `published` (§4.5): upsert artifact + version (tag-conflict
/// resolved by the store), or, for a cosign signature tag, look up the
/// already-stored version by its reconstructed digest.
pub async fn normalize_package(
    tx: &mut dyn EntityStoreTransaction,
    repository: &Entity,
    input: PackageEventInput,
) -> Result<WorkItem, NormalizerError> {
    let artifact: Artifact = tx
        .upsert_artifact(repository.id, input.artifact_name, input.artifact_type)
        .await?;

    let version: ArtifactVersion = if is_signature_tag(&input.primary_tag) {
        let target_sha = crate::entity::cosign_tag_to_sha(&input.primary_tag)
            .unwrap_or_else(|| input.sha.clone());
        tx.find_artifact_version_by_sha(artifact.id, &target_sha)
            .await?
            .ok_or(NormalizerError::ArtifactNotFound)?
    } else {
        tx.upsert_artifact_version(
            artifact.id,
            input.version_id,
            input.tags,
            input.sha,
            input.created_at,
        )
        .await?
    };

    Ok(WorkItem::EntityEvaluate {
        project_id: repository.project_id,
        provider_id: repository.provider_id,
        entity_type: EntityType::Artifact,
        entity_id: artifact.id,
        snapshot: serde_json::to_value(&version).unwrap_or(serde_json::Value::Null),
    })
}

/// `pull_request` `opened`/`reopened`/`synchronize` (§4.5): upsert PR row +
/// entity (idempotent across repeated `synchronize` deliveries, §8 property
/// 5), refresh properties, emit evaluate.
pub async fn normalize_pull_request_upsert(
    tx: &mut dyn EntityStoreTransaction,
    repository: &Entity,
    pr_number: u64,
    provider_id: ProviderId,
    refreshed_properties: HashMap<String, serde_json::Value>,
) -> Result<WorkItem, NormalizerError> {
    let entity_id = match tx.get_pull_request(repository.id, pr_number).await? {
        Some(existing) => existing.entity_id,
        None => EntityId::new(),
    };

    let name = format!("{}#{}", repository.name, pr_number);
    let entity = tx
        .create_or_ensure_entity_by_id(
            entity_id,
            EntityType::PullRequest,
            name,
            repository.project_id,
            provider_id,
            Some(repository.id),
        )
        .await?;
    tx.upsert_pull_request(repository.id, pr_number, entity.id).await?;

    for (key, value) in &refreshed_properties {
        tx.upsert_property(entity.id, key.clone(), value.clone()).await?;
    }

    Ok(WorkItem::EntityEvaluate {
        project_id: entity.project_id,
        provider_id: entity.provider_id,
        entity_type: EntityType::PullRequest,
        entity_id: entity.id,
        snapshot: properties_snapshot(&refreshed_properties),
    })
}

/// `pull_request` `closed` (§4.5): delete PR row + entity. The caller
/// always reports `NOT_HANDLED` afterwards since a close never emits a
/// work item.
pub async fn normalize_pull_request_closed(
    tx: &mut dyn EntityStoreTransaction,
    repository: &Entity,
    pr_number: u64,
) -> Result<(), EntityStoreError> {
    tx.delete_pull_request(repository.id, pr_number).await
}

/// `installation` `deleted` (§4.5).
pub fn normalize_installation_deleted(installation_id: i64) -> WorkItem {
    WorkItem::InstallationLifecycle {
        class: ProviderClass::GhApp,
        payload: serde_json::json!({ "installation_id": installation_id }),
    }
}

/// `installation_repositories` `added`, one item per repo, gated on the
/// provider's auto-registration config (§4.5).
pub fn normalize_installation_repository_added(
    project_id: ProjectId,
    provider_id: ProviderId,
    owner: &str,
    repo: &str,
) -> WorkItem {
    WorkItem::EntityReconcileAdd {
        project_id,
        provider_id,
        entity_type: EntityType::Repository,
        attributes: serde_json::json!({ "name": repo, "owner": owner }),
    }
}

/// `installation_repositories` `removed`, one item per repo (§4.5).
pub fn normalize_installation_repository_removed(
    project_id: ProjectId,
    provider_id: ProviderId,
    entity_id: EntityId,
) -> WorkItem {
    WorkItem::EntityReconcileDelete {
        project_id,
        provider_id,
        entity_type: EntityType::Repository,
        entity_id,
    }
}

#[cfg(test)]
#[path = "normalizer_tests.rs"]
mod tests;
