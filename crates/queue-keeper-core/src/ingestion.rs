//! # Webhook ingestion pipeline (spec §2, §4.1-§4.6)
//!
//! Composes signature validation (C1), payload classification (C2),
//! repository resolution (C3), entity store transactions (C4), event
//! normalization (C5), and work-item publication (C6) into the single path
//! a webhook delivery travels from HTTP request to bus message. Everything
//! here is pure orchestration; each step's actual logic lives in its own
//! module and is unit tested there.

use crate::classifier::{classify_event, EventFamily};
use crate::entity::Entity;
use crate::entity_store::{EntityStore, EntityStoreError};
use crate::normalizer::{
    normalize_installation_deleted, normalize_installation_repository_added,
    normalize_installation_repository_removed, normalize_package, normalize_pull_request_closed,
    normalize_pull_request_upsert, normalize_repo_other, normalize_repo_relevant,
    NormalizerError, PackageEventInput,
};
use crate::queue_integration::{QueueDeliveryError, WorkItemPublisher};
use crate::resolver::{FeatureFlagClient, PropertyRefresher, RepositoryResolver, ResolverError};
use crate::{EntityType, Timestamp};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

/// Enforced before any HMAC work so an oversized body can never drive CPU
/// spend proportional to its size (§4.1 "body size capped at 2 MiB").
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("BAD_SIGNATURE")]
    BadSignature,
    #[error("BODY_TOO_LARGE")]
    BodyTooLarge,
}

fn hmac_sha256_matches(key: &[u8], body: &[u8], expected: &[u8]) -> bool {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(key) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(expected).is_ok()
}

fn hmac_sha1_matches(key: &[u8], body: &[u8], expected: &[u8]) -> bool {
    let Ok(mut mac) = Hmac::<Sha1>::new_from_slice(key) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(expected).is_ok()
}

/// Verifies a raw webhook body against the active secret and, on mismatch,
/// each previous secret in turn, so a secret rotation has a grace window
/// during which deliveries signed with either value validate (§4.1, §8
/// property 1). `X-Hub-Signature-256` is preferred; `X-Hub-Signature`
/// (SHA-1) is only consulted when the provider never sent a SHA-256 header.
///
/// `secrets` must be non-empty and ordered current-secret-first; callers
/// build it from the provider's active secret plus its configured
/// previous-secret list.
pub fn verify_signature(
    body: &[u8],
    signature_256: Option<&str>,
    signature_1: Option<&str>,
    secrets: &[String],
) -> Result<(), SignatureError> {
    if body.len() > MAX_BODY_BYTES {
        return Err(SignatureError::BodyTooLarge);
    }

    if let Some(sig) = signature_256 {
        let digest = sig.strip_prefix("sha256=").unwrap_or(sig);
        let expected = hex::decode(digest).map_err(|_| SignatureError::BadSignature)?;
        return if secrets
            .iter()
            .any(|s| hmac_sha256_matches(s.as_bytes(), body, &expected))
        {
            Ok(())
        } else {
            Err(SignatureError::BadSignature)
        };
    }

    if let Some(sig) = signature_1 {
        let digest = sig.strip_prefix("sha1=").unwrap_or(sig);
        let expected = hex::decode(digest).map_err(|_| SignatureError::BadSignature)?;
        return if secrets
            .iter()
            .any(|s| hmac_sha1_matches(s.as_bytes(), body, &expected))
        {
            Ok(())
        } else {
            Err(SignatureError::BadSignature)
        };
    }

    Err(SignatureError::BadSignature)
}

/// Errors that abort ingestion outright (never a benign 200 per §7).
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("publish failed: {0}")]
    Publish(#[from] QueueDeliveryError),

    #[error("store error: {0}")]
    Store(#[from] EntityStoreError),
}

/// Outcome of one ingested delivery. `accepted = false` covers every benign
/// §7 case (`REPO_NOT_FOUND`, `REPO_IS_PRIVATE`, `NOT_HANDLED`,
/// `ARTIFACT_NOT_FOUND`, `ping`, an event the classifier ignores) — all of
/// which report HTTP 200 so GitHub never retries them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionReport {
    pub accepted: bool,
    pub reason: Option<&'static str>,
    pub published: usize,
}

impl IngestionReport {
    fn benign(reason: &'static str) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
            published: 0,
        }
    }

    fn published(count: usize) -> Self {
        Self {
            accepted: true,
            reason: None,
            published: count,
        }
    }
}

/// The collaborators one ingestion call needs, borrowed for the duration of
/// a single request.
pub struct IngestionContext<'a> {
    pub store: &'a dyn EntityStore,
    pub features: &'a dyn FeatureFlagClient,
    pub refresher: &'a dyn PropertyRefresher,
    pub publisher: WorkItemPublisher<'a>,
}

fn top_level_hook_id(payload: &serde_json::Value) -> Option<i64> {
    payload.get("hook_id").and_then(|v| v.as_i64())
}

fn repository_upstream_fields(
    payload: &serde_json::Value,
) -> Result<(serde_json::Value, bool), IngestionError> {
    let repository = payload
        .get("repository")
        .ok_or_else(|| IngestionError::MalformedPayload("missing repository".to_string()))?;
    let upstream_id = repository
        .get("id")
        .cloned()
        .ok_or_else(|| IngestionError::MalformedPayload("missing repository.id".to_string()))?;
    let private = repository
        .get("private")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    Ok((upstream_id, private))
}

async fn publish_one(
    ctx: &IngestionContext<'_>,
    item: &crate::WorkItem,
    delivery_id: &str,
    provider_source: &str,
    event_type: &str,
) -> Result<IngestionReport, IngestionError> {
    ctx.publisher
        .publish(item, delivery_id, provider_source, event_type)
        .await?;
    Ok(IngestionReport::published(1))
}

fn resolver_outcome(err: ResolverError) -> Result<IngestionReport, IngestionError> {
    match err {
        ResolverError::RepoNotFound => Ok(IngestionReport::benign("REPO_NOT_FOUND")),
        ResolverError::RepoIsPrivate => Ok(IngestionReport::benign("REPO_IS_PRIVATE")),
        ResolverError::NotHandled => Ok(IngestionReport::benign("NOT_HANDLED")),
        ResolverError::RefreshFailed(message) => Err(IngestionError::MalformedPayload(message)),
        ResolverError::Store(e) => Err(IngestionError::Store(e)),
    }
}

fn normalizer_outcome(err: NormalizerError) -> Result<IngestionReport, IngestionError> {
    match err {
        NormalizerError::ArtifactNotFound => Ok(IngestionReport::benign("ARTIFACT_NOT_FOUND")),
        NormalizerError::NotHandled => Ok(IngestionReport::benign("NOT_HANDLED")),
        NormalizerError::Parse(message) => Err(IngestionError::MalformedPayload(message)),
        NormalizerError::Resolver(e) => resolver_outcome(e),
        NormalizerError::Store(e) => Err(IngestionError::Store(e)),
    }
}

/// Parses the GitHub `package` `published` payload shape into the
/// normalizer's provider-agnostic input, including the container-registry
/// fields cosign signature attachments need (§4.5 "container signature
/// tag").
fn parse_package_event(payload: &serde_json::Value) -> Result<PackageEventInput, IngestionError> {
    let missing = |field: &str| IngestionError::MalformedPayload(format!("missing {field}"));

    let package = payload.get("package").ok_or_else(|| missing("package"))?;
    let artifact_name = package
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| missing("package.name"))?
        .to_string();
    let artifact_type = package
        .get("package_type")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();

    let version = package
        .get("package_version")
        .ok_or_else(|| missing("package.package_version"))?;
    let version_id = version
        .get("id")
        .map(|v| v.to_string())
        .ok_or_else(|| missing("package.package_version.id"))?;

    let tag_node = version.get("container_metadata").and_then(|m| m.get("tag"));
    let primary_tag = tag_node
        .and_then(|t| t.get("name"))
        .and_then(|v| v.as_str())
        .or_else(|| version.get("version").and_then(|v| v.as_str()))
        .unwrap_or("latest")
        .to_string();
    let sha = tag_node
        .and_then(|t| t.get("digest"))
        .and_then(|v| v.as_str())
        .or_else(|| version.get("name").and_then(|v| v.as_str()))
        .ok_or_else(|| missing("package.package_version.container_metadata.tag.digest"))?
        .to_string();
    let tags = version
        .get("container_metadata")
        .and_then(|m| m.get("tag"))
        .and_then(|t| t.get("tags"))
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_else(|| vec![primary_tag.clone()]);

    Ok(PackageEventInput {
        artifact_name,
        artifact_type,
        version_id,
        primary_tag,
        tags,
        sha,
        created_at: Timestamp::now(),
    })
}

fn pull_request_number(payload: &serde_json::Value) -> Result<u64, IngestionError> {
    payload
        .get("pull_request")
        .and_then(|pr| pr.get("number"))
        .and_then(|v| v.as_u64())
        .ok_or_else(|| IngestionError::MalformedPayload("missing pull_request.number".to_string()))
}

async fn resolve_repository(
    ctx: &IngestionContext<'_>,
    payload: &serde_json::Value,
    for_delete: bool,
) -> Result<Result<(Entity, std::collections::HashMap<String, serde_json::Value>), IngestionReport>, IngestionError>
{
    let (upstream_id, private) = repository_upstream_fields(payload)?;
    let hook_id = top_level_hook_id(payload);
    let resolver = RepositoryResolver::new(ctx.store, ctx.features);
    let result = if for_delete {
        resolver
            .resolve_for_delete(&upstream_id, private, hook_id, ctx.refresher)
            .await
    } else {
        resolver
            .resolve(&upstream_id, private, hook_id, ctx.refresher)
            .await
    };
    match result {
        Ok(resolution) => Ok(Ok((resolution.entity, resolution.properties))),
        Err(e) => {
            let report = resolver_outcome(e)?;
            Ok(Err(report))
        }
    }
}

/// Runs one webhook delivery through C2 through C6. The caller is
/// responsible for C1 (`verify_signature`) before invoking this, since the
/// raw body is consumed there and this function only ever sees the parsed
/// JSON payload.
pub async fn ingest(
    ctx: &IngestionContext<'_>,
    delivery_id: &str,
    provider_source: &str,
    event_type: &str,
    payload: &serde_json::Value,
) -> Result<IngestionReport, IngestionError> {
    let action = payload.get("action").and_then(|v| v.as_str());
    let family = classify_event(event_type, action);

    match family {
        EventFamily::Ping => Ok(IngestionReport::benign("ping")),
        EventFamily::Ignored => Ok(IngestionReport::benign("ignored")),

        EventFamily::RepoRelevant => {
            let is_delete = matches!(action, Some("deleted") | Some("transferred"));
            let (entity, properties) = match resolve_repository(ctx, payload, is_delete).await? {
                Ok(pair) => pair,
                Err(report) => return Ok(report),
            };
            let item = normalize_repo_relevant(entity, action.unwrap_or(""), &properties);
            publish_one(ctx, &item, delivery_id, provider_source, event_type).await
        }

        EventFamily::RepoOther => {
            let (entity, properties) = match resolve_repository(ctx, payload, false).await? {
                Ok(pair) => pair,
                Err(report) => return Ok(report),
            };
            let item = normalize_repo_other(entity, &properties);
            publish_one(ctx, &item, delivery_id, provider_source, event_type).await
        }

        EventFamily::Package => {
            let (repository, _properties) = match resolve_repository(ctx, payload, false).await? {
                Ok(pair) => pair,
                Err(report) => return Ok(report),
            };
            let input = parse_package_event(payload)?;
            let mut tx = ctx.store.begin().await?;
            let item = match normalize_package(tx.as_mut(), &repository, input).await {
                Ok(item) => item,
                Err(e) => return normalizer_outcome(e),
            };
            tx.commit().await?;
            publish_one(ctx, &item, delivery_id, provider_source, event_type).await
        }

        EventFamily::PullRequest => {
            let pr_number = pull_request_number(payload)?;
            match action {
                Some("opened") | Some("reopened") | Some("synchronize") => {
                    let (repository, _) = match resolve_repository(ctx, payload, false).await? {
                        Ok(pair) => pair,
                        Err(report) => return Ok(report),
                    };
                    let pr_name = format!("{}#{}", repository.name, pr_number);
                    let transient = Entity::new(
                        EntityType::PullRequest,
                        pr_name,
                        repository.project_id,
                        repository.provider_id,
                        Some(repository.id),
                    );
                    let refreshed = ctx
                        .refresher
                        .refresh(&transient)
                        .await
                        .map_err(|e| match e {
                            ResolverError::RefreshFailed(m) => IngestionError::MalformedPayload(m),
                            other => IngestionError::MalformedPayload(other.to_string()),
                        })?;
                    let mut tx = ctx.store.begin().await?;
                    let item = match normalize_pull_request_upsert(
                        tx.as_mut(),
                        &repository,
                        pr_number,
                        repository.provider_id,
                        refreshed,
                    )
                    .await
                    {
                        Ok(item) => item,
                        Err(e) => return normalizer_outcome(e),
                    };
                    tx.commit().await?;
                    publish_one(ctx, &item, delivery_id, provider_source, event_type).await
                }
                Some("closed") => {
                    let (repository, _) = match resolve_repository(ctx, payload, true).await? {
                        Ok(pair) => pair,
                        Err(report) => return Ok(report),
                    };
                    let mut tx = ctx.store.begin().await?;
                    normalize_pull_request_closed(tx.as_mut(), &repository, pr_number).await?;
                    tx.commit().await?;
                    Ok(IngestionReport::benign("NOT_HANDLED"))
                }
                _ => Ok(IngestionReport::benign("NOT_HANDLED")),
            }
        }

        EventFamily::Installation => {
            let installation_id = payload
                .get("installation")
                .and_then(|i| i.get("id"))
                .and_then(|v| v.as_i64())
                .ok_or_else(|| {
                    IngestionError::MalformedPayload("missing installation.id".to_string())
                })?;
            if action == Some("deleted") {
                ctx.store.delete_installation(installation_id).await?;
                let item = normalize_installation_deleted(installation_id);
                publish_one(ctx, &item, delivery_id, provider_source, event_type).await
            } else {
                Ok(IngestionReport::benign("NOT_HANDLED"))
            }
        }

        EventFamily::InstallationRepositories => {
            let installation_id = payload
                .get("installation")
                .and_then(|i| i.get("id"))
                .and_then(|v| v.as_i64())
                .ok_or_else(|| {
                    IngestionError::MalformedPayload("missing installation.id".to_string())
                })?;
            let installation = ctx.store.get_installation(installation_id).await?;
            let (project_id, provider_id) = match installation
                .and_then(|i| i.project_id.zip(i.provider_id))
            {
                Some(pair) => pair,
                None => return Ok(IngestionReport::benign("NOT_HANDLED")),
            };

            let (field, added) = match action {
                Some("added") => ("repositories_added", true),
                Some("removed") => ("repositories_removed", false),
                _ => return Ok(IngestionReport::benign("NOT_HANDLED")),
            };

            // §4.5: repos are only auto-registered if the claimed provider's
            // config opts the repository entity type in. Removal always
            // reconciles, independent of auto-registration.
            if added {
                let provider = ctx.store.get_provider(provider_id).await?;
                let auto_registers = provider
                    .map(|p| p.auto_registers(EntityType::Repository))
                    .unwrap_or(false);
                if !auto_registers {
                    return Ok(IngestionReport::benign("NOT_HANDLED"));
                }
            }

            let repos = payload
                .get(field)
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            if repos.is_empty() {
                return Ok(IngestionReport::benign("NOT_HANDLED"));
            }

            let mut published = 0usize;
            for repo in &repos {
                let item = if added {
                    let name = repo.get("name").and_then(|v| v.as_str()).unwrap_or("");
                    let full_name = repo
                        .get("full_name")
                        .and_then(|v| v.as_str())
                        .unwrap_or(name);
                    let owner = full_name.split('/').next().unwrap_or("");
                    normalize_installation_repository_added(project_id, provider_id, owner, name)
                } else {
                    let upstream_id = repo.get("id").cloned().unwrap_or(serde_json::Value::Null);
                    let entity = ctx
                        .store
                        .find_entity_by_upstream_id(EntityType::Repository, &upstream_id)
                        .await?;
                    let Some(entity) = entity else {
                        continue;
                    };
                    normalize_installation_repository_removed(project_id, provider_id, entity.id)
                };
                ctx.publisher
                    .publish(&item, delivery_id, provider_source, event_type)
                    .await?;
                published += 1;
            }
            if published == 0 {
                Ok(IngestionReport::benign("NOT_HANDLED"))
            } else {
                Ok(IngestionReport::published(published))
            }
        }
    }
}

#[cfg(test)]
#[path = "ingestion_tests.rs"]
mod tests;
