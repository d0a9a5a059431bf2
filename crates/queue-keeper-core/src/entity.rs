//! # Data model (spec §3)
//!
//! The Project/Provider/Entity/Property/Installation/Artifact/Invitation/
//! Session-state rows that the entity store (§4.4) persists. Every type here
//! is a plain record; the polymorphism lives in the string-keyed property bag
//! on [`Entity`], not in a type hierarchy (§9 "Polymorphic entity type").

use crate::{EntityId, EntityType, ProjectId, ProviderId, Timestamp, UserRowId, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Project
// ============================================================================

/// Opaque JSON metadata carried on a [`Project`] row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub display_name: String,
    pub description: String,
}

/// A tenant root. May have a parent project (an organization root), making
/// the project graph a forest rather than a flat set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub parent_id: Option<ProjectId>,
    pub metadata: ProjectMetadata,
}

impl Project {
    pub fn new(parent_id: Option<ProjectId>, metadata: ProjectMetadata) -> Self {
        Self {
            id: ProjectId::new(),
            parent_id,
            metadata,
        }
    }
}

// ============================================================================
// Provider
// ============================================================================

/// The set of provider classes a Provider row may be bound to (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderClass {
    GhOauth,
    GhApp,
    DockerHub,
}

impl ProviderClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GhOauth => "gh-oauth",
            Self::GhApp => "gh-app",
            Self::DockerHub => "dockerhub",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "gh-oauth" => Ok(Self::GhOauth),
            "gh-app" => Ok(Self::GhApp),
            "dockerhub" => Ok(Self::DockerHub),
            other => Err(ValidationError::InvalidFormat {
                field: "class".to_string(),
                message: format!("unknown provider class '{other}'"),
            }),
        }
    }

    /// Whether this class is GitHub App based (installation-backed).
    pub fn is_app(&self) -> bool {
        matches!(self, Self::GhApp)
    }
}

/// Whether a provider has a sealed credential row attached yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialState {
    Unset,
    Set,
}

/// A named integration binding, scoped to a project (§3).
///
/// Credentials are never stored on this row; they live in a separate
/// sealed-blob row referenced by provider id (§3 Ownership).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub project_id: ProjectId,
    pub name: String,
    pub class: ProviderClass,
    pub implements: Vec<String>,
    pub version: u32,
    pub definition: serde_json::Value,
    pub credential_state: CredentialState,
}

impl Provider {
    pub fn new(
        project_id: ProjectId,
        name: String,
        class: ProviderClass,
        definition: serde_json::Value,
    ) -> Self {
        let implements = match class {
            ProviderClass::GhOauth | ProviderClass::GhApp => vec!["github".to_string()],
            ProviderClass::DockerHub => vec!["dockerhub".to_string()],
        };
        Self {
            id: ProviderId::new(),
            project_id,
            name,
            class,
            implements,
            version: 1,
            definition,
            credential_state: CredentialState::Unset,
        }
    }

    /// Auto-registration entity kinds declared on a `gh-app` provider's
    /// definition blob, e.g. `{"auto_registration": {"entities": {"repository": {"enabled": true}}}}`.
    pub fn auto_registers(&self, entity_type: EntityType) -> bool {
        self.definition
            .get("auto_registration")
            .and_then(|v| v.get("entities"))
            .and_then(|v| v.get(entity_type.as_str()))
            .and_then(|v| v.get("enabled"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

// ============================================================================
// Entity + Property
// ============================================================================

/// The universal upstream-object handle (§3).
///
/// Invariant: `name` is unique within `(project_id, entity_type)`; every
/// entity has exactly one owning project and provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub entity_type: EntityType,
    pub name: String,
    pub project_id: ProjectId,
    pub provider_id: ProviderId,
    pub originated_from: Option<EntityId>,
}

impl Entity {
    pub fn new(
        entity_type: EntityType,
        name: String,
        project_id: ProjectId,
        provider_id: ProviderId,
        originated_from: Option<EntityId>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            entity_type,
            name,
            project_id,
            provider_id,
            originated_from,
        }
    }
}

/// A single namespaced key/JSON-value attribute attached to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub value: serde_json::Value,
}

/// The well-known property key that must uniquely locate an entity within
/// its provider (§3 Property invariant).
pub const UPSTREAM_ID_KEY: &str = "upstream_id";

/// A string-keyed bag of JSON properties attached to one entity.
///
/// This is the mechanism by which the universal [`Entity`] row carries
/// type-specific attributes without a type hierarchy (§9).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyBag(HashMap<String, serde_json::Value>);

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.0.insert(key.into(), value);
    }

    pub fn upstream_id(&self) -> Option<&serde_json::Value> {
        self.get(UPSTREAM_ID_KEY)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Property> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        let mut map = HashMap::new();
        for prop in iter {
            map.insert(prop.key, prop.value);
        }
        Self(map)
    }
}

// ============================================================================
// Installation
// ============================================================================

/// An app-class provider's upstream deployment record (§3).
///
/// Created when the GitHub App is installed upstream, before any project
/// claims it; `provider_id`/`project_id` are populated on claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installation {
    pub installation_id: i64,
    pub app_id: i64,
    pub organization_id: i64,
    pub provider_id: Option<ProviderId>,
    pub project_id: Option<ProjectId>,
    pub enrolling_user_id: String,
}

impl Installation {
    pub fn is_claimed(&self) -> bool {
        self.provider_id.is_some() && self.project_id.is_some()
    }
}

// ============================================================================
// Pull request legacy row
// ============================================================================

/// Legacy per-PR lookup row, kept in lockstep with the unified [`Entity`]
/// row of type `pull-request` (§3, §9 Open Question (a)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestRow {
    pub repository_id: EntityId,
    pub pr_number: u64,
    pub entity_id: EntityId,
}

// ============================================================================
// Artifact + artifact version
// ============================================================================

/// Unique per `(repository_id, name, artifact_type)` (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: EntityId,
    pub repository_id: EntityId,
    pub name: String,
    pub artifact_type: String,
}

/// A versioned build of an [`Artifact`], carrying the tag set active at the
/// time of the last upsert (§3, §4.4 tag-conflict resolution).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactVersion {
    pub artifact_id: EntityId,
    pub version_id: String,
    pub tags: Vec<String>,
    pub sha: String,
    pub created_at: Timestamp,
}

impl ArtifactVersion {
    /// Canonical-sort the tag set (lexicographic ascending) so downstream
    /// consumers see a stable representation (§4.5).
    pub fn canonicalize_tags(mut tags: Vec<String>) -> Vec<String> {
        tags.sort();
        tags.dedup();
        tags
    }
}

/// Reverses the cosign signature-tag transform `sha256-<hex>` back to the
/// digest form `sha256:<hex>` used to look up the signed version (§4.5).
pub fn cosign_tag_to_sha(tag: &str) -> Option<String> {
    tag.strip_prefix("sha256-")
        .map(|hex| format!("sha256:{hex}"))
}

/// Whether a container registry tag identifies a cosign signature rather
/// than a real image version (§4.5).
pub fn is_signature_tag(tag: &str) -> bool {
    tag.starts_with("sha256-") || tag.ends_with(".sig")
}

// ============================================================================
// Remediation / alert URL construction (§8 testable properties 7-8)
// ============================================================================

/// A malformed `owner/repo` slug passed to [`remediation_url`] or
/// [`alert_url`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugError {
    #[error("repository slug '{0}' is not in 'owner/repo' form")]
    InvalidSlug(String),
}

fn validate_slug(slug: &str) -> Result<(), SlugError> {
    match slug.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok(())
        }
        _ => Err(SlugError::InvalidSlug(slug.to_string())),
    }
}

/// Builds the GitHub pull-request URL a rule-evaluation result points a
/// remediation action at, from the repository slug and the work item's
/// `pr_number` metadata field. Empty metadata (no `pr_number`) yields an
/// empty string rather than an error; only a present `pr_number` paired
/// with a malformed slug is an error.
pub fn remediation_url(slug: &str, metadata: &serde_json::Value) -> Result<String, SlugError> {
    let Some(pr_number) = metadata.get("pr_number") else {
        return Ok(String::new());
    };
    validate_slug(slug)?;
    Ok(format!("https://github.com/{slug}/pull/{pr_number}"))
}

/// Builds the GitHub security-advisory URL for an alert-carrying work item,
/// from the repository slug and the `ghsa_id` metadata field. A missing
/// `ghsa_id` yields an empty string rather than an error.
pub fn alert_url(slug: &str, metadata: &serde_json::Value) -> Result<String, SlugError> {
    let Some(ghsa_id) = metadata.get("ghsa_id").and_then(|v| v.as_str()) else {
        return Ok(String::new());
    };
    validate_slug(slug)?;
    Ok(format!(
        "https://github.com/{slug}/security/advisories/{ghsa_id}"
    ))
}

// ============================================================================
// Invitation
// ============================================================================

/// A single-use project role invitation, expiring seven days after its last
/// update (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub code: String,
    pub project_id: ProjectId,
    pub role: String,
    pub email: String,
    pub sponsor: UserRowId,
    pub updated_at: Timestamp,
}

impl Invitation {
    pub const TTL_DAYS: i64 = 7;

    pub fn is_expired(&self, now: Timestamp) -> bool {
        let expires_at = self.updated_at.add_seconds((Self::TTL_DAYS * 24 * 3600) as u64);
        now.duration_since(expires_at) > std::time::Duration::ZERO
    }
}

// ============================================================================
// Session state (OAuth correlation)
// ============================================================================

/// Short-lived OAuth flow correlation state (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub state: String,
    pub project_id: Option<ProjectId>,
    pub return_port: Option<u16>,
    pub redirect_url: Option<String>,
    pub created_at: Timestamp,
}

impl SessionState {
    pub const TTL_SECONDS: u64 = 600;

    pub fn new(
        project_id: Option<ProjectId>,
        return_port: Option<u16>,
        redirect_url: Option<String>,
    ) -> Self {
        Self {
            state: uuid::Uuid::new_v4().to_string(),
            project_id,
            return_port,
            redirect_url,
            created_at: Timestamp::now(),
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now.duration_since(self.created_at.add_seconds(Self::TTL_SECONDS))
            > std::time::Duration::ZERO
    }
}

// ============================================================================
// EntityContext (C7 interceptor chain §4.7 step 6)
// ============================================================================

/// Resolved request context attached by the entity-context interceptor
/// (§4.7 step 6): the project the request is scoped to, plus an optional
/// provider name narrowing it further.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityContext {
    pub project_id: ProjectId,
    pub provider_name: Option<String>,
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
