//! # Identity types (spec §4.7 step 5, §4.8, §4.9)
//!
//! The resolved subject attached to request context by the token-validation
//! interceptor, the internal user row it maps to, and the trait seam over
//! the IdP external collaborator (§1) shared by the RPC surface and the
//! identity reconciler (C9).

use crate::{ProjectId, Timestamp, UserRowId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The authenticated caller, resolved from a bearer token by the
/// token-validation interceptor (§4.7 step 5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The IdP subject claim; the durable external identity.
    pub subject: String,
    /// The upstream (GitHub) numeric id claim, used to claim pending
    /// installations on first login (§4.8 `CreateUser`).
    pub gh_id: Option<i64>,
    pub preferred_username: Option<String>,
}

/// The internal user row created on self-enrollment (§4.8 `CreateUser`),
/// keyed on the IdP subject. Distinct from the GitHub-actor [`crate::User`]
/// recorded on webhook payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: UserRowId,
    pub subject: String,
    pub created_at: Timestamp,
}

impl UserRow {
    pub fn new(subject: String) -> Self {
        Self {
            id: UserRowId::new(),
            subject,
            created_at: Timestamp::now(),
        }
    }
}

/// An IdP account-lifecycle event surfaced to the identity reconciler (§4.9).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountLifecycleEvent {
    /// User-initiated `DELETE_ACCOUNT`.
    UserInitiatedDeletion { subject: String },
    /// Admin-initiated `USER` DELETE.
    AdminInitiatedDeletion { subject: String },
}

impl AccountLifecycleEvent {
    pub fn subject(&self) -> &str {
        match self {
            Self::UserInitiatedDeletion { subject } => subject,
            Self::AdminInitiatedDeletion { subject } => subject,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenValidationError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("token signature invalid or expired: {0}")]
    InvalidToken(String),

    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),
}

/// The external collaborator seam over the identity provider (§1: "the
/// identity provider (OIDC token parser, user directory)"). Production
/// implementations validate against JWKS via `jsonwebtoken`; tests supply
/// an in-memory double.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Parse and validate a bearer token, resolving it to an [`Identity`].
    async fn validate_token(&self, bearer_token: &str) -> Result<Identity, TokenValidationError>;

    /// List account-lifecycle events for the identity reconciler's poll
    /// window (§4.9). `since` bounds the query to events newer than the
    /// last successful poll.
    async fn list_account_events(
        &self,
        since: Timestamp,
    ) -> Result<Vec<AccountLifecycleEvent>, TokenValidationError>;

    /// Delete the IdP account entirely (§4.8 `DeleteUser` last step).
    async fn delete_account(&self, subject: &str) -> Result<(), TokenValidationError>;
}

/// The external collaborator seam over the authorization service (§1: "the
/// authorization service (relationship-tuple checker)").
#[async_trait]
pub trait AuthorizationClient: Send + Sync {
    async fn check(&self, subject: &str, role: Role, project_id: ProjectId) -> Result<bool, AuthorizationError>;

    async fn assign_role(&self, subject: &str, role: Role, project_id: ProjectId) -> Result<(), AuthorizationError>;

    /// Revokes every existing role the subject holds on the project before
    /// a new one is assigned (§4.8 `ResolveInvitation` "revoking any prior
    /// role for that user on that project").
    async fn revoke_all_roles(&self, subject: &str, project_id: ProjectId) -> Result<(), AuthorizationError>;

    /// Projects the subject currently holds any role on, in the order the
    /// authz store returns them (§4.8 `ListProjects`, §8 property 6).
    async fn projects_for_user(&self, subject: &str) -> Result<Vec<ProjectId>, AuthorizationError>;

    /// Every subject holding any role on `project_id`. Used by `DeleteUser`
    /// (§4.8) to determine whether a deleted user was the project's sole
    /// member before cascading the project's deletion into the data store.
    async fn subjects_for_project(&self, project_id: ProjectId) -> Result<Vec<String>, AuthorizationError>;

    async fn delete_user(&self, subject: &str) -> Result<(), AuthorizationError>;
}

/// Roles checked by the project-authorization interceptor (§4.7 step 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Viewer,
    Editor,
    Admin,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthorizationError {
    #[error("authorization store unavailable: {0}")]
    Unavailable(String),

    #[error("project not found in authorization store")]
    ProjectNotFound,
}

/// Reference in-memory [`AuthorizationClient`]; the real store is the
/// relationship-tuple service named as an external collaborator in spec §1.
/// Tracks, per project, the set of (subject, role) tuples currently
/// assigned, and the insertion order of distinct subjects so
/// [`AuthorizationClient::projects_for_user`] has a stable order to return
/// (§8 property 6).
#[derive(Default)]
pub struct InMemoryAuthorizationClient {
    roles: std::sync::Mutex<std::collections::HashMap<(String, ProjectId), Role>>,
    project_order: std::sync::Mutex<Vec<ProjectId>>,
}

impl InMemoryAuthorizationClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn note_project(&self, project_id: ProjectId) {
        let mut order = self.project_order.lock().unwrap();
        if !order.contains(&project_id) {
            order.push(project_id);
        }
    }
}

#[async_trait]
impl AuthorizationClient for InMemoryAuthorizationClient {
    async fn check(&self, subject: &str, role: Role, project_id: ProjectId) -> Result<bool, AuthorizationError> {
        let roles = self.roles.lock().unwrap();
        Ok(roles
            .get(&(subject.to_string(), project_id))
            .is_some_and(|granted| *granted >= role))
    }

    async fn assign_role(&self, subject: &str, role: Role, project_id: ProjectId) -> Result<(), AuthorizationError> {
        self.note_project(project_id);
        self.roles
            .lock()
            .unwrap()
            .insert((subject.to_string(), project_id), role);
        Ok(())
    }

    async fn revoke_all_roles(&self, subject: &str, project_id: ProjectId) -> Result<(), AuthorizationError> {
        self.roles
            .lock()
            .unwrap()
            .remove(&(subject.to_string(), project_id));
        Ok(())
    }

    async fn projects_for_user(&self, subject: &str) -> Result<Vec<ProjectId>, AuthorizationError> {
        let roles = self.roles.lock().unwrap();
        let order = self.project_order.lock().unwrap();
        Ok(order
            .iter()
            .filter(|project_id| roles.contains_key(&(subject.to_string(), **project_id)))
            .copied()
            .collect())
    }

    async fn subjects_for_project(&self, project_id: ProjectId) -> Result<Vec<String>, AuthorizationError> {
        Ok(self
            .roles
            .lock()
            .unwrap()
            .keys()
            .filter(|(_, pid)| *pid == project_id)
            .map(|(subject, _)| subject.clone())
            .collect())
    }

    async fn delete_user(&self, subject: &str) -> Result<(), AuthorizationError> {
        self.roles.lock().unwrap().retain(|(s, _), _| s != subject);
        Ok(())
    }
}

/// Reference in-memory [`IdentityProvider`]; the real provider is the OIDC
/// issuer named as an external collaborator in spec §1. Tokens are opaque
/// keys into a pre-registered identity map rather than signed JWTs — the
/// production adapter that validates against a real issuer's JWKS lives
/// outside this crate's scope, same as the relational store behind
/// [`crate::entity_store::EntityStore`].
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    identities: std::sync::Mutex<std::collections::HashMap<String, Identity>>,
    deleted: std::sync::Mutex<std::collections::HashSet<String>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a bearer token that resolves to `identity` on
    /// [`IdentityProvider::validate_token`].
    pub fn register(&self, bearer_token: impl Into<String>, identity: Identity) {
        self.identities.lock().unwrap().insert(bearer_token.into(), identity);
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn validate_token(&self, bearer_token: &str) -> Result<Identity, TokenValidationError> {
        self.identities
            .lock()
            .unwrap()
            .get(bearer_token)
            .cloned()
            .ok_or_else(|| TokenValidationError::InvalidToken("unknown bearer token".to_string()))
    }

    async fn list_account_events(
        &self,
        _since: Timestamp,
    ) -> Result<Vec<AccountLifecycleEvent>, TokenValidationError> {
        // The reference adapter has no admin event log to poll; a real IdP
        // integration (e.g. an Auth0/Keycloak admin events API) backs this
        // for the identity reconciler (C9).
        Ok(Vec::new())
    }

    async fn delete_account(&self, subject: &str) -> Result<(), TokenValidationError> {
        self.deleted.lock().unwrap().insert(subject.to_string());
        self.identities.lock().unwrap().retain(|_, v| v.subject != subject);
        Ok(())
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
