//! # Invitation store (spec §3 "Invitation", §4.8 `ResolveInvitation`)
//!
//! A single-use, TTL-bound row correlating an invite code to a project,
//! role, and sponsor. Kept as its own small store rather than folded into
//! [`crate::entity_store::EntityStore`] because an invitation is not an
//! [`crate::entity::Entity`] — it has no provider, no property bag, and is
//! deleted outright on resolution rather than soft-expired.

use crate::entity::Invitation;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum InvitationStoreError {
    #[error("invitation not found or already used")]
    NotFound,

    #[error("store error: {0}")]
    Internal(String),
}

#[async_trait]
pub trait InvitationStore: Send + Sync {
    async fn create(&self, invitation: Invitation) -> Result<Invitation, InvitationStoreError>;

    async fn get_by_code(&self, code: &str) -> Result<Invitation, InvitationStoreError>;

    /// Deletes the invitation row. Single-use: called on every resolution
    /// outcome (accept or decline), never just on accept (§3 "Single-use:
    /// deleted on resolution").
    async fn delete(&self, code: &str) -> Result<(), InvitationStoreError>;
}

/// Reference in-memory adapter; the real store is the relational database
/// named as an external collaborator in spec §1.
#[derive(Default)]
pub struct InMemoryInvitationStore {
    rows: std::sync::Mutex<Vec<Invitation>>,
}

impl InMemoryInvitationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvitationStore for InMemoryInvitationStore {
    async fn create(&self, invitation: Invitation) -> Result<Invitation, InvitationStoreError> {
        let mut rows = self.rows.lock().unwrap();
        rows.push(invitation.clone());
        Ok(invitation)
    }

    async fn get_by_code(&self, code: &str) -> Result<Invitation, InvitationStoreError> {
        let rows = self.rows.lock().unwrap();
        rows.iter()
            .find(|i| i.code == code)
            .cloned()
            .ok_or(InvitationStoreError::NotFound)
    }

    async fn delete(&self, code: &str) -> Result<(), InvitationStoreError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|i| i.code != code);
        if rows.len() == before {
            return Err(InvitationStoreError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "invitation_store_tests.rs"]
mod tests;
