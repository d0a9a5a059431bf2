//! # Rule-type lifecycle management (C8, spec §4.8 `CreateRuleType`/`UpdateRuleType`)
//!
//! Rule-type *schema design* is an explicit Non-goal (§1); what remains in
//! scope is the lifecycle row the RPC surface persists — name, project, and
//! the free-text `guidance` field — validated by [`crate::rpc::validate_guidance`]
//! before it ever reaches a transaction.

use crate::{ProjectId, Timestamp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTypeId(uuid::Uuid);

impl RuleTypeId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RuleTypeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RuleTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A project-scoped rule type row (§4.8). The evaluation semantics the
/// name/guidance describe are out of scope (§1 Non-goals); only the record
/// and its `guidance` validation are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleType {
    pub id: RuleTypeId,
    pub project_id: ProjectId,
    pub name: String,
    pub guidance: String,
    pub definition: serde_json::Value,
    pub created_at: Timestamp,
}

#[derive(Debug, thiserror::Error)]
pub enum RuleTypeStoreError {
    #[error("rule type '{name}' already exists in this project")]
    AlreadyExists { name: String },

    #[error("rule type not found")]
    NotFound,

    #[error("store error: {0}")]
    Internal(String),
}

/// The transactional home for rule-type rows, mirroring [`crate::entity_store::EntityStore`]'s
/// shape for a single-table concern that doesn't need the full entity model.
#[async_trait]
pub trait RuleTypeStore: Send + Sync {
    async fn create(&self, rule_type: RuleType) -> Result<RuleType, RuleTypeStoreError>;

    async fn update(
        &self,
        project_id: ProjectId,
        name: &str,
        guidance: String,
        definition: serde_json::Value,
    ) -> Result<RuleType, RuleTypeStoreError>;

    async fn get_by_name(
        &self,
        project_id: ProjectId,
        name: &str,
    ) -> Result<Option<RuleType>, RuleTypeStoreError>;
}

/// Reference in-memory adapter; the real store is the relational database
/// named as an external collaborator in spec §1.
#[derive(Default)]
pub struct InMemoryRuleTypeStore {
    rows: std::sync::Mutex<Vec<RuleType>>,
}

impl InMemoryRuleTypeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RuleTypeStore for InMemoryRuleTypeStore {
    async fn create(&self, rule_type: RuleType) -> Result<RuleType, RuleTypeStoreError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|r| r.project_id == rule_type.project_id && r.name == rule_type.name)
        {
            return Err(RuleTypeStoreError::AlreadyExists {
                name: rule_type.name,
            });
        }
        rows.push(rule_type.clone());
        Ok(rule_type)
    }

    async fn update(
        &self,
        project_id: ProjectId,
        name: &str,
        guidance: String,
        definition: serde_json::Value,
    ) -> Result<RuleType, RuleTypeStoreError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.project_id == project_id && r.name == name)
            .ok_or(RuleTypeStoreError::NotFound)?;
        row.guidance = guidance;
        row.definition = definition;
        Ok(row.clone())
    }

    async fn get_by_name(
        &self,
        project_id: ProjectId,
        name: &str,
    ) -> Result<Option<RuleType>, RuleTypeStoreError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|r| r.project_id == project_id && r.name == name)
            .cloned())
    }
}

/// `CreateRuleType` (§4.8): validates `guidance`, then persists.
pub async fn create_rule_type(
    store: &dyn RuleTypeStore,
    project_id: ProjectId,
    name: String,
    guidance: String,
    definition: serde_json::Value,
) -> Result<RuleType, crate::rpc::RpcError> {
    crate::rpc::validate_guidance(&guidance)?;
    let rule_type = RuleType {
        id: RuleTypeId::new(),
        project_id,
        name,
        guidance,
        definition,
        created_at: Timestamp::now(),
    };
    store.create(rule_type).await.map_err(|e| match e {
        RuleTypeStoreError::AlreadyExists { name } => crate::rpc::RpcError::AlreadyExists(name),
        RuleTypeStoreError::NotFound => crate::rpc::RpcError::NotFound("rule type".into()),
        RuleTypeStoreError::Internal(msg) => crate::rpc::RpcError::Internal(msg),
    })
}

/// `UpdateRuleType` (§4.8): validates `guidance`, then persists.
pub async fn update_rule_type(
    store: &dyn RuleTypeStore,
    project_id: ProjectId,
    name: &str,
    guidance: String,
    definition: serde_json::Value,
) -> Result<RuleType, crate::rpc::RpcError> {
    crate::rpc::validate_guidance(&guidance)?;
    store
        .update(project_id, name, guidance, definition)
        .await
        .map_err(|e| match e {
            RuleTypeStoreError::AlreadyExists { name } => crate::rpc::RpcError::AlreadyExists(name),
            RuleTypeStoreError::NotFound => crate::rpc::RpcError::NotFound("rule type".into()),
            RuleTypeStoreError::Internal(msg) => crate::rpc::RpcError::Internal(msg),
        })
}

#[cfg(test)]
#[path = "rule_type_tests.rs"]
mod tests;
