//! # RPC surface (C8, spec §4.8)
//!
//! Thin HTTP/JSON handlers over the transport-neutral operations in
//! `queue_keeper_core::rpc`/`rule_type`. Each handler follows the §4.8
//! shape: read [`EntityContext`] from request extensions (populated by the
//! C7 entity-context interceptor), resolve whatever the operation needs,
//! run it, and return a typed JSON response. Steps 1 (read context) and 7
//! (authorization) already happened in the interceptor chain by the time a
//! handler body runs; what's left here is steps 2-6 of §4.8.

use crate::middleware::rpc_error_response;
use crate::rpc_state::RpcState;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Response},
    Extension,
};
use queue_keeper_core::{
    create_entity, create_entity_reconciliation_task, create_provider, create_rule_type,
    create_user, delete_provider, delete_user, get_entity_by_id, get_entity_by_name, list_entities,
    list_projects, resolve_invitation, update_rule_type, CreateProviderRequest, Entity,
    EntityContext, EntityId, EntityIdentity, EntityType, Identity, Project, ProviderId, UserRowId,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

fn bad_request(message: impl Into<String>) -> Response {
    rpc_error_response(queue_keeper_core::RpcError::InvalidArgument(message.into()))
}

// ============================================================================
// CreateProvider / DeleteProvider
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateProviderBody {
    pub name: String,
    pub class: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

pub async fn create_provider_handler(
    State(state): State<RpcState>,
    Extension(context): Extension<EntityContext>,
    Json(body): Json<CreateProviderBody>,
) -> Response {
    let request = CreateProviderRequest {
        name: body.name,
        class: body.class,
        config: body.config,
    };
    match create_provider(state.entity_store.as_ref(), &context, request).await {
        Ok(provider) => Json(provider).into_response(),
        Err(err) => rpc_error_response(err),
    }
}

pub async fn delete_provider_handler(
    State(state): State<RpcState>,
    Path(provider_id): Path<String>,
) -> Response {
    let provider_id = match ProviderId::from_str(&provider_id) {
        Ok(id) => id,
        Err(_) => return bad_request("invalid provider id"),
    };
    match delete_provider(
        state.entity_store.as_ref(),
        state.deregistrar.as_ref(),
        provider_id,
    )
    .await
    {
        Ok(provider) => Json(provider).into_response(),
        Err(err) => rpc_error_response(err),
    }
}

// ============================================================================
// ListEntities / GetEntityById / GetEntityByName
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListEntitiesQuery {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub cursor: Option<String>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct EntityPageResponse {
    pub entities: Vec<Entity>,
    pub next: Option<String>,
}

pub async fn list_entities_handler(
    State(state): State<RpcState>,
    Extension(context): Extension<EntityContext>,
    Query(query): Query<ListEntitiesQuery>,
) -> Response {
    let entity_type = EntityType::from_str(&query.entity_type).unwrap_or(EntityType::Unspecified);
    let cursor = query
        .cursor
        .as_deref()
        .and_then(|c| EntityId::from_str(c).ok());
    match list_entities(
        state.entity_store.as_ref(),
        &context,
        entity_type,
        cursor,
        query.page_size,
    )
    .await
    {
        Ok(page) => Json(EntityPageResponse {
            entities: page.entities,
            next: page.next.map(|id| id.to_string()),
        })
        .into_response(),
        Err(err) => rpc_error_response(err),
    }
}

pub async fn get_entity_by_id_handler(
    State(state): State<RpcState>,
    Extension(context): Extension<EntityContext>,
    Path(entity_id): Path<String>,
) -> Response {
    let entity_id = match EntityId::from_str(&entity_id) {
        Ok(id) => id,
        Err(_) => return bad_request("invalid entity id"),
    };
    match get_entity_by_id(state.entity_store.as_ref(), &context, entity_id).await {
        Ok(entity) => Json(entity).into_response(),
        Err(err) => rpc_error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub struct GetByNameQuery {
    #[serde(rename = "type")]
    pub entity_type: String,
}

pub async fn get_entity_by_name_handler(
    State(state): State<RpcState>,
    Extension(context): Extension<EntityContext>,
    Path(name): Path<String>,
    Query(query): Query<GetByNameQuery>,
) -> Response {
    let entity_type = EntityType::from_str(&query.entity_type).unwrap_or(EntityType::Unspecified);
    match get_entity_by_name(state.entity_store.as_ref(), &context, entity_type, &name).await {
        Ok(entity) => Json(entity).into_response(),
        Err(err) => rpc_error_response(err),
    }
}

// ============================================================================
// CreateEntity / RegisterEntity
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateEntityBody {
    pub provider_id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub name: Option<String>,
    pub identifying_properties: Option<Vec<(String, serde_json::Value)>>,
    pub originated_from: Option<String>,
}

pub async fn create_entity_handler(
    State(state): State<RpcState>,
    Extension(context): Extension<EntityContext>,
    Json(body): Json<CreateEntityBody>,
) -> Response {
    let provider_id = match ProviderId::from_str(&body.provider_id) {
        Ok(id) => id,
        Err(_) => return bad_request("invalid provider_id"),
    };
    let entity_type = EntityType::from_str(&body.entity_type).unwrap_or(EntityType::Unspecified);
    let originated_from = match body.originated_from.as_deref().map(EntityId::from_str) {
        Some(Ok(id)) => Some(id),
        Some(Err(_)) => return bad_request("invalid originated_from"),
        None => None,
    };

    let identity = match (body.name, body.identifying_properties) {
        (Some(name), _) => EntityIdentity::Name(name),
        (None, Some(properties)) => EntityIdentity::Properties(properties),
        (None, None) => {
            return bad_request("either 'name' or 'identifying_properties' is required")
        }
    };

    match create_entity(
        state.entity_store.as_ref(),
        &context,
        provider_id,
        entity_type,
        identity,
        originated_from,
    )
    .await
    {
        Ok(entity) => Json(entity).into_response(),
        Err(err) => rpc_error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReconcileBody {
    pub provider_id: String,
    pub repository_name: String,
    pub owner: String,
}

pub async fn create_entity_reconciliation_task_handler(
    State(state): State<RpcState>,
    Extension(context): Extension<EntityContext>,
    Json(body): Json<ReconcileBody>,
) -> Response {
    let provider_id = match ProviderId::from_str(&body.provider_id) {
        Ok(id) => id,
        Err(_) => return bad_request("invalid provider_id"),
    };
    let publisher = state.publisher();
    match create_entity_reconciliation_task(
        &publisher,
        &context,
        provider_id,
        &body.repository_name,
        &body.owner,
    )
    .await
    {
        Ok(()) => Json(serde_json::json!({ "status": "accepted" })).into_response(),
        Err(err) => rpc_error_response(err),
    }
}

// ============================================================================
// CreateUser / DeleteUser
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
    pub gh_id: Option<i64>,
    pub preferred_username: String,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub user_id: String,
    pub project_id: Option<String>,
}

pub async fn create_user_handler(
    State(state): State<RpcState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreateUserBody>,
) -> Response {
    match create_user(
        state.entity_store.as_ref(),
        &identity.subject,
        body.gh_id,
        &body.preferred_username,
    )
    .await
    {
        Ok((user, project_id)) => Json(CreateUserResponse {
            user_id: user.id.to_string(),
            project_id: project_id.map(|id| id.to_string()),
        })
        .into_response(),
        Err(err) => rpc_error_response(err),
    }
}

pub async fn delete_user_handler(
    State(state): State<RpcState>,
    Extension(identity): Extension<Identity>,
) -> Response {
    match delete_user(
        state.entity_store.as_ref(),
        state.authz.as_ref(),
        state.identity_provider.as_ref(),
        &identity.subject,
    )
    .await
    {
        Ok(()) => Json(serde_json::json!({ "status": "deleted" })).into_response(),
        Err(err) => rpc_error_response(err),
    }
}

// ============================================================================
// ResolveInvitation
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ResolveInvitationBody {
    pub accept: bool,
}

pub async fn resolve_invitation_handler(
    State(state): State<RpcState>,
    Extension(identity): Extension<Identity>,
    Path(code): Path<String>,
    Json(body): Json<ResolveInvitationBody>,
) -> Response {
    let invitation = match state.invitations.get_by_code(&code).await {
        Ok(invitation) => invitation,
        Err(_) => {
            return rpc_error_response(queue_keeper_core::RpcError::NotFound(
                "invitation not found or already used".to_string(),
            ))
        }
    };

    let accepter = UserRowId::from_uuid(
        match uuid::Uuid::parse_str(&identity.subject) {
            Ok(uuid) => uuid,
            Err(_) => return bad_request("caller subject is not a valid user id"),
        },
    );

    match resolve_invitation(
        state.authz.as_ref(),
        invitation,
        accepter,
        body.accept,
        queue_keeper_core::Timestamp::now(),
    )
    .await
    {
        Ok(()) => {
            let _ = state.invitations.delete(&code).await;
            Json(serde_json::json!({ "status": "resolved", "accepted": body.accept })).into_response()
        }
        Err(err) => rpc_error_response(err),
    }
}

// ============================================================================
// CreateRuleType / UpdateRuleType
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RuleTypeBody {
    pub name: String,
    pub guidance: String,
    #[serde(default)]
    pub definition: serde_json::Value,
}

pub async fn create_rule_type_handler(
    State(state): State<RpcState>,
    Extension(context): Extension<EntityContext>,
    Json(body): Json<RuleTypeBody>,
) -> Response {
    match create_rule_type(
        state.rule_types.as_ref(),
        context.project_id,
        body.name,
        body.guidance,
        body.definition,
    )
    .await
    {
        Ok(rule_type) => Json(rule_type).into_response(),
        Err(err) => rpc_error_response(err),
    }
}

pub async fn update_rule_type_handler(
    State(state): State<RpcState>,
    Extension(context): Extension<EntityContext>,
    Path(name): Path<String>,
    Json(body): Json<RuleTypeBody>,
) -> Response {
    match update_rule_type(
        state.rule_types.as_ref(),
        context.project_id,
        &name,
        body.guidance,
        body.definition,
    )
    .await
    {
        Ok(rule_type) => Json(rule_type).into_response(),
        Err(err) => rpc_error_response(err),
    }
}

// ============================================================================
// ListProjects
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ListProjectsResponse {
    pub projects: Vec<Project>,
}

pub async fn list_projects_handler(
    State(state): State<RpcState>,
    Extension(identity): Extension<Identity>,
) -> Response {
    match list_projects(state.entity_store.as_ref(), state.authz.as_ref(), &identity.subject).await {
        Ok(projects) => Json(ListProjectsResponse { projects }).into_response(),
        Err(err) => rpc_error_response(err),
    }
}
