//! # Interceptor chain (C7, spec §4.7)
//!
//! The ordered RPC middleware every non-webhook handler passes through
//! before reaching a handler body. Order, outermost first, matches the
//! spec table exactly:
//!
//! 1. max-size (`tower_http::limit::RequestBodyLimitLayer`)
//! 2. panic recovery (`tower_http::catch_panic::CatchPanicLayer`)
//! 3. request-id
//! 4. logger
//! 5. token validation
//! 6. entity-context injection
//! 7. project authorization
//!
//! Webhook HTTP endpoints carry their own signature-based trust model and
//! skip this chain entirely (§4.7 "The chain is skipped for webhook HTTP
//! endpoints").

use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use crate::rpc_state::RpcState;
use queue_keeper_core::{EntityContext, Identity, ProjectId, Role, RpcError};
use tracing::{error, info_span, warn, Instrument};
use uuid::Uuid;

/// Request methods whose RPCs are satisfied by `viewer`; everything else
/// requires `editor` or `admin` (§4.7 step 7).
fn required_role(method: &Method) -> Role {
    if method == Method::GET {
        Role::Viewer
    } else {
        Role::Editor
    }
}

/// Paths exempt from the entity-context + authorization steps (§4.7 step 6:
/// "except for explicitly whitelisted methods (health, self-registration,
/// invite resolution, OAuth callbacks)"). Token validation still runs for
/// everything except health.
const CONTEXT_EXEMPT_PREFIXES: &[&str] = &[
    "/v1/users",        // self-registration (CreateUser)
    "/v1/invitations",  // invite resolution
    "/v1/auth/callback", // OAuth callbacks
];

fn is_context_exempt(path: &str) -> bool {
    CONTEXT_EXEMPT_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

const TOKEN_EXEMPT_PREFIXES: &[&str] = &["/health", "/v1/auth/callback"];

fn is_token_exempt(path: &str) -> bool {
    TOKEN_EXEMPT_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Request-id interceptor (§4.7 step 3): reuses an inbound `request-id`
/// header or generates one, and propagates it to the response.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("request-id", value);
    }
    response
}

#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Logger interceptor (§4.7 step 4): a structured span scoped to the
/// request; later steps enrich it with `project_id`/`provider_id`/`entity_id`
/// once resolved, matching §4.8 step 5 "business telemetry".
pub async fn logger(request: Request, next: Next) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_default();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = info_span!(
        "rpc_request",
        request_id = %request_id,
        method = %method,
        path = %path,
        project_id = tracing::field::Empty,
        provider_id = tracing::field::Empty,
        entity_id = tracing::field::Empty,
    );

    async move { next.run(request).await }.instrument(span).await
}

/// Panic recovery (§4.7 step 2): converts a panic inside a handler into an
/// `INTERNAL` response with the stack trace logged; the process keeps
/// running. Thin wrapper over `tower_http::catch_panic` that matches our
/// JSON error shape rather than the library's plain-text default.
pub fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %message, "recovered from panic in request handler");
    rpc_error_response(RpcError::Internal("internal error".to_string()))
}

/// Token validation (§4.7 step 5): extracts the bearer token, resolves an
/// [`Identity`], and attaches it to request extensions.
pub async fn token_validation(
    State(state): State<RpcState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if is_token_exempt(&path) {
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let token = match token {
        Some(t) => t,
        None => {
            return unauthenticated("missing bearer token");
        }
    };

    match state.identity_provider.validate_token(token).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => {
            warn!(error = %err, "token validation failed");
            unauthenticated(&err.to_string())
        }
    }
}

fn unauthenticated(message: &str) -> Response {
    let body = serde_json::json!({ "error": "UNAUTHENTICATED", "message": message });
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

/// Entity-context injection (§4.7 step 6): resolves `project_id` (and an
/// optional provider name) from the `x-context-project`/`x-context-provider`
/// headers the HTTP gateway populates from the RPC request's `context`
/// field, and attaches [`EntityContext`] to request extensions. Requests
/// without a context are rejected `INVALID_ARGUMENT` unless the path is
/// explicitly whitelisted.
pub async fn entity_context(mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if is_context_exempt(&path) {
        return next.run(request).await;
    }

    let project_id = request
        .headers()
        .get("x-context-project")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Uuid>().ok())
        .map(ProjectId::from_uuid);

    let project_id = match project_id {
        Some(id) => id,
        None => {
            return rpc_error_response(RpcError::InvalidArgument(
                "request is missing a project context".to_string(),
            ));
        }
    };

    let provider_name = request
        .headers()
        .get("x-context-provider")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    tracing::Span::current().record("project_id", tracing::field::display(project_id));

    request.extensions_mut().insert(EntityContext {
        project_id,
        provider_name,
    });
    next.run(request).await
}

/// Project authorization (§4.7 step 7): checks the authenticated subject
/// holds the required role on the context's project. Skipped on the same
/// whitelist as entity-context injection, since there's no project to
/// check against.
pub async fn project_authorization(
    State(state): State<RpcState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if is_context_exempt(&path) {
        return next.run(request).await;
    }

    let identity = match request.extensions().get::<Identity>() {
        Some(identity) => identity.clone(),
        None => return unauthenticated("no authenticated identity on request"),
    };
    let context = match request.extensions().get::<EntityContext>() {
        Some(context) => context.clone(),
        None => {
            return rpc_error_response(RpcError::InvalidArgument(
                "request is missing a project context".to_string(),
            ));
        }
    };

    let role = required_role(request.method());
    match state.authz.check(&identity.subject, role, context.project_id).await {
        Ok(true) => next.run(request).await,
        Ok(false) => rpc_error_response(RpcError::PermissionDenied(
            "caller lacks the required role on this project".to_string(),
        )),
        Err(err) => {
            error!(error = %err, "authorization store unavailable");
            rpc_error_response(RpcError::Internal(err.to_string()))
        }
    }
}

/// Maps an [`RpcError`] to its §6/§7 status code and a JSON body, shared by
/// the interceptor chain and the RPC handlers so both surfaces agree on
/// wire shape.
pub fn rpc_error_response(err: RpcError) -> Response {
    let status = match err {
        RpcError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        RpcError::NotFound(_) => StatusCode::NOT_FOUND,
        RpcError::AlreadyExists(_) => StatusCode::CONFLICT,
        RpcError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        RpcError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = serde_json::json!({ "error": err.to_string() });
    (status, Json(body)).into_response()
}

#[cfg(test)]
#[path = "middleware_tests.rs"]
mod tests;
