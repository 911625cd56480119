//! HTTP API server for the Vouch node.
//!
//! REST endpoints over the DID registry, the credential status registry and
//! the verification engine. Writes identify their caller through the
//! `x-vouch-caller` header, which the fronting gateway sets after
//! authenticating the request.

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use vouch_core::{AuditEvent, CredentialStatus};
use vouch_registry::{
    BatchStatus, DidContent, DidDocument, StatusCheck, StatusHistoryEntry, StatusRecord,
};
use vouch_verifier::VerificationResult;

use crate::error::ApiError;
use crate::state::NodeState;

pub const CALLER_HEADER: &str = "x-vouch-caller";

const DEFAULT_EVENT_LIMIT: usize = 50;
const MAX_EVENT_LIMIT: usize = 1000;

/// Identity performing a write, taken from [`CALLER_HEADER`].
pub struct Caller(pub String);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|caller| !caller.is_empty())
            .map(|caller| Caller(caller.to_string()))
            .ok_or(ApiError::MissingCaller)
    }
}

// --- Request / response types ---

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub dids: usize,
    pub credentials: usize,
    pub event_subscribers: usize,
    pub persist_events: bool,
    pub uptime_secs: u64,
}

#[derive(Deserialize)]
pub struct CreateDidRequest {
    pub id: String,
    #[serde(flatten)]
    pub content: DidContent,
}

#[derive(Deserialize)]
pub struct ControllerRequest {
    pub controller: String,
}

#[derive(Serialize)]
pub struct ControllersResponse {
    pub did: String,
    pub controllers: Vec<String>,
}

#[derive(Serialize)]
pub struct ControlledDidsResponse {
    pub controller: String,
    pub dids: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCredentialRequest {
    pub id: String,
    /// Unix seconds, 0 or absent for never.
    #[serde(default)]
    pub expires_at: u64,
}

#[derive(Deserialize, Default)]
pub struct ReasonRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: CredentialStatus,
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize)]
pub struct BatchStatusRequest {
    pub ids: Vec<String>,
}

#[derive(Serialize)]
pub struct IssuerCredentialsResponse {
    pub issuer: String,
    pub credentials: Vec<String>,
}

#[derive(Deserialize)]
pub struct VerifyCredentialRequest {
    pub credential: Value,
}

#[derive(Deserialize)]
pub struct VerifyPresentationRequest {
    pub presentation: Value,
}

#[derive(Deserialize)]
pub struct VerifyBatchRequest {
    pub credentials: Vec<Value>,
}

#[derive(Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// --- Handlers: node ---

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

async fn handle_status(State(state): State<Arc<NodeState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        dids: state.dids.count(),
        credentials: state.statuses.count(),
        event_subscribers: state.events.subscriber_count(),
        persist_events: state.store.is_some(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

async fn handle_events(
    State(state): State<Arc<NodeState>>,
    Query(query): Query<EventsQuery>,
) -> ApiResult<Vec<AuditEvent>> {
    let store = state
        .store
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("event persistence is disabled".into()))?;
    let limit = query.limit.unwrap_or(DEFAULT_EVENT_LIMIT).min(MAX_EVENT_LIMIT);
    let events = store
        .recent_events(limit)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(events))
}

// --- Handlers: DID registry ---

async fn handle_create_did(
    State(state): State<Arc<NodeState>>,
    Caller(caller): Caller,
    Json(req): Json<CreateDidRequest>,
) -> Result<(StatusCode, Json<DidDocument>), ApiError> {
    let doc = state.dids.create_did(&caller, &req.id, req.content)?;
    Ok((StatusCode::CREATED, Json(doc)))
}

async fn handle_resolve_did(
    State(state): State<Arc<NodeState>>,
    Path(did): Path<String>,
) -> ApiResult<DidDocument> {
    Ok(Json(state.dids.resolve_did(&did)?))
}

async fn handle_update_did(
    State(state): State<Arc<NodeState>>,
    Path(did): Path<String>,
    Caller(caller): Caller,
    Json(content): Json<DidContent>,
) -> ApiResult<DidDocument> {
    Ok(Json(state.dids.update_did(&caller, &did, content)?))
}

async fn handle_deactivate_did(
    State(state): State<Arc<NodeState>>,
    Path(did): Path<String>,
    Caller(caller): Caller,
) -> Result<StatusCode, ApiError> {
    state.dids.deactivate_did(&caller, &did)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_get_controllers(
    State(state): State<Arc<NodeState>>,
    Path(did): Path<String>,
) -> ApiResult<ControllersResponse> {
    if !state.dids.did_exists(&did) {
        return Err(vouch_registry::RegistryError::NotFound(did).into());
    }
    let controllers = state.dids.get_controllers(&did);
    Ok(Json(ControllersResponse { did, controllers }))
}

async fn handle_add_controller(
    State(state): State<Arc<NodeState>>,
    Path(did): Path<String>,
    Caller(caller): Caller,
    Json(req): Json<ControllerRequest>,
) -> ApiResult<ControllersResponse> {
    state.dids.add_controller(&caller, &did, &req.controller)?;
    let controllers = state.dids.get_controllers(&did);
    Ok(Json(ControllersResponse { did, controllers }))
}

async fn handle_remove_controller(
    State(state): State<Arc<NodeState>>,
    Path((did, controller)): Path<(String, String)>,
    Caller(caller): Caller,
) -> ApiResult<ControllersResponse> {
    state.dids.remove_controller(&caller, &did, &controller)?;
    let controllers = state.dids.get_controllers(&did);
    Ok(Json(ControllersResponse { did, controllers }))
}

async fn handle_dids_by_controller(
    State(state): State<Arc<NodeState>>,
    Path(controller): Path<String>,
) -> Json<ControlledDidsResponse> {
    let dids = state.dids.get_dids_by_controller(&controller);
    Json(ControlledDidsResponse { controller, dids })
}

// --- Handlers: credential status registry ---

async fn handle_issue_credential(
    State(state): State<Arc<NodeState>>,
    Caller(caller): Caller,
    Json(req): Json<IssueCredentialRequest>,
) -> Result<(StatusCode, Json<StatusRecord>), ApiError> {
    let record = state
        .statuses
        .issue_credential(&caller, &req.id, req.expires_at)?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn handle_get_credential(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusRecord> {
    state
        .statuses
        .get_record(&id)
        .map(Json)
        .ok_or_else(|| vouch_registry::RegistryError::NotFound(id).into())
}

async fn handle_check_status(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCheck> {
    Ok(Json(state.statuses.check_status(&id)?))
}

async fn handle_update_status(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<String>,
    Caller(caller): Caller,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<StatusRecord> {
    Ok(Json(
        state
            .statuses
            .update_status(&caller, &id, req.status, &req.reason)?,
    ))
}

async fn handle_revoke(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<String>,
    Caller(caller): Caller,
    Json(req): Json<ReasonRequest>,
) -> ApiResult<StatusRecord> {
    Ok(Json(state.statuses.revoke_credential(&caller, &id, &req.reason)?))
}

async fn handle_suspend(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<String>,
    Caller(caller): Caller,
    Json(req): Json<ReasonRequest>,
) -> ApiResult<StatusRecord> {
    Ok(Json(state.statuses.suspend_credential(&caller, &id, &req.reason)?))
}

async fn handle_reactivate(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<String>,
    Caller(caller): Caller,
    Json(req): Json<ReasonRequest>,
) -> ApiResult<StatusRecord> {
    Ok(Json(
        state
            .statuses
            .reactivate_credential(&caller, &id, &req.reason)?,
    ))
}

async fn handle_status_history(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<String>,
) -> Json<Vec<StatusHistoryEntry>> {
    Json(state.statuses.get_status_history(&id))
}

async fn handle_batch_status(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<BatchStatusRequest>,
) -> Json<BatchStatus> {
    Json(state.statuses.batch_check_status(&req.ids))
}

async fn handle_credentials_by_issuer(
    State(state): State<Arc<NodeState>>,
    Path(issuer): Path<String>,
) -> Json<IssuerCredentialsResponse> {
    let credentials = state.statuses.get_credentials_by_issuer(&issuer);
    Json(IssuerCredentialsResponse {
        issuer,
        credentials,
    })
}

// --- Handlers: verification ---

async fn handle_verify_credential(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<VerifyCredentialRequest>,
) -> Json<VerificationResult> {
    Json(state.engine.verify_credential(&req.credential).await)
}

async fn handle_verify_presentation(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<VerifyPresentationRequest>,
) -> Json<VerificationResult> {
    Json(state.engine.verify_presentation(&req.presentation).await)
}

async fn handle_verify_batch(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<VerifyBatchRequest>,
) -> Json<Vec<VerificationResult>> {
    Json(state.engine.verify_batch(&req.credentials).await)
}

async fn handle_verify_status(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCheck> {
    Ok(Json(state.engine.check_credential_status(&id).await?))
}

// --- Server ---

pub fn build_router(state: Arc<NodeState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handle_health))
        .route("/api/v1/status", get(handle_status))
        .route("/api/v1/events", get(handle_events))
        .route("/api/v1/dids", post(handle_create_did))
        .route(
            "/api/v1/dids/{did}",
            get(handle_resolve_did)
                .put(handle_update_did)
                .delete(handle_deactivate_did),
        )
        .route(
            "/api/v1/dids/{did}/controllers",
            get(handle_get_controllers).post(handle_add_controller),
        )
        .route(
            "/api/v1/dids/{did}/controllers/{controller}",
            axum::routing::delete(handle_remove_controller),
        )
        .route(
            "/api/v1/controllers/{controller}/dids",
            get(handle_dids_by_controller),
        )
        .route("/api/v1/credentials", post(handle_issue_credential))
        .route("/api/v1/credentials/batch-status", post(handle_batch_status))
        .route("/api/v1/credentials/{id}", get(handle_get_credential))
        .route(
            "/api/v1/credentials/{id}/status",
            get(handle_check_status).put(handle_update_status),
        )
        .route("/api/v1/credentials/{id}/history", get(handle_status_history))
        .route("/api/v1/credentials/{id}/revoke", post(handle_revoke))
        .route("/api/v1/credentials/{id}/suspend", post(handle_suspend))
        .route("/api/v1/credentials/{id}/reactivate", post(handle_reactivate))
        .route(
            "/api/v1/issuers/{issuer}/credentials",
            get(handle_credentials_by_issuer),
        )
        .route("/api/v1/verify/credential", post(handle_verify_credential))
        .route("/api/v1/verify/presentation", post(handle_verify_presentation))
        .route("/api/v1/verify/batch", post(handle_verify_batch))
        .route("/api/v1/verify/status/{id}", get(handle_verify_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_api_server(
    listen_addr: SocketAddr,
    state: Arc<NodeState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(%listen_addr, "HTTP API server started");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
