//! REST API for the career guidance advisor
//!
//! Thin diagnostic surface over `Advisor`: the aggregated answer, the raw
//! per-agent dispatch and direct access to the retrieval engine.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::advisor::Advisor;

const DEFAULT_SEARCH_RESULTS: usize = 5;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RespondRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DispatchRequest {
    pub query: String,
    /// Agent names; all registered agents when absent or empty.
    #[serde(default)]
    pub agents: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DocumentsRequest {
    pub documents: Vec<String>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub advisor: Arc<Advisor>,
}

fn missing_query() -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error("query must not be empty".into())),
    )
}

/// =============================
/// Health Endpoint
/// =============================

async fn health(State(state): State<ApiState>) -> Json<ApiResponse> {
    let retrieval = state.advisor.retrieval();

    Json(ApiResponse::success(serde_json::json!({
        "status": "healthy",
        "strategy": retrieval.strategy(),
        "degraded": retrieval.is_degraded().await,
        "documents": retrieval.len().await,
        "agents": state.advisor.dispatcher().agent_names(),
    })))
}

/// =============================
/// Advice Endpoints
/// =============================

async fn respond_handler(
    State(state): State<ApiState>,
    Json(req): Json<RespondRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let request_id = Uuid::new_v4();
    info!(%request_id, query = %req.query, "Received respond request");

    let response = state.advisor.respond(&req.query).await;

    info!(
        %request_id,
        agents = response.agent_results.len(),
        resources = response.resources.len(),
        "Respond request completed"
    );

    (StatusCode::OK, Json(ApiResponse::success(response)))
}

async fn dispatch_handler(
    State(state): State<ApiState>,
    Json(req): Json<DispatchRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let request_id = Uuid::new_v4();
    info!(%request_id, query = %req.query, agents = ?req.agents, "Received dispatch request");

    let results = state
        .advisor
        .dispatcher()
        .dispatch(&req.query, req.agents.as_deref())
        .await;

    (StatusCode::OK, Json(ApiResponse::success(results)))
}

/// =============================
/// Retrieval Endpoints
/// =============================

async fn search_handler(
    State(state): State<ApiState>,
    Json(req): Json<SearchRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.query.trim().is_empty() {
        return missing_query();
    }

    let top_k = req.top_k.unwrap_or(DEFAULT_SEARCH_RESULTS);
    let retrieval = state.advisor.retrieval();
    let documents = retrieval.query(&req.query, top_k).await;

    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "strategy": retrieval.strategy(),
            "documents": documents,
        }))),
    )
}

async fn documents_handler(
    State(state): State<ApiState>,
    Json(req): Json<DocumentsRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let retrieval = state.advisor.retrieval();
    let added = retrieval.add_documents(req.documents).await;
    let total = retrieval.len().await;

    info!(added, total, "Documents appended");

    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "added": added,
            "total": total,
        }))),
    )
}

/// =============================
/// Router
/// =============================

pub fn create_router(advisor: Arc<Advisor>) -> Router {
    let state = ApiState { advisor };

    Router::new()
        .route("/health", get(health))
        .route("/api/respond", post(respond_handler))
        .route("/api/dispatch", post(dispatch_handler))
        .route("/api/search", post(search_handler))
        .route("/api/documents", post(documents_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    advisor: Arc<Advisor>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(advisor);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
