//! HTTP gateway exposing analysis, history, and model-catalog routes.
//!
//! The store and aggregator stay plain library objects; this module only
//! wires them to routes the web dashboard consumes.

mod models;

pub use models::{FolderEntry, ModelCatalog};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{CatalogError, ServerError};
use crate::history::{
    AnalysisInput, BroodPatternRecord, HealthAggregator, HistoryStore, OverallHealth,
    QueenCellRecord,
};
use crate::inference::InferenceClient;
use crate::storage::StorageBackend;

/// Shared state for the gateway.
#[derive(Clone)]
pub struct AppState {
    pub queen: HistoryStore<QueenCellRecord>,
    pub brood: HistoryStore<BroodPatternRecord>,
    pub aggregator: Arc<HealthAggregator>,
    pub inference: Arc<InferenceClient>,
    pub catalog: Arc<ModelCatalog>,
}

impl AppState {
    /// Wire the full application state over one storage backend.
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        inference: InferenceClient,
        catalog: ModelCatalog,
    ) -> Self {
        let queen = HistoryStore::queen(backend.clone());
        let brood = HistoryStore::brood(backend);
        let aggregator = HealthAggregator::new(queen.clone(), brood.clone());
        Self {
            queen,
            brood,
            aggregator: Arc::new(aggregator),
            inference: Arc::new(inference),
            catalog: Arc::new(catalog),
        }
    }
}

/// Build the axum router for the gateway.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/predict", post(predict))
        .route("/api/models", get(list_models))
        .route("/api/models/{folder}", get(browse_model_folder))
        .route("/api/analyses", post(save_analysis))
        .route("/api/history/queen", get(list_queen).delete(clear_queen))
        .route("/api/history/queen/{id}", delete(delete_queen))
        .route("/api/history/brood", get(list_brood).delete(clear_brood))
        .route("/api/history/brood/{id}", delete(delete_brood))
        .route("/api/overview", get(overview))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the listener and serve until the process exits.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<(), ServerError> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::StartupFailed {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;

    tracing::info!("gateway listening on {addr}");
    axum::serve(listener, app).await.map_err(ServerError::Io)
}

// -- DTOs --

#[derive(Debug, Deserialize)]
struct PredictRequest {
    /// Gradio-style payload: the image is the first element.
    #[serde(default)]
    data: Vec<String>,
}

#[derive(Debug, Serialize)]
struct FoldersResponse {
    folders: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ContentsResponse {
    contents: Vec<FolderEntry>,
}

// -- Handlers --

async fn health_check() -> &'static str {
    "ok"
}

async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Json<serde_json::Value> {
    let image = req.data.into_iter().next().unwrap_or_default();
    let result = state.inference.analyze_queen(&image).await;
    Json(json!({ "data": [serde_json::Value::Null, result] }))
}

async fn list_models(State(state): State<AppState>) -> Result<Json<FoldersResponse>, StatusCode> {
    let folders = state.catalog.list_folders().map_err(|e| {
        tracing::error!("failed to read model folders: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(FoldersResponse { folders }))
}

async fn browse_model_folder(
    State(state): State<AppState>,
    Path(folder): Path<String>,
) -> Result<Json<ContentsResponse>, StatusCode> {
    match state.catalog.browse(&folder) {
        Ok(contents) => Ok(Json(ContentsResponse { contents })),
        Err(CatalogError::InvalidPath(_)) => Err(StatusCode::BAD_REQUEST),
        Err(CatalogError::NotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("failed to read folder contents: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn save_analysis(
    State(state): State<AppState>,
    Json(input): Json<AnalysisInput>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let record = match input {
        AnalysisInput::Queen(input) => serde_json::to_value(state.queen.save(input)),
        AnalysisInput::Brood(input) => serde_json::to_value(state.brood.save(input)),
    };
    record
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

async fn list_queen(State(state): State<AppState>) -> Json<Vec<QueenCellRecord>> {
    Json(state.queen.list())
}

async fn delete_queen(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    state.queen.delete(&id);
    StatusCode::NO_CONTENT
}

async fn clear_queen(State(state): State<AppState>) -> StatusCode {
    state.queen.clear();
    StatusCode::NO_CONTENT
}

async fn list_brood(State(state): State<AppState>) -> Json<Vec<BroodPatternRecord>> {
    Json(state.brood.list())
}

async fn delete_brood(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    state.brood.delete(&id);
    StatusCode::NO_CONTENT
}

async fn clear_brood(State(state): State<AppState>) -> StatusCode {
    state.brood.clear();
    StatusCode::NO_CONTENT
}

async fn overview(State(state): State<AppState>) -> Json<OverallHealth> {
    Json(state.aggregator.overall_health())
}
