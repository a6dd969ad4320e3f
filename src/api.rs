//! REST API server for the finance query engine
//!
//! POST /query answers a question by trial consensus.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Instrument};

use crate::engine::QueryEngine;
use crate::error::EngineError;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QueryRequest {
    pub query: String,
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
    pub engine: Arc<QueryEngine>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Query Endpoint
/// =============================

async fn run_query(
    State(state): State<ApiState>,
    Json(req): Json<QueryRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("query", %request_id);

    async move {
        info!("Received question: {}", req.query);

        match state.engine.answer(&req.query).await {
            Ok(consensus) => {
                info!("Consensus: {}", consensus);
                (StatusCode::OK, Json(ApiResponse::success(consensus)))
            }
            Err(EngineError::InvalidQuestion(message)) => {
                (StatusCode::BAD_REQUEST, Json(ApiResponse::error(message)))
            }
            Err(e) => {
                error!("Query failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error(format!("Query failed: {}", e))),
                )
            }
        }
    }
    .instrument(span)
    .await
}

/// =============================
/// Router
/// =============================

pub fn create_router(engine: Arc<QueryEngine>) -> Router {
    let state = ApiState { engine };

    Router::new()
        .route("/health", get(health))
        .route("/query", post(run_query))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    engine: Arc<QueryEngine>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(engine);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
