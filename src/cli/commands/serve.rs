//! HTTP API server.
//!
//! Provides the question answering endpoint and a health check.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::{ErrorClass, VidQueryError};
use crate::orchestrator::Orchestrator;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Arc::new(Orchestrator::new(&settings)?);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("VidQuery API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Ask", "POST /ask");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(orchestrator))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

/// Build the API router over a shared orchestrator.
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ask", post(ask))
        .layer(cors)
        .with_state(orchestrator)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    /// YouTube video ID or URL
    #[serde(alias = "video_url")]
    video_id: String,
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

/// A pipeline failure rendered as `{detail}` with a status from its class.
struct ApiError(VidQueryError);

impl From<VidQueryError> for ApiError {
    fn from(e: VidQueryError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.class() {
            ErrorClass::NotFound => StatusCode::NOT_FOUND,
            ErrorClass::InvalidInput => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }

        (
            status,
            Json(ErrorResponse {
                detail: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ask(
    State(orchestrator): State<Arc<Orchestrator>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(req) = payload.map_err(|rejection| VidQueryError::InvalidInput(rejection.body_text()))?;

    let answer = orchestrator.ask(&req.video_id, &req.question).await?;

    Ok(Json(AskResponse { answer: answer.text }))
}
