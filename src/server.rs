use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::config::{ProcessSettings, Settings};
use crate::connection::{describe_connection, ConnectionRequest, ConnectionTemplate};
use crate::error::Error;
use crate::note::{Note, ProcessResult};
use crate::processor::NoteProcessor;

#[derive(Clone)]
pub struct AppState {
    processor: Arc<NoteProcessor>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            processor: Arc::new(NoteProcessor::new(settings)),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ProcessRequest {
    pub notes: Vec<Note>,
    #[serde(default)]
    pub settings: ProcessSettings,
}

/// JSON `{"error": message}` body with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::internal(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/process", post(process_notes))
        .route("/generate_connection", post(generate_connection))
        .with_state(state)
}

async fn index() -> Json<Value> {
    Json(json!({
        "info": "Note Processing API",
        "endpoints": {
            "/process": "POST - Process notes and return t-SNE results",
            "/generate_connection": "POST - Generate a description of the connection between two notes",
            "/health": "GET - Health check endpoint"
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn process_notes(
    State(state): State<AppState>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<ProcessResult>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        error!("Error processing notes: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;
    info!("Received request with {} notes", request.notes.len());

    let processor = state.processor.clone();
    let result = tokio::task::spawn_blocking(move || {
        processor.process(&request.notes, &request.settings)
    })
    .await
    .map_err(|e| Error::Worker(e.to_string()))
    .and_then(|r| r);

    match result {
        Ok(result) => Ok(Json(result)),
        Err(err) => {
            error!("Error processing notes: {}", err);
            Err(err.into())
        }
    }
}

async fn generate_connection(
    payload: Result<Json<ConnectionRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        error!(
            "Error processing connection generation request: {}",
            rejection.body_text()
        );
        ApiError::from(rejection)
    })?;
    info!(
        source = request.source_note.as_ref().map(|n| n.title.as_str()),
        target = request.target_note.as_ref().map(|n| n.title.as_str()),
        "Received connection generation request"
    );

    let template = *ConnectionTemplate::ALL
        .choose(&mut rand::thread_rng())
        .unwrap_or(&ConnectionTemplate::ConceptualOverlap);

    let description = describe_connection(&request, template)
        .ok_or_else(|| ApiError::bad_request("Missing required data"))?;

    Ok(Json(json!({ "description": description })))
}

/// Binds to the configured host and port. The host may be an IP address or a
/// name such as `localhost`.
pub async fn bind_listener(settings: &Settings) -> Result<tokio::net::TcpListener> {
    tokio::net::TcpListener::bind((settings.host.as_str(), settings.port))
        .await
        .with_context(|| format!("Failed to bind listener to {}", settings.bind_address()))
}

pub async fn serve(settings: Settings) -> Result<()> {
    let listener = bind_listener(&settings).await?;
    let local_addr = listener
        .local_addr()
        .context("Failed to read listener address")?;

    let router = create_router(AppState::new(settings));

    info!("Note processing server listening on http://{}", local_addr);

    axum::serve(listener, router.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
