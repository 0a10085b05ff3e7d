//! # Forge HTTP Routes
//!
//! File: cli/src/commands/srv/routes.rs
//!
//! ## Overview
//!
//! The JSON API in front of the generation engine:
//!
//! | Method | Path               | Purpose                                         |
//! |--------|--------------------|-------------------------------------------------|
//! | GET    | `/health`          | liveness and active session count               |
//! | GET    | `/blueprints`      | blueprint catalogue                             |
//! | GET    | `/blueprints/{id}` | one checked schema                              |
//! | POST   | `/validate`        | resolve a configuration without rendering      |
//! | POST   | `/generate`        | run the pipeline and store the archive          |
//! | GET    | `/download/{id}`   | the stored archive (`application/gzip`)         |
//! | GET    | `/projects/{id}`   | metadata of a stored generation                 |
//! | DELETE | `/projects/{id}`   | evict a stored generation                       |
//! | GET    | `/ws/{id}`         | progress events of one generation (WebSocket)  |
//!
//! ## Architecture
//!
//! Handlers share an [`AppState`] of `Arc`s. Loading and generation are
//! CPU and filesystem work, so they run on the blocking pool. The artifact is
//! stored only after the pipeline has returned to the handler: if the
//! client goes away first, the handler future is dropped and the result is
//! discarded with nothing left in the store.
//!
//! Errors leave as [`ApiError`], a JSON body of
//! `{ "error": kind, "message": text, "details": [...] }`.
//!
use super::ws;
use crate::blueprint::dependencies::ResolvedDependency;
use crate::blueprint::schema::{BlueprintSchema, Hook};
use crate::blueprint::variables::{RawConfig, ResolvedVariables};
use crate::blueprint::{BlueprintLoader, BlueprintSummary};
use crate::common::archive;
use crate::core::error::{ForgeError, ForgeResult};
use crate::core::id::GenerationId;
use crate::generate::{ContentKind, GenerationRequest, Generator};
use crate::progress::{BroadcasterHandle, ProgressEvent};
use crate::session::{GenerationArtifact, InFlight, SessionStore};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Shared handles for every request.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<Generator>,
    pub store: Arc<SessionStore>,
    pub progress: BroadcasterHandle,
    /// Ids of generations that are rendering but not yet stored.
    pub in_flight: InFlight,
}

impl AppState {
    pub fn new(
        loader: Arc<BlueprintLoader>,
        store: Arc<SessionStore>,
        progress: BroadcasterHandle,
    ) -> Self {
        let generator = Generator::new(loader).with_progress(progress.clone());
        Self {
            generator: Arc::new(generator),
            store,
            progress,
            in_flight: InFlight::new(),
        }
    }
}

/// Builds the API router without middleware; see `server_logic::create_app`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/blueprints", get(list_blueprints))
        .route("/blueprints/{id}", get(get_blueprint))
        .route("/validate", post(validate))
        .route("/generate", post(generate))
        .route("/download/{id}", get(download))
        .route("/projects/{id}", get(project_info).delete(delete_project))
        .route("/ws/{id}", get(ws::progress_socket))
        .with_state(state)
}

// --- Errors ---

/// An error leaving the API.
#[derive(Debug)]
pub enum ApiError {
    Forge(ForgeError),
    /// A blocking task panicked or was cancelled.
    Internal(String),
}

impl From<ForgeError> for ApiError {
    fn from(err: ForgeError) -> Self {
        Self::Forge(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(err.to_string())
    }
}

fn status_for(err: &ForgeError) -> StatusCode {
    match err {
        e if e.is_not_found() => StatusCode::NOT_FOUND,
        ForgeError::Validation(_) | ForgeError::Render(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ForgeError::DestinationConflict { .. } | ForgeError::GenerationIdInUse { .. } => {
            StatusCode::CONFLICT
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn details_for(err: &ForgeError) -> Value {
    match err {
        ForgeError::Validation(errors) => json!(errors),
        ForgeError::Render(errors) => json!(errors),
        _ => json!([]),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Forge(err) => {
                let status = status_for(err);
                if status.is_server_error() {
                    error!("Request failed: {}", err);
                } else {
                    debug!("Request rejected: {}", err);
                }
                (
                    status,
                    json!({
                        "error": err.kind(),
                        "message": err.to_string(),
                        "details": details_for(err),
                    }),
                )
            }
            Self::Internal(message) => {
                error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": message,
                        "details": [],
                    }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Ids that do not parse can never name an artifact, so they are "not found".
pub(crate) fn parse_id(raw: &str) -> Result<GenerationId, ApiError> {
    raw.parse().map_err(|_| {
        ApiError::Forge(ForgeError::ArtifactNotFound {
            id: raw.to_string(),
        })
    })
}

async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> ForgeResult<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(work).await??)
}

// --- Payloads ---

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub blueprint_id: String,
    #[serde(default)]
    pub config: RawConfig,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ResolvedVariables>,
    pub errors: Vec<crate::core::error::ValidationError>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub blueprint_id: String,
    #[serde(default)]
    pub config: RawConfig,
    #[serde(default)]
    pub generation_id: Option<GenerationId>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub generation_id: GenerationId,
    pub file_count: usize,
    pub download_url: String,
    pub expires_at: DateTime<Utc>,
    pub dependencies: Vec<ResolvedDependency>,
    pub hooks: Vec<Hook>,
}

#[derive(Debug, Serialize)]
pub struct FileInfo {
    pub path: String,
    pub kind: ContentKind,
    pub size: usize,
}

#[derive(Debug, Serialize)]
pub struct ProjectInfo {
    pub generation_id: GenerationId,
    pub blueprint_id: String,
    pub files: Vec<FileInfo>,
    pub archive_size: usize,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub config: ResolvedVariables,
    pub dependencies: Vec<ResolvedDependency>,
    pub hooks: Vec<Hook>,
    pub download_url: String,
}

impl From<&GenerationArtifact> for ProjectInfo {
    fn from(artifact: &GenerationArtifact) -> Self {
        Self {
            generation_id: artifact.id,
            blueprint_id: artifact.blueprint_id.clone(),
            files: artifact
                .files
                .iter()
                .map(|f| FileInfo {
                    path: f.path.clone(),
                    kind: f.kind,
                    size: f.content.len(),
                })
                .collect(),
            archive_size: artifact.archive.len(),
            created_at: artifact.created_at,
            expires_at: artifact.expires_at,
            config: artifact.config.clone(),
            dependencies: artifact.dependencies.clone(),
            hooks: artifact.hooks.clone(),
            download_url: download_url(artifact.id),
        }
    }
}

fn download_url(id: GenerationId) -> String {
    format!("/download/{}", id)
}

// --- Handlers ---

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "active_sessions": state.store.active_count(),
    }))
}

async fn list_blueprints(
    State(state): State<AppState>,
) -> Result<Json<Vec<BlueprintSummary>>, ApiError> {
    let generator = Arc::clone(&state.generator);
    let summaries = blocking(move || generator.loader().list()).await?;
    Ok(Json(summaries))
}

async fn get_blueprint(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BlueprintSchema>, ApiError> {
    let generator = Arc::clone(&state.generator);
    let blueprint = blocking(move || generator.loader().load(&id)).await?;
    Ok(Json(blueprint.schema.clone()))
}

async fn validate(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let generator = Arc::clone(&state.generator);
    let outcome = tokio::task::spawn_blocking(move || {
        generator.validate(&request.blueprint_id, &request.config)
    })
    .await?;

    match outcome {
        Ok(vars) => Ok(Json(ValidateResponse {
            valid: true,
            config: Some(vars),
            errors: Vec::new(),
        })),
        Err(ForgeError::Validation(errors)) => Ok(Json(ValidateResponse {
            valid: false,
            config: None,
            errors,
        })),
        Err(err) => Err(err.into()),
    }
}

/// # Generate Project (`POST /generate`)
///
/// Claims the generation id, runs the pipeline on the blocking pool and
/// stores the packaged archive.
///
/// ## Progress
///
/// The terminal `complete` event is sent only once the artifact is in the
/// store, so a listener that sees `success: true` can download right away.
/// A failure after rendering (packaging, storing, a panicked task) ends the
/// stream with `success: false`; failures inside the pipeline are reported
/// by the generator itself.
///
/// ## Errors
///
/// `409 generation_id_in_use` if the id is stored or another request is
/// still generating under it. The claim is taken before any rendering.
async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<GenerateResponse>), ApiError> {
    let id = request.generation_id.unwrap_or_default();
    let _claim = state.in_flight.claim(id, &state.store)?;

    let generator = Arc::clone(&state.generator);
    let project = blocking(move || {
        generator.generate(GenerationRequest {
            blueprint_id: request.blueprint_id,
            config: request.config,
            generation_id: Some(id),
        })
    })
    .await
    .inspect_err(|err| {
        if let ApiError::Internal(message) = err {
            end_failed(&state, id, message);
        }
    })?;

    let generator = Arc::clone(&state.generator);
    let stored = match blocking(move || generator.package(project)).await {
        Ok(packaged) => state.store.put(packaged).map_err(ApiError::from),
        Err(err) => Err(err),
    };
    let artifact = match stored {
        Ok(artifact) => artifact,
        Err(ApiError::Forge(err)) => {
            state.generator.fail(id, &err);
            return Err(err.into());
        }
        Err(ApiError::Internal(message)) => {
            end_failed(&state, id, &message);
            return Err(ApiError::Internal(message));
        }
    };

    info!(
        generation_id = %artifact.id,
        blueprint = %artifact.blueprint_id,
        "Generation stored"
    );
    state.generator.complete(artifact.id, artifact.files.len());

    Ok((
        StatusCode::CREATED,
        Json(GenerateResponse {
            generation_id: artifact.id,
            file_count: artifact.files.len(),
            download_url: download_url(artifact.id),
            expires_at: artifact.expires_at,
            dependencies: artifact.dependencies.clone(),
            hooks: artifact.hooks.clone(),
        }),
    ))
}

fn end_failed(state: &AppState, id: GenerationId, message: &str) {
    state.progress.broadcast(ProgressEvent::error(id, None, message));
    state.progress.broadcast(ProgressEvent::failed(id, 1));
}

async fn download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let artifact = state.store.get(id)?;
    let filename = format!("{}-{}.{}", artifact.blueprint_id, id, archive::EXTENSION);

    Ok((
        [
            (header::CONTENT_TYPE, archive::CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        Body::from(artifact.archive.clone()),
    )
        .into_response())
}

async fn project_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectInfo>, ApiError> {
    let id = parse_id(&id)?;
    let artifact = state.store.get(id)?;
    Ok(Json(ProjectInfo::from(artifact.as_ref())))
}

async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.store.delete(id)?;
    info!(generation_id = %id, "Generation evicted on request");
    Ok(StatusCode::NO_CONTENT)
}
