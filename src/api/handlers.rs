//! HTTP request handlers

use super::types::{
    ContinueRequest, ErrorResponse, IllustrationUrlResponse, ModelsResponse, StoryListResponse,
    StoryResponse, StoryView, SuccessResponse,
};
use super::AppState;
use crate::runtime::{Illustration, StoryError, StoryHandle};
use crate::story::StoryParameters;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Story lifecycle
        .route("/api/stories", get(list_stories).post(create_story))
        .route("/api/stories/:id", get(get_story).delete(delete_story))
        // Reader operations
        .route("/api/stories/:id/start", post(start_story))
        .route("/api/stories/:id/continue", post(continue_story))
        .route("/api/stories/:id/back", post(go_back))
        .route("/api/stories/:id/forward", post(go_forward))
        .route("/api/stories/:id/reset", post(reset_story))
        // Media and export
        .route(
            "/api/stories/:id/pages/:index/illustration",
            get(get_illustration),
        )
        .route("/api/stories/:id/pages/:index/narration", get(get_narration))
        .route("/api/stories/:id/export", get(export_story))
        // Model info
        .route("/api/models", get(list_models))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

async fn find_story(state: &AppState, id: &str) -> Result<StoryHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Story not found: {id}")))
}

// ============================================================
// Story Lifecycle
// ============================================================

async fn list_stories(State(state): State<AppState>) -> Json<StoryListResponse> {
    Json(StoryListResponse {
        stories: state.sessions.list().await,
    })
}

async fn create_story(State(state): State<AppState>) -> (StatusCode, Json<StoryResponse>) {
    let (_, handle) = state.sessions.create().await;
    let controller = handle.lock().await;
    (
        StatusCode::CREATED,
        Json(StoryResponse {
            story: StoryView::from_controller(&controller),
        }),
    )
}

async fn get_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoryResponse>, AppError> {
    let handle = find_story(&state, &id).await?;
    let controller = handle.lock().await;
    Ok(Json(StoryResponse {
        story: StoryView::from_controller(&controller),
    }))
}

async fn delete_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    if state.sessions.remove(&id).await {
        Ok(Json(SuccessResponse { success: true }))
    } else {
        Err(AppError::NotFound(format!("Story not found: {id}")))
    }
}

// ============================================================
// Reader Operations
// ============================================================

async fn start_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StoryParameters>, JsonRejection>,
) -> Result<Json<StoryResponse>, AppError> {
    let Json(params) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let handle = find_story(&state, &id).await?;
    let mut controller = handle.lock().await;
    controller.start_session(params).await?;
    Ok(Json(StoryResponse {
        story: StoryView::from_controller(&controller),
    }))
}

async fn continue_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ContinueRequest>, JsonRejection>,
) -> Result<Json<StoryResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let handle = find_story(&state, &id).await?;
    let mut controller = handle.lock().await;
    controller.continue_session(request.option).await?;
    Ok(Json(StoryResponse {
        story: StoryView::from_controller(&controller),
    }))
}

async fn go_back(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoryResponse>, AppError> {
    let handle = find_story(&state, &id).await?;
    let mut controller = handle.lock().await;
    controller.go_back()?;
    Ok(Json(StoryResponse {
        story: StoryView::from_controller(&controller),
    }))
}

async fn go_forward(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoryResponse>, AppError> {
    let handle = find_story(&state, &id).await?;
    let mut controller = handle.lock().await;
    controller.go_forward()?;
    Ok(Json(StoryResponse {
        story: StoryView::from_controller(&controller),
    }))
}

async fn reset_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoryResponse>, AppError> {
    let handle = find_story(&state, &id).await?;
    let mut controller = handle.lock().await;
    controller.reset();
    Ok(Json(StoryResponse {
        story: StoryView::from_controller(&controller),
    }))
}

// ============================================================
// Media and Export
// ============================================================

async fn get_illustration(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
) -> Result<Response, AppError> {
    let handle = find_story(&state, &id).await?;
    let job = handle.lock().await.illustration_job(index)?;
    let response = match job.run().await? {
        Illustration::Png(bytes) => {
            ([(header::CONTENT_TYPE, "image/png")], bytes).into_response()
        }
        Illustration::Url(url) => Json(IllustrationUrlResponse { url }).into_response(),
    };
    Ok(response)
}

async fn get_narration(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
) -> Result<Response, AppError> {
    let handle = find_story(&state, &id).await?;
    let job = handle.lock().await.narration_job(index)?;
    let audio = job.run().await?;
    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}

async fn export_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let handle = find_story(&state, &id).await?;
    let document = handle.lock().await.export_document()?;
    let disposition = format!("attachment; filename=\"{}\"", document.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, document.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}

// ============================================================
// Model Info
// ============================================================

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    // Get model metadata from registry
    let models = state.llm_registry.available_model_info();

    Json(ModelsResponse {
        models,
        default: state.llm_registry.default_model_id().to_string(),
    })
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("enchanted-reader ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    NotFound(String),
    Story(StoryError),
}

impl From<StoryError> for AppError {
    fn from(e: StoryError) -> Self {
        AppError::Story(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, kind) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "validation"),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "not_found"),
            AppError::Story(e) => {
                let status = match &e {
                    StoryError::Validation(_) => StatusCode::BAD_REQUEST,
                    StoryError::InvalidTransition(_) => StatusCode::CONFLICT,
                    StoryError::PageNotFound(_) => StatusCode::NOT_FOUND,
                    StoryError::GenerationFailure(_) => StatusCode::BAD_GATEWAY,
                    StoryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, e.to_string(), e.kind())
            }
        };

        let body = Json(ErrorResponse::new(message, kind));
        (status, body).into_response()
    }
}
