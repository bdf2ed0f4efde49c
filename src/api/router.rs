//! Route table and handlers.
//!
//! Uploads are spooled to a temp file and the blocking assessment runs
//! on the blocking thread pool; the async side only does multipart
//! plumbing.

use std::io::Write as _;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::api::error::ApiError;
use crate::report::AssessmentReport;
use crate::service::{AssessmentService, Domain};

#[derive(Clone)]
struct AppState {
    service: Arc<AssessmentService>,
}

/// Build the application router.
pub fn app_router(service: Arc<AssessmentService>, max_upload_bytes: usize) -> Router {
    let state = AppState { service };
    Router::new()
        .route("/health", get(health))
        .route("/analyze/vehicle", post(analyze_vehicle))
        .route("/analyze/ergonomics", post(analyze_ergonomics))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn analyze_vehicle(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AssessmentReport>, ApiError> {
    analyze(state, Domain::VehicleDamage, multipart).await
}

async fn analyze_ergonomics(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AssessmentReport>, ApiError> {
    analyze(state, Domain::Ergonomics, multipart).await
}

async fn analyze(
    state: AppState,
    domain: Domain,
    mut multipart: Multipart,
) -> Result<Json<AssessmentReport>, ApiError> {
    let mut image_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidImage(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("image") {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::InvalidImage(format!("Failed to read upload: {e}")))?;
            image_bytes = Some(data.to_vec());
            break;
        }
    }

    let bytes = image_bytes.ok_or(ApiError::MissingImage)?;
    if bytes.is_empty() {
        return Err(ApiError::InvalidImage("Uploaded image is empty".into()));
    }

    let service = state.service.clone();
    let report = tokio::task::spawn_blocking(move || {
        let mut tmp = tempfile::NamedTempFile::new().map_err(crate::image_prep::PrepError::Read)?;
        tmp.write_all(&bytes).map_err(crate::image_prep::PrepError::Read)?;
        service.analyze(domain, tmp.path())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("assessment task panicked: {e}")))??;

    Ok(Json(report))
}
