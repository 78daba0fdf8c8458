//! Operator endpoints for inspecting and correcting records.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use blusanta_core::error::CoreError;
use blusanta_core::qc::regeneration_pronunciation;
use blusanta_core::types::DbId;
use blusanta_db::models::assessment::Assessment;
use blusanta_db::repositories::AssessmentRepo;
use blusanta_events::payloads::Regenerated;
use blusanta_events::PipelineEvent;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

fn found(id: DbId, row: Option<Assessment>) -> AppResult<Assessment> {
    row.ok_or(AppError::Core(CoreError::NotFound {
        entity: "Assessment",
        id,
    }))
}

/// GET /api/admin/assessments
pub async fn list_all(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let assessments = AssessmentRepo::list_all(&state.pool).await?;
    Ok(Json(DataResponse { data: assessments }))
}

/// GET /api/admin/stats
pub async fn stats(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let stats = AssessmentRepo::stats(&state.pool).await?;
    Ok(Json(DataResponse { data: stats }))
}

/// POST /api/admin/assessments/{id}/reset
///
/// Both flags back to pending; final video and error cleared.
pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let assessment = found(id, AssessmentRepo::reset(&state.pool, id).await?)?;
    tracing::info!(assessment_id = id, "Assessment reset by admin");
    Ok(Json(DataResponse { data: assessment }))
}

/// POST /api/admin/assessments/{id}/skip
pub async fn skip(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let assessment = found(id, AssessmentRepo::skip(&state.pool, id).await?)?;
    tracing::info!(assessment_id = id, "Assessment skipped by admin");
    Ok(Json(DataResponse { data: assessment }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegenerateRequest {
    pub name_pronunciation: Option<String>,
}

/// POST /api/admin/assessments/{id}/regenerate
///
/// Body: optional `{ "name_pronunciation": "..." }`.
pub async fn regenerate(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<RegenerateRequest>>,
) -> AppResult<impl IntoResponse> {
    let input = body.map(|Json(b)| b).unwrap_or_default();
    let existing = found(id, AssessmentRepo::find_by_id(&state.pool, id).await?)?;

    let pronunciation = regeneration_pronunciation(
        input.name_pronunciation.as_deref(),
        existing.name_pronunciation.as_deref(),
    )?;
    let assessment = found(
        id,
        AssessmentRepo::regenerate(&state.pool, id, &pronunciation).await?,
    )?;

    state.event_bus.publish(
        PipelineEvent::from_payload(&Regenerated {
            name_pronunciation: pronunciation,
        })
        .with_assessment(id),
    );
    tracing::info!(assessment_id = id, "Assessment regenerated by admin");
    Ok(Json(DataResponse { data: assessment }))
}
