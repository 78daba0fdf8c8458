//! Stage triggers, the stitching completion webhook and the retry backstop.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use blusanta_core::timestamps::format_completion_time;
use blusanta_core::types::DbId;
use blusanta_db::repositories::AssessmentRepo;
use blusanta_events::payloads::StitchCompleted;
use blusanta_events::PipelineEvent;
use blusanta_pipeline::{AudioTrigger, StitchTrigger};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::query::{flexible_id, LanguageFilter};
use crate::response::MessageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Stage triggers
// ---------------------------------------------------------------------------

/// POST /api/blusanta/initiate-audio-generation
///
/// Body: optional `{ "language": "English" | "Hindi" }`.
pub async fn initiate_audio_generation(
    State(state): State<AppState>,
    body: Option<Json<LanguageFilter>>,
) -> AppResult<impl IntoResponse> {
    let language = body.map(|Json(b)| b).unwrap_or_default().parse()?;

    let response = match state.pipeline.audio.trigger(language).await? {
        AudioTrigger::Started { pending } => MessageResponse::new(
            format!("Processing {pending} assessments for audio generation."),
            json!({ "pending": pending }),
        ),
        AudioTrigger::AlreadyRunning => {
            MessageResponse::new("Audio generation already in progress", json!({}))
        }
        AudioTrigger::NoPending => MessageResponse::new("No pending assessments.", json!({})),
    };
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct QueueStatus {
    queue_active: bool,
    current_assessment: Option<DbId>,
}

/// POST /api/blusanta/initiate-video-stitching
///
/// Body: optional `{ "language": "English" | "Hindi" }`.
pub async fn initiate_video_stitching(
    State(state): State<AppState>,
    body: Option<Json<LanguageFilter>>,
) -> AppResult<impl IntoResponse> {
    let language = body.map(|Json(b)| b).unwrap_or_default().parse()?;

    let response = match state.pipeline.stitching.trigger(language) {
        StitchTrigger::Started => MessageResponse::new(
            "Video stitching initiated, processing in background.",
            QueueStatus {
                queue_active: true,
                current_assessment: None,
            },
        ),
        StitchTrigger::AlreadyActive { current } => MessageResponse::new(
            "Stitching queue already active",
            QueueStatus {
                queue_active: true,
                current_assessment: current,
            },
        ),
    };
    Ok(Json(response))
}

/// POST /api/blusanta/retry-pending-assessments
///
/// Counts pending work and triggers each stage that has some.
pub async fn retry_pending_assessments(
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let counts = state.pipeline.retry_pending().await?;
    Ok(Json(MessageResponse::new("Retry process initiated", counts)))
}

// ---------------------------------------------------------------------------
// Completion webhook
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct CompletionNotice {
    #[serde(default)]
    pub additional_data: CompletionFields,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompletionFields {
    pub id: Option<Value>,
    pub final_video_url: Option<String>,
}

/// POST /api/blusanta/update-after-stitching
///
/// Acknowledges immediately; the record update and sheet sync happen in the
/// background so the stitching host is never held up.
pub async fn update_after_stitching(
    State(state): State<AppState>,
    Json(notice): Json<CompletionNotice>,
) -> AppResult<impl IntoResponse> {
    let fields = notice.additional_data;
    let id = flexible_id(fields.id.as_ref());
    let final_video_url = fields
        .final_video_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    let (Some(id), Some(final_video_url)) = (id, final_video_url) else {
        return Err(AppError::BadRequest(
            "Missing required fields: id or final_video_url".into(),
        ));
    };
    tracing::info!(assessment_id = id, final_video_url = %final_video_url, "Stitching completion received");

    tokio::spawn(async move {
        record_completion(state, id, final_video_url).await;
    });

    Ok(Json(MessageResponse::message("Stitching completion acknowledged")))
}

async fn record_completion(state: AppState, id: DbId, final_video_url: String) {
    let generated_on = format_completion_time(chrono::Utc::now());

    match AssessmentRepo::complete_stitch(&state.pool, id, &final_video_url, &generated_on).await {
        Ok(Some(assessment)) => {
            tracing::info!(assessment_id = id, generated_on = %generated_on, "Stitching recorded");
            let completed = StitchCompleted {
                final_video_url,
                video_generated_on: generated_on,
                is_regenerated: assessment.is_regenerated,
            };
            state
                .event_bus
                .publish(PipelineEvent::from_payload(&completed).with_assessment(id));
        }
        Ok(None) => {
            tracing::warn!(
                assessment_id = id,
                "Ignoring completion for an assessment that is missing, not voiced, or already failed"
            );
        }
        Err(e) => {
            tracing::error!(assessment_id = id, error = %e, "Failed to record stitching completion");
        }
    }
}
