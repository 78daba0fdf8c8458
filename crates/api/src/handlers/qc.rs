//! QC reviewer verdicts posted from the review sheet.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use blusanta_core::error::CoreError;
use blusanta_core::qc::{regeneration_pronunciation, require_reupload_reason, QcVerdict};
use blusanta_db::repositories::AssessmentRepo;
use blusanta_events::payloads::{QcApproved, Regenerated, ReuploadRequested};
use blusanta_events::{PipelineEvent, Recipient};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::query::flexible_id;
use crate::response::MessageResponse;
use crate::state::AppState;

/// Body of `POST /api/blusanta/qc-approved-wa`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QcDecision {
    #[serde(rename = "_id")]
    pub id: Option<Value>,
    pub video_url: Option<String>,
    pub status: Option<String>,
    pub hindi_pronunciation: Option<String>,
    pub reason_for_reupload: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// POST /api/blusanta/qc-approved-wa
///
/// - `Approved`: WhatsApp the employee the final video.
/// - `Regenerate`: reset both stages with the override pronunciation, or the
///   stored one when none is given.
/// - `Re-upload`: WhatsApp the employee the reviewer's reason.
pub async fn qc_decision(
    State(state): State<AppState>,
    Json(input): Json<QcDecision>,
) -> AppResult<impl IntoResponse> {
    let id = flexible_id(input.id.as_ref());
    let (Some(id), Some(video_url), Some(status)) =
        (id, present(input.video_url), present(input.status))
    else {
        return Err(AppError::BadRequest(
            "Missing required fields: _id, video_url, or status".into(),
        ));
    };
    let verdict = QcVerdict::parse(&status)?;
    tracing::info!(assessment_id = id, status = %status, "QC decision received");

    let assessment = AssessmentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Assessment",
            id,
        }))?;
    let recipient = Recipient::from(&assessment);

    let message = match verdict {
        QcVerdict::Approved => {
            state.notifier.video_ready(&recipient, &video_url).await?;
            state.event_bus.publish(
                PipelineEvent::from_payload(&QcApproved { video_url }).with_assessment(id),
            );
            format!("Video approved. WhatsApp sent to {}", recipient.employee_name)
        }
        QcVerdict::Regenerate => {
            let pronunciation = regeneration_pronunciation(
                input.hindi_pronunciation.as_deref(),
                assessment.name_pronunciation.as_deref(),
            )?;
            AssessmentRepo::regenerate(&state.pool, id, &pronunciation)
                .await?
                .ok_or(AppError::Core(CoreError::NotFound {
                    entity: "Assessment",
                    id,
                }))?;
            state.event_bus.publish(
                PipelineEvent::from_payload(&Regenerated {
                    name_pronunciation: pronunciation.clone(),
                })
                .with_assessment(id),
            );
            tracing::info!(assessment_id = id, pronunciation = %pronunciation, "Marked for regeneration");
            format!("Video marked for regeneration with pronunciation: {pronunciation}")
        }
        QcVerdict::Reupload => {
            let reason = require_reupload_reason(input.reason_for_reupload.as_deref())?;
            state.notifier.reupload_request(&recipient, &reason).await?;
            state.event_bus.publish(
                PipelineEvent::from_payload(&ReuploadRequested { reason }).with_assessment(id),
            );
            format!("Re-upload notification sent to {}", recipient.employee_name)
        }
    };

    Ok(Json(MessageResponse::message(message)))
}
