//! Submission and read handlers for assessments.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use blusanta_cloud::storage::url_exists;
use blusanta_core::error::CoreError;
use blusanta_core::language::VideoLanguage;
use blusanta_core::submission::{
    require_field, require_pronunciation, validate_videos, VIDEO_KEYS,
};
use blusanta_core::types::DbId;
use blusanta_db::models::assessment::{
    AssessmentListQuery, AssessmentWithVideos, SubmitAssessment,
};
use blusanta_db::models::response_video::videos_by_key;
use blusanta_db::models::status::AssessmentStatus;
use blusanta_db::repositories::{AssessmentRepo, ResponseVideoRepo};
use blusanta_events::payloads::{submission_sheet_row, Submitted, UploadRejected};
use blusanta_events::{PipelineEvent, Recipient};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Response to an accepted submission.
#[derive(Debug, Serialize)]
pub struct SubmissionAccepted {
    pub assessment_id: DbId,
    /// `false` when an existing record for the doctor was overwritten.
    pub created: bool,
    pub message: &'static str,
}

/// POST /api/submit-assessment
///
/// Validate the upload, upsert the record by doctor code and start audio
/// generation for its language in the background.
pub async fn submit_assessment(
    State(state): State<AppState>,
    Json(input): Json<SubmitAssessment>,
) -> AppResult<impl IntoResponse> {
    let mut input = input.trimmed();
    tracing::info!(
        employee_code = %input.employee_code,
        dr_code = %input.dr_code,
        language = %input.video_language,
        "Received assessment submission"
    );

    if let Err(e) = validate_videos(&input.videos) {
        reject_upload(&state, &input, &e);
        return Err(e.into());
    }
    require_pronunciation(&input.name_pronunciation)?;
    let language = VideoLanguage::parse(&input.video_language)?;
    require_field("drCode", &input.dr_code)?;
    input.video_language = language.label().to_string();

    for key in VIDEO_KEYS {
        let url = input.videos.get(key).cloned().unwrap_or_default();
        if !url_exists(state.storage.as_ref(), &url).await? {
            let err = CoreError::Validation(format!(
                "Video for key \"{key}\" not found in storage: {url}"
            ));
            reject_upload(&state, &input, &err);
            return Err(err.into());
        }
    }

    let (assessment, created) =
        AssessmentRepo::upsert_submission(&state.pool, &state.campaign.avatar_name, &input)
            .await?;
    tracing::info!(assessment_id = assessment.id, created, "Assessment saved");

    let submitted = Submitted {
        recipient: Recipient::from(&assessment),
        sheet_row: submission_sheet_row(&assessment, &input.videos, chrono::Utc::now()),
        created,
    };
    state
        .event_bus
        .publish(PipelineEvent::from_payload(&submitted).with_assessment(assessment.id));

    let pipeline = Arc::clone(&state.pipeline);
    let assessment_id = assessment.id;
    tokio::spawn(async move {
        match pipeline.audio.trigger(Some(language)).await {
            Ok(outcome) => tracing::info!(assessment_id, ?outcome, "Audio generation triggered"),
            Err(e) => tracing::error!(assessment_id, error = %e, "Failed to trigger audio generation"),
        }
    });

    Ok(Json(SubmissionAccepted {
        assessment_id: assessment.id,
        created,
        message: "Assessment submitted successfully",
    }))
}

/// Publish the upload-failure notice for a rejected submission.
fn reject_upload(state: &AppState, input: &SubmitAssessment, reason: &CoreError) {
    tracing::warn!(dr_code = %input.dr_code, reason = %reason, "Submission rejected");
    let rejected = UploadRejected {
        recipient: Recipient::from(input),
        reason: reason.to_string(),
    };
    state.event_bus.publish(PipelineEvent::from_payload(&rejected));
}

/// GET /api/assessment/{id}
pub async fn get_assessment(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let assessment = AssessmentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Assessment",
            id,
        }))?;
    let videos = ResponseVideoRepo::list_for_assessment(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: AssessmentWithVideos {
            assessment,
            videos: videos_by_key(videos),
        },
    }))
}

/// GET /api/assessments?status=&limit=&offset=
pub async fn list_assessments(
    State(state): State<AppState>,
    Query(params): Query<AssessmentListQuery>,
) -> AppResult<impl IntoResponse> {
    let stitch_flag = params
        .status
        .as_deref()
        .map(AssessmentStatus::parse)
        .transpose()?
        .map(AssessmentStatus::stitch_flag);

    let assessments = AssessmentRepo::list(&state.pool, stitch_flag, &params).await?;
    Ok(Json(DataResponse { data: assessments }))
}
