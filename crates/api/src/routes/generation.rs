//! Pipeline trigger, webhook and QC routes, mounted at `/api/blusanta`.

use axum::routing::post;
use axum::Router;

use crate::handlers::{generation, qc};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/initiate-audio-generation",
            post(generation::initiate_audio_generation),
        )
        .route(
            "/initiate-video-stitching",
            post(generation::initiate_video_stitching),
        )
        .route(
            "/update-after-stitching",
            post(generation::update_after_stitching),
        )
        .route("/qc-approved-wa", post(qc::qc_decision))
        .route(
            "/retry-pending-assessments",
            post(generation::retry_pending_assessments),
        )
}
