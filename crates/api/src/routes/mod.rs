pub mod admin;
pub mod assessments;
pub mod generation;
pub mod health;
pub mod storage;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /submit-assessment                           submit (POST)
/// /assessment/{id}                             get with videos
/// /assessments                                 list (?status=&limit=&offset=)
///
/// /blusanta/initiate-audio-generation          trigger audio stage (POST)
/// /blusanta/initiate-video-stitching           trigger stitching loop (POST)
/// /blusanta/update-after-stitching             completion webhook (POST)
/// /blusanta/qc-approved-wa                     QC verdict (POST)
/// /blusanta/retry-pending-assessments          re-trigger both stages (POST)
///
/// /admin/assessments                           all records
/// /admin/stats                                 pipeline counters
/// /admin/assessments/{id}/reset                reset flags (POST)
/// /admin/assessments/{id}/skip                 mark both stages failed (POST)
/// /admin/assessments/{id}/regenerate           regenerate (POST)
///
/// /get-signed-url                              signed upload URL (POST)
/// /check-file-exists                           existence check (POST)
/// /get-file-metadata                           object metadata (POST)
/// /storage/{signed-url,file-exists,file-metadata}  aliases of the above
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(assessments::router())
        .merge(storage::router())
        .nest("/blusanta", generation::router())
        .nest("/admin", admin::router())
        .nest("/storage", storage::aliases())
}
