use axum::routing::{get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// ```text
/// GET  /assessments
/// GET  /stats
/// POST /assessments/{id}/reset
/// POST /assessments/{id}/skip
/// POST /assessments/{id}/regenerate
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/assessments", get(admin::list_all))
        .route("/stats", get(admin::stats))
        .route("/assessments/{id}/reset", post(admin::reset))
        .route("/assessments/{id}/skip", post(admin::skip))
        .route("/assessments/{id}/regenerate", post(admin::regenerate))
}
