use axum::routing::{get, post};
use axum::Router;

use crate::handlers::assessments;
use crate::state::AppState;

/// ```text
/// POST /submit-assessment
/// GET  /assessment/{id}
/// GET  /assessments
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submit-assessment", post(assessments::submit_assessment))
        .route("/assessment/{id}", get(assessments::get_assessment))
        .route("/assessments", get(assessments::list_assessments))
}
