use axum::routing::post;
use axum::Router;

use crate::handlers::storage;
use crate::state::AppState;

/// Paths the upload form calls, merged at the `/api` root.
///
/// ```text
/// POST /get-signed-url
/// POST /check-file-exists
/// POST /get-file-metadata
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/get-signed-url", post(storage::signed_url))
        .route("/check-file-exists", post(storage::file_exists))
        .route("/get-file-metadata", post(storage::file_metadata))
}

/// Same handlers under `/api/storage`.
///
/// ```text
/// POST /signed-url
/// POST /file-exists
/// POST /file-metadata
/// ```
pub fn aliases() -> Router<AppState> {
    Router::new()
        .route("/signed-url", post(storage::signed_url))
        .route("/file-exists", post(storage::file_exists))
        .route("/file-metadata", post(storage::file_metadata))
}
