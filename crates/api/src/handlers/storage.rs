//! Upload helpers for the submission form.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use blusanta_cloud::storage::SIGNED_URL_TTL;
use blusanta_core::storage_paths::{gs_url, public_url};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

// Bodies and responses use the upload form's camelCase names; snake_case
// is still accepted on input.

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SignedUrlRequest {
    #[serde(alias = "file_name")]
    #[validate(length(min = 1, message = "fileName is required"))]
    pub file_name: String,
    #[serde(alias = "file_type")]
    #[validate(length(min = 1, message = "fileType is required"))]
    pub file_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrl {
    /// The signed `PUT` URL.
    pub url: String,
    /// Where the object will be readable once uploaded.
    pub public_url: String,
    pub gcs_url: String,
    pub expires_in_secs: u64,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct FileRequest {
    #[serde(alias = "file_name")]
    #[validate(length(min = 1, message = "fileName is required"))]
    pub file_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileExists {
    pub file_name: String,
    pub exists: bool,
}

/// POST /api/get-signed-url
///
/// A V4 signed `PUT` URL for uploading `fileName` into the campaign bucket.
pub async fn signed_url(
    State(state): State<AppState>,
    Json(input): Json<SignedUrlRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let bucket = &state.campaign.bucket;

    let url = state
        .storage
        .signed_upload_url(bucket, &input.file_name, &input.file_type, SIGNED_URL_TTL)
        .await?;
    tracing::info!(file_name = %input.file_name, "Issued signed upload URL");

    Ok(Json(SignedUrl {
        url,
        public_url: public_url(bucket, &input.file_name),
        gcs_url: gs_url(bucket, &input.file_name),
        expires_in_secs: SIGNED_URL_TTL.as_secs(),
    }))
}

/// POST /api/check-file-exists
pub async fn file_exists(
    State(state): State<AppState>,
    Json(input): Json<FileRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let exists = state
        .storage
        .exists(&state.campaign.bucket, &input.file_name)
        .await?;
    Ok(Json(FileExists {
        file_name: input.file_name,
        exists,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub updated: Option<String>,
}

/// POST /api/get-file-metadata
pub async fn file_metadata(
    State(state): State<AppState>,
    Json(input): Json<FileRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let metadata = state
        .storage
        .metadata(&state.campaign.bucket, &input.file_name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File not found: {}", input.file_name)))?;
    Ok(Json(FileMetadata {
        name: metadata.name,
        size: metadata.size,
        content_type: metadata.content_type,
        updated: metadata.updated,
    }))
}
