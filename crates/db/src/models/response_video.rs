//! Doctor response clips attached to an assessment.

use std::collections::BTreeMap;

use blusanta_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `response_videos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResponseVideo {
    pub id: DbId,
    pub assessment_id: DbId,
    pub video_key: String,
    pub video_url: String,
    pub created_at: Timestamp,
}

/// Collapse rows into a `video_key -> video_url` map.
pub fn videos_by_key(videos: Vec<ResponseVideo>) -> BTreeMap<String, String> {
    videos
        .into_iter()
        .map(|v| (v.video_key, v.video_url))
        .collect()
}
