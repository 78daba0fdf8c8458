//! Repository for the `response_videos` table.
//!
//! Rows are written only by [`AssessmentRepo::upsert_submission`](super::AssessmentRepo::upsert_submission).

use blusanta_core::types::DbId;
use sqlx::PgPool;

use crate::models::response_video::ResponseVideo;

const COLUMNS: &str = "id, assessment_id, video_key, video_url, created_at";

pub struct ResponseVideoRepo;

impl ResponseVideoRepo {
    /// Videos of one assessment ordered by key (`video1`, `video2`).
    pub async fn list_for_assessment(
        pool: &PgPool,
        assessment_id: DbId,
    ) -> Result<Vec<ResponseVideo>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM response_videos WHERE assessment_id = $1 ORDER BY video_key"
        );
        sqlx::query_as::<_, ResponseVideo>(&query)
            .bind(assessment_id)
            .fetch_all(pool)
            .await
    }
}
