//! The persisted state the stages read and write.

use async_trait::async_trait;
use blusanta_core::language::VideoLanguage;
use blusanta_core::types::DbId;
use blusanta_db::models::assessment::{Assessment, PendingStitch};
use blusanta_db::models::status::StageFlag;
use blusanta_db::repositories::AssessmentRepo;
use blusanta_db::DbPool;

/// Stage-facing view of the assessment store, scoped to one campaign.
///
/// Transition methods are flag-gated and return whether a row changed.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    /// Records with audio pending, oldest first.
    async fn pending_audio(
        &self,
        language: Option<VideoLanguage>,
    ) -> Result<Vec<Assessment>, sqlx::Error>;

    /// Records with audio done and stitching pending, oldest first.
    async fn pending_stitch(
        &self,
        language: Option<VideoLanguage>,
    ) -> Result<Vec<PendingStitch>, sqlx::Error>;

    async fn count_pending_audio(&self) -> Result<i64, sqlx::Error>;

    async fn count_pending_stitch(&self) -> Result<i64, sqlx::Error>;

    async fn mark_audio_done(&self, id: DbId) -> Result<bool, sqlx::Error>;

    async fn mark_audio_failed(&self, id: DbId, message: &str) -> Result<bool, sqlx::Error>;

    async fn mark_stitch_failed(&self, id: DbId, message: &str) -> Result<bool, sqlx::Error>;

    /// Current stitch flag, `None` when the record no longer exists.
    async fn stitch_state(&self, id: DbId) -> Result<Option<StageFlag>, sqlx::Error>;
}

/// [`AssessmentStore`] over Postgres.
pub struct PgAssessmentStore {
    pool: DbPool,
    avatar_name: String,
}

impl PgAssessmentStore {
    pub fn new(pool: DbPool, avatar_name: impl Into<String>) -> Self {
        Self {
            pool,
            avatar_name: avatar_name.into(),
        }
    }
}

#[async_trait]
impl AssessmentStore for PgAssessmentStore {
    async fn pending_audio(
        &self,
        language: Option<VideoLanguage>,
    ) -> Result<Vec<Assessment>, sqlx::Error> {
        AssessmentRepo::list_pending_audio(
            &self.pool,
            &self.avatar_name,
            language.map(VideoLanguage::label),
        )
        .await
    }

    async fn pending_stitch(
        &self,
        language: Option<VideoLanguage>,
    ) -> Result<Vec<PendingStitch>, sqlx::Error> {
        AssessmentRepo::list_pending_stitch(
            &self.pool,
            &self.avatar_name,
            language.map(VideoLanguage::label),
        )
        .await
    }

    async fn count_pending_audio(&self) -> Result<i64, sqlx::Error> {
        AssessmentRepo::count_pending_audio(&self.pool, &self.avatar_name).await
    }

    async fn count_pending_stitch(&self) -> Result<i64, sqlx::Error> {
        AssessmentRepo::count_pending_stitch(&self.pool, &self.avatar_name).await
    }

    async fn mark_audio_done(&self, id: DbId) -> Result<bool, sqlx::Error> {
        AssessmentRepo::mark_audio_done(&self.pool, id).await
    }

    async fn mark_audio_failed(&self, id: DbId, message: &str) -> Result<bool, sqlx::Error> {
        AssessmentRepo::mark_audio_failed(&self.pool, id, message).await
    }

    async fn mark_stitch_failed(&self, id: DbId, message: &str) -> Result<bool, sqlx::Error> {
        AssessmentRepo::mark_stitch_failed(&self.pool, id, message).await
    }

    async fn stitch_state(&self, id: DbId) -> Result<Option<StageFlag>, sqlx::Error> {
        Ok(AssessmentRepo::stitch_flag(&self.pool, id)
            .await?
            .and_then(StageFlag::from_value))
    }
}
