//! Repository for the `assessments` table.
//!
//! Every stage transition is a single flag-gated `UPDATE`: the `WHERE`
//! clause names the flag value the transition starts from, so a repeated or
//! late call affects no rows instead of regressing state.

use blusanta_core::types::DbId;
use sqlx::{FromRow, PgPool};

use crate::models::assessment::{
    Assessment, AssessmentListQuery, AssessmentStats, PendingStitch, SubmitAssessment,
};
use crate::models::status::{FlagValue, StageFlag};

/// Column list for `assessments` queries.
const COLUMNS: &str = "\
    id, employee_code, employee_name, employee_mobile, \
    dr_code, dr_first_name, dr_last_name, dr_mobile, \
    video_language, name_pronunciation, avatar_name, \
    audio_generation, video_stitch, final_video_url, error_message, \
    is_regenerated, video_generated_on, created_at, updated_at";

/// Maximum page size for assessment listing.
const MAX_LIMIT: i64 = 200;

/// Default page size for assessment listing.
const DEFAULT_LIMIT: i64 = 50;

/// Error message written when an admin force-skips a record.
pub const SKIPPED_BY_ADMIN: &str = "Skipped by admin";

#[derive(FromRow)]
struct UpsertedRow {
    #[sqlx(flatten)]
    assessment: Assessment,
    created: bool,
}

/// Provides state-store operations for assessments.
pub struct AssessmentRepo;

impl AssessmentRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Assessment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assessments WHERE id = $1");
        sqlx::query_as::<_, Assessment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_dr_code(
        pool: &PgPool,
        dr_code: &str,
    ) -> Result<Option<Assessment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assessments WHERE dr_code = $1");
        sqlx::query_as::<_, Assessment>(&query)
            .bind(dr_code)
            .fetch_optional(pool)
            .await
    }

    /// Create or overwrite the assessment for `input.dr_code`.
    ///
    /// A resubmission keeps the id, replaces the identity fields, resets both
    /// stage flags, clears the final video and error, and moves the record to
    /// the back of the FIFO by resetting `created_at`. The two response videos
    /// are deleted and reinserted in the same transaction.
    ///
    /// Returns the row and `true` when it was newly created.
    pub async fn upsert_submission(
        pool: &PgPool,
        avatar_name: &str,
        input: &SubmitAssessment,
    ) -> Result<(Assessment, bool), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO assessments \
                (employee_code, employee_name, employee_mobile, dr_code, dr_first_name, \
                 dr_last_name, dr_mobile, video_language, name_pronunciation, avatar_name) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (dr_code) DO UPDATE SET \
                employee_code = EXCLUDED.employee_code, \
                employee_name = EXCLUDED.employee_name, \
                employee_mobile = EXCLUDED.employee_mobile, \
                dr_first_name = EXCLUDED.dr_first_name, \
                dr_last_name = EXCLUDED.dr_last_name, \
                dr_mobile = EXCLUDED.dr_mobile, \
                video_language = EXCLUDED.video_language, \
                name_pronunciation = EXCLUDED.name_pronunciation, \
                avatar_name = EXCLUDED.avatar_name, \
                audio_generation = $11, \
                video_stitch = $11, \
                final_video_url = NULL, \
                error_message = NULL, \
                created_at = NOW(), \
                updated_at = NOW() \
             RETURNING {COLUMNS}, (xmax = 0) AS created"
        );
        let row = sqlx::query_as::<_, UpsertedRow>(&query)
            .bind(&input.employee_code)
            .bind(&input.employee_name)
            .bind(&input.employee_mobile)
            .bind(&input.dr_code)
            .bind(&input.dr_first_name)
            .bind(&input.dr_last_name)
            .bind(&input.dr_mobile)
            .bind(&input.video_language)
            .bind(&input.name_pronunciation)
            .bind(avatar_name)
            .bind(StageFlag::Pending.id())
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM response_videos WHERE assessment_id = $1")
            .bind(row.assessment.id)
            .execute(&mut *tx)
            .await?;

        for (key, url) in &input.videos {
            sqlx::query(
                "INSERT INTO response_videos (assessment_id, video_key, video_url) \
                 VALUES ($1, $2, $3)",
            )
            .bind(row.assessment.id)
            .bind(key)
            .bind(url)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok((row.assessment, row.created))
    }

    /// List assessments newest first, optionally filtered on `video_stitch`.
    pub async fn list(
        pool: &PgPool,
        stitch_flag: Option<StageFlag>,
        params: &AssessmentListQuery,
    ) -> Result<Vec<Assessment>, sqlx::Error> {
        let limit = clamp_limit(params.limit);
        let offset = clamp_offset(params.offset);
        let query = format!(
            "SELECT {COLUMNS} FROM assessments \
             WHERE ($1::SMALLINT IS NULL OR video_stitch = $1) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(stitch_flag.map(StageFlag::id))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Every assessment, newest first (admin view).
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Assessment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assessments ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Assessment>(&query).fetch_all(pool).await
    }

    /// Records awaiting audio for a campaign, oldest first.
    pub async fn list_pending_audio(
        pool: &PgPool,
        avatar_name: &str,
        language: Option<&str>,
    ) -> Result<Vec<Assessment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assessments \
             WHERE audio_generation = $1 AND avatar_name = $2 \
               AND ($3::TEXT IS NULL OR video_language = $3) \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(StageFlag::Pending.id())
            .bind(avatar_name)
            .bind(language)
            .fetch_all(pool)
            .await
    }

    /// Records with audio done and stitching pending, joined with both
    /// response videos, oldest first.
    pub async fn list_pending_stitch(
        pool: &PgPool,
        avatar_name: &str,
        language: Option<&str>,
    ) -> Result<Vec<PendingStitch>, sqlx::Error> {
        sqlx::query_as::<_, PendingStitch>(
            "SELECT a.id, a.employee_code, a.dr_code, a.dr_first_name, a.dr_last_name, \
                    a.video_language, a.created_at, \
                    MAX(v.video_url) FILTER (WHERE v.video_key = 'video1') AS video1_url, \
                    MAX(v.video_url) FILTER (WHERE v.video_key = 'video2') AS video2_url \
             FROM assessments a \
             LEFT JOIN response_videos v ON v.assessment_id = a.id \
             WHERE a.video_stitch = $1 AND a.audio_generation = $2 AND a.avatar_name = $3 \
               AND ($4::TEXT IS NULL OR a.video_language = $4) \
             GROUP BY a.id \
             ORDER BY a.created_at ASC, a.id ASC",
        )
        .bind(StageFlag::Pending.id())
        .bind(StageFlag::Done.id())
        .bind(avatar_name)
        .bind(language)
        .fetch_all(pool)
        .await
    }

    pub async fn count_pending_audio(pool: &PgPool, avatar_name: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM assessments WHERE audio_generation = $1 AND avatar_name = $2",
        )
        .bind(StageFlag::Pending.id())
        .bind(avatar_name)
        .fetch_one(pool)
        .await
    }

    pub async fn count_pending_stitch(pool: &PgPool, avatar_name: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM assessments \
             WHERE video_stitch = $1 AND audio_generation = $2 AND avatar_name = $3",
        )
        .bind(StageFlag::Pending.id())
        .bind(StageFlag::Done.id())
        .bind(avatar_name)
        .fetch_one(pool)
        .await
    }

    /// Audio 0 -> 1. Returns `false` if the record was not pending audio.
    pub async fn mark_audio_done(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE assessments \
             SET audio_generation = $2, error_message = NULL, updated_at = NOW() \
             WHERE id = $1 AND audio_generation = $3",
        )
        .bind(id)
        .bind(StageFlag::Done.id())
        .bind(StageFlag::Pending.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Audio 0 -> -1 with an error message.
    pub async fn mark_audio_failed(
        pool: &PgPool,
        id: DbId,
        error_message: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE assessments \
             SET audio_generation = $2, error_message = $3, updated_at = NOW() \
             WHERE id = $1 AND audio_generation = $4",
        )
        .bind(id)
        .bind(StageFlag::Failed.id())
        .bind(error_message)
        .bind(StageFlag::Pending.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stitch 0 -> -1 with an error message.
    pub async fn mark_stitch_failed(
        pool: &PgPool,
        id: DbId,
        error_message: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE assessments \
             SET video_stitch = $2, error_message = $3, updated_at = NOW() \
             WHERE id = $1 AND video_stitch = $4",
        )
        .bind(id)
        .bind(StageFlag::Failed.id())
        .bind(error_message)
        .bind(StageFlag::Pending.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Webhook write: final URL, stitch = 1 and completion time together.
    ///
    /// Only applies when audio is done and the stitch is pending or already
    /// done (a repeated webhook is idempotent). Returns `None` otherwise.
    pub async fn complete_stitch(
        pool: &PgPool,
        id: DbId,
        final_video_url: &str,
        generated_on: &str,
    ) -> Result<Option<Assessment>, sqlx::Error> {
        let query = format!(
            "UPDATE assessments \
             SET final_video_url = $2, video_stitch = $3, video_generated_on = $4, \
                 error_message = NULL, updated_at = NOW() \
             WHERE id = $1 AND audio_generation = $3 AND video_stitch IN ($5, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(id)
            .bind(final_video_url)
            .bind(StageFlag::Done.id())
            .bind(generated_on)
            .bind(StageFlag::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Current `video_stitch` value, polled by the dispatch loop.
    pub async fn stitch_flag(pool: &PgPool, id: DbId) -> Result<Option<FlagValue>, sqlx::Error> {
        sqlx::query_scalar("SELECT video_stitch FROM assessments WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Return both flags to pending and clear every stage output.
    pub async fn reset(pool: &PgPool, id: DbId) -> Result<Option<Assessment>, sqlx::Error> {
        let query = format!(
            "UPDATE assessments \
             SET audio_generation = $2, video_stitch = $2, final_video_url = NULL, \
                 error_message = NULL, is_regenerated = FALSE, video_generated_on = NULL, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(id)
            .bind(StageFlag::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Reset for another pass with a (possibly new) pronunciation and mark
    /// the record as regenerated.
    pub async fn regenerate(
        pool: &PgPool,
        id: DbId,
        name_pronunciation: &str,
    ) -> Result<Option<Assessment>, sqlx::Error> {
        let query = format!(
            "UPDATE assessments \
             SET audio_generation = $2, video_stitch = $2, final_video_url = NULL, \
                 error_message = NULL, is_regenerated = TRUE, video_generated_on = NULL, \
                 name_pronunciation = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(id)
            .bind(StageFlag::Pending.id())
            .bind(name_pronunciation)
            .fetch_optional(pool)
            .await
    }

    /// Take the record out of both stages.
    pub async fn skip(pool: &PgPool, id: DbId) -> Result<Option<Assessment>, sqlx::Error> {
        let query = format!(
            "UPDATE assessments \
             SET audio_generation = $2, video_stitch = $2, final_video_url = NULL, \
                 error_message = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(id)
            .bind(StageFlag::Failed.id())
            .bind(SKIPPED_BY_ADMIN)
            .fetch_optional(pool)
            .await
    }

    pub async fn stats(pool: &PgPool) -> Result<AssessmentStats, sqlx::Error> {
        sqlx::query_as::<_, AssessmentStats>(
            "SELECT COUNT(*) AS total, \
                    COUNT(*) FILTER (WHERE audio_generation = $1) AS pending_audio, \
                    COUNT(*) FILTER (WHERE audio_generation = $2 AND video_stitch = $1) AS pending_stitch, \
                    COUNT(*) FILTER (WHERE video_stitch = $2) AS completed, \
                    COUNT(*) FILTER (WHERE audio_generation = $3 OR video_stitch = $3) AS failed \
             FROM assessments",
        )
        .bind(StageFlag::Pending.id())
        .bind(StageFlag::Done.id())
        .bind(StageFlag::Failed.id())
        .fetch_one(pool)
        .await
    }
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
