//! Assessment entity models and DTOs.

use std::collections::BTreeMap;

use blusanta_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::{FlagValue, StageFlag};

/// A row from the `assessments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Assessment {
    pub id: DbId,
    pub employee_code: String,
    pub employee_name: String,
    pub employee_mobile: String,
    pub dr_code: String,
    pub dr_first_name: String,
    pub dr_last_name: String,
    pub dr_mobile: String,
    pub video_language: String,
    pub name_pronunciation: Option<String>,
    pub avatar_name: String,
    pub audio_generation: FlagValue,
    pub video_stitch: FlagValue,
    pub final_video_url: Option<String>,
    pub error_message: Option<String>,
    pub is_regenerated: bool,
    pub video_generated_on: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Assessment {
    pub fn audio_flag(&self) -> Option<StageFlag> {
        StageFlag::from_value(self.audio_generation)
    }

    pub fn stitch_flag(&self) -> Option<StageFlag> {
        StageFlag::from_value(self.video_stitch)
    }

    /// `"first last"` as used in notification templates.
    pub fn doctor_full_name(&self) -> String {
        format!("{} {}", self.dr_first_name, self.dr_last_name)
            .trim()
            .to_string()
    }
}

/// An assessment with its response videos keyed by `video_key`.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentWithVideos {
    #[serde(flatten)]
    pub assessment: Assessment,
    pub videos: BTreeMap<String, String>,
}

/// Body of `POST /api/submit-assessment`.
///
/// Field names follow the upload form. Every field defaults to empty so that
/// missing values surface as validation errors rather than JSON rejections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitAssessment {
    pub employee_code: String,
    pub employee_name: String,
    pub employee_mobile: String,
    pub dr_code: String,
    pub dr_first_name: String,
    pub dr_last_name: String,
    pub dr_mobile: String,
    pub video_language: String,
    pub name_pronunciation: String,
    pub videos: BTreeMap<String, String>,
}

impl SubmitAssessment {
    /// Trim every text field; video URLs included.
    pub fn trimmed(self) -> Self {
        let t = |s: String| s.trim().to_string();
        Self {
            employee_code: t(self.employee_code),
            employee_name: t(self.employee_name),
            employee_mobile: t(self.employee_mobile),
            dr_code: t(self.dr_code),
            dr_first_name: t(self.dr_first_name),
            dr_last_name: t(self.dr_last_name),
            dr_mobile: t(self.dr_mobile),
            video_language: t(self.video_language),
            name_pronunciation: t(self.name_pronunciation),
            videos: self
                .videos
                .into_iter()
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .collect(),
        }
    }

    /// `"first last"` as used in notification templates.
    pub fn doctor_full_name(&self) -> String {
        format!("{} {}", self.dr_first_name, self.dr_last_name)
            .trim()
            .to_string()
    }
}

/// Query parameters for `GET /api/assessments`.
#[derive(Debug, Default, Deserialize)]
pub struct AssessmentListQuery {
    /// `pending`, `completed` or `failed` (keyed on `video_stitch`).
    pub status: Option<String>,
    /// Maximum number of results. Defaults to 50, capped at 200.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// A record ready for stitching, joined with its two response videos.
#[derive(Debug, Clone, FromRow)]
pub struct PendingStitch {
    pub id: DbId,
    pub employee_code: String,
    pub dr_code: String,
    pub dr_first_name: String,
    pub dr_last_name: String,
    pub video_language: String,
    pub video1_url: Option<String>,
    pub video2_url: Option<String>,
    pub created_at: Timestamp,
}

/// Pipeline counters for the admin dashboard.
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct AssessmentStats {
    pub total: i64,
    pub pending_audio: i64,
    pub pending_stitch: i64,
    pub completed: i64,
    pub failed: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_uses_form_field_names() {
        let body = serde_json::json!({
            "employeeCode": " E1 ",
            "drCode": "12345678",
            "drFirstName": "Aparna",
            "namePronunciation": "Apurna",
            "videos": {"video1": " gs://b/1.mp4", "video2": "gs://b/2.mp4"}
        });
        let input: SubmitAssessment = serde_json::from_value(body).unwrap();
        let input = input.trimmed();
        assert_eq!(input.employee_code, "E1");
        assert_eq!(input.dr_last_name, "");
        assert_eq!(input.videos["video1"], "gs://b/1.mp4");
        assert_eq!(input.doctor_full_name(), "Aparna");
    }
}
