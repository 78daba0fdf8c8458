//! Typed payloads carried by [`PipelineEvent`](crate::bus::PipelineEvent)s.

use std::collections::BTreeMap;

use blusanta_core::pipeline_events::{
    EVENT_QC_APPROVED, EVENT_REGENERATED, EVENT_REUPLOAD_REQUESTED, EVENT_STITCH_COMPLETED,
    EVENT_SUBMITTED, EVENT_UPLOAD_REJECTED,
};
use blusanta_db::models::assessment::{Assessment, SubmitAssessment};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A payload bound to one event type.
pub trait EventPayload: Serialize {
    const EVENT_TYPE: &'static str;
}

/// The employee to notify and the doctor the message is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub employee_name: String,
    pub employee_mobile: String,
    pub doctor_name: String,
    pub dr_code: String,
}

impl From<&Assessment> for Recipient {
    fn from(a: &Assessment) -> Self {
        Self {
            employee_name: a.employee_name.clone(),
            employee_mobile: a.employee_mobile.clone(),
            doctor_name: a.doctor_full_name(),
            dr_code: a.dr_code.clone(),
        }
    }
}

impl From<&SubmitAssessment> for Recipient {
    fn from(s: &SubmitAssessment) -> Self {
        Self {
            employee_name: s.employee_name.clone(),
            employee_mobile: s.employee_mobile.clone(),
            doctor_name: s.doctor_full_name(),
            dr_code: s.dr_code.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submitted {
    pub recipient: Recipient,
    /// Full QC sheet row for this submission.
    pub sheet_row: Vec<String>,
    pub created: bool,
}

impl EventPayload for Submitted {
    const EVENT_TYPE: &'static str = EVENT_SUBMITTED;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRejected {
    pub recipient: Recipient,
    pub reason: String,
}

impl EventPayload for UploadRejected {
    const EVENT_TYPE: &'static str = EVENT_UPLOAD_REJECTED;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StitchCompleted {
    pub final_video_url: String,
    pub video_generated_on: String,
    pub is_regenerated: bool,
}

impl EventPayload for StitchCompleted {
    const EVENT_TYPE: &'static str = EVENT_STITCH_COMPLETED;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Regenerated {
    pub name_pronunciation: String,
}

impl EventPayload for Regenerated {
    const EVENT_TYPE: &'static str = EVENT_REGENERATED;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QcApproved {
    pub video_url: String,
}

impl EventPayload for QcApproved {
    const EVENT_TYPE: &'static str = EVENT_QC_APPROVED;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReuploadRequested {
    pub reason: String,
}

impl EventPayload for ReuploadRequested {
    const EVENT_TYPE: &'static str = EVENT_REUPLOAD_REQUESTED;
}

/// QC sheet row appended for a submission.
///
/// Columns A..O: id, language, avatar, employee code, name and mobile,
/// doctor code, first and last name, doctor mobile, both video URLs, the
/// submission time, then two blank reviewer columns.
pub fn submission_sheet_row(
    assessment: &Assessment,
    videos: &BTreeMap<String, String>,
    now: DateTime<Utc>,
) -> Vec<String> {
    let video = |key: &str| videos.get(key).cloned().unwrap_or_default();
    vec![
        assessment.id.to_string(),
        assessment.video_language.clone(),
        assessment.avatar_name.clone(),
        assessment.employee_code.clone(),
        assessment.employee_name.clone(),
        assessment.employee_mobile.clone(),
        assessment.dr_code.clone(),
        assessment.dr_first_name.clone(),
        assessment.dr_last_name.clone(),
        assessment.dr_mobile.clone(),
        video("video1"),
        video("video2"),
        now.to_rfc3339_opts(SecondsFormat::Millis, true),
        String::new(),
        String::new(),
    ]
}
