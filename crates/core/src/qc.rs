//! QC reviewer verdicts.

use crate::error::CoreError;

pub const VERDICT_APPROVED: &str = "Approved";
pub const VERDICT_REGENERATE: &str = "Regenerate";
pub const VERDICT_REUPLOAD: &str = "Re-upload";

const VALID_VERDICTS: &[&str] = &[VERDICT_APPROVED, VERDICT_REGENERATE, VERDICT_REUPLOAD];

/// Outcome of a human review of a stitched video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QcVerdict {
    Approved,
    Regenerate,
    Reupload,
}

impl QcVerdict {
    /// Parse the verdict exactly as the QC sheet writes it.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.trim() {
            VERDICT_APPROVED => Ok(Self::Approved),
            VERDICT_REGENERATE => Ok(Self::Regenerate),
            VERDICT_REUPLOAD => Ok(Self::Reupload),
            other => Err(CoreError::Validation(format!(
                "Invalid status '{other}'. Must be one of: {VALID_VERDICTS:?}"
            ))),
        }
    }
}

/// Pronunciation to store when regenerating.
///
/// A non-blank override replaces the stored value; otherwise the stored value
/// is kept. One of the two must exist.
pub fn regeneration_pronunciation(
    override_text: Option<&str>,
    existing: Option<&str>,
) -> Result<String, CoreError> {
    fn pick(s: Option<&str>) -> Option<&str> {
        s.map(str::trim).filter(|s| !s.is_empty())
    }
    pick(override_text)
        .or_else(|| pick(existing))
        .map(str::to_string)
        .ok_or_else(|| {
            CoreError::Validation(
                "A pronunciation is required to regenerate this assessment".into(),
            )
        })
}

/// A re-upload request must carry a non-blank reason.
pub fn require_reupload_reason(reason: Option<&str>) -> Result<String, CoreError> {
    reason
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            CoreError::Validation("reason_for_reupload is required for Re-upload".into())
        })
}
