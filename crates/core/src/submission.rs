//! Submission-time validation of an employee's upload.

use std::collections::BTreeMap;

use crate::error::CoreError;

/// Keys of the two response videos, in playback order.
pub const VIDEO_KEYS: [&str; 2] = ["video1", "video2"];

/// Number of response videos every assessment carries.
pub const REQUIRED_VIDEO_COUNT: usize = VIDEO_KEYS.len();

/// Require exactly the two response-video keys, each with a non-blank URL.
pub fn validate_videos(videos: &BTreeMap<String, String>) -> Result<(), CoreError> {
    if videos.len() != REQUIRED_VIDEO_COUNT {
        return Err(CoreError::Validation(format!(
            "Exactly {REQUIRED_VIDEO_COUNT} videos must be provided (got {})",
            videos.len()
        )));
    }
    for key in VIDEO_KEYS {
        match videos.get(key) {
            Some(url) if !url.trim().is_empty() => {}
            Some(_) => {
                return Err(CoreError::Validation(format!(
                    "Video URL for key \"{key}\" is empty"
                )))
            }
            None => {
                return Err(CoreError::Validation(format!(
                    "Missing video for key \"{key}\". Expected keys: {VIDEO_KEYS:?}"
                )))
            }
        }
    }
    Ok(())
}

/// Require a non-blank, already trimmed field.
pub fn require_field(name: &str, value: &str) -> Result<(), CoreError> {
    if value.is_empty() {
        return Err(CoreError::Validation(format!("{name} is required")));
    }
    Ok(())
}

/// Pronunciation drives audio generation and cannot be blank.
pub fn require_pronunciation(value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(
            "Name pronunciation is required for audio generation.".into(),
        ));
    }
    Ok(())
}
