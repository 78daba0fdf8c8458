//! Deterministic object-storage locations for pipeline artifacts.
//!
//! Audio and final-video objects are keyed by employee and doctor code, so a
//! regenerated assessment overwrites its previous artifacts in place.

use crate::error::CoreError;
use crate::language::VideoLanguage;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Public HTTPS host for Cloud Storage objects.
pub const PUBLIC_STORAGE_HOST: &str = "https://storage.googleapis.com";

/// Prefix of native Cloud Storage URLs.
pub const GS_SCHEME: &str = "gs://";

/// Root folder for every campaign object.
pub const CAMPAIGN_ROOT: &str = "blusanta";

/// Which of the two generated audio clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioClip {
    /// "Doctor <name>" greeting over the first placeholder clip.
    Greeting,
    /// "Thank you Doctor <name>" over the second placeholder clip.
    ThankYou,
}

impl AudioClip {
    fn suffix(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::ThankYou => "thankyou",
        }
    }
}

// ---------------------------------------------------------------------------
// Object names
// ---------------------------------------------------------------------------

/// Object name of a generated audio clip.
pub fn audio_object(
    language: VideoLanguage,
    employee_code: &str,
    dr_code: &str,
    clip: AudioClip,
) -> String {
    format!(
        "{CAMPAIGN_ROOT}/audio/names/{}/{employee_code}_{dr_code}_{}.mp3",
        language.folder(),
        clip.suffix()
    )
}

/// Object name of the final stitched video.
pub fn final_video_object(language: VideoLanguage, employee_code: &str, dr_code: &str) -> String {
    format!(
        "{CAMPAIGN_ROOT}/{}/{employee_code}_{dr_code}_final.mp4",
        language.results_folder()
    )
}

/// Folder holding the constant template clips for a language.
pub fn template_folder(bucket: &str, language: VideoLanguage) -> String {
    format!("{GS_SCHEME}{bucket}/{CAMPAIGN_ROOT}/constant-videos/{}", language.folder())
}

/// Background image used by the podcast zoom layout.
pub fn podcast_background(bucket: &str) -> String {
    format!("{GS_SCHEME}{bucket}/{CAMPAIGN_ROOT}/podcast-backgrounds/Podcast_BG.jpg")
}

// ---------------------------------------------------------------------------
// URL forms
// ---------------------------------------------------------------------------

/// `gs://bucket/object`.
pub fn gs_url(bucket: &str, object: &str) -> String {
    format!("{GS_SCHEME}{bucket}/{object}")
}

/// `https://storage.googleapis.com/bucket/object`.
pub fn public_url(bucket: &str, object: &str) -> String {
    format!("{PUBLIC_STORAGE_HOST}/{bucket}/{object}")
}

/// Convert a public HTTPS storage URL to its `gs://` form and encode spaces.
///
/// URLs that are not on the public storage host are returned with only the
/// space encoding applied.
pub fn normalize_video_url(url: &str) -> String {
    let trimmed = url.trim();
    let native = match trimmed.strip_prefix(PUBLIC_STORAGE_HOST) {
        Some(rest) => format!("{GS_SCHEME}{}", rest.trim_start_matches('/')),
        None => trimmed.to_string(),
    };
    native.replace(' ', "%20")
}

/// Split a `gs://` or public HTTPS storage URL into `(bucket, object)`.
///
/// Percent-encoded spaces in the object name are decoded.
pub fn parse_storage_url(url: &str) -> Result<(String, String), CoreError> {
    let rest = url
        .strip_prefix(GS_SCHEME)
        .or_else(|| {
            url.strip_prefix(PUBLIC_STORAGE_HOST)
                .map(|r| r.trim_start_matches('/'))
        })
        .ok_or_else(|| CoreError::Validation("Invalid GCS URL format".into()))?;

    let (bucket, object) = rest
        .split_once('/')
        .ok_or_else(|| CoreError::Validation("Invalid GCS URL format".into()))?;

    if bucket.is_empty() || object.is_empty() {
        return Err(CoreError::Validation("Invalid GCS URL format".into()));
    }

    Ok((bucket.to_string(), object.replace("%20", " ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_objects_are_keyed_by_codes() {
        assert_eq!(
            audio_object(VideoLanguage::English, "E1", "12345678", AudioClip::Greeting),
            "blusanta/audio/names/english/E1_12345678_greeting.mp3"
        );
        assert_eq!(
            audio_object(VideoLanguage::Hindi, "E1", "D9", AudioClip::ThankYou),
            "blusanta/audio/names/hindi/E1_D9_thankyou.mp3"
        );
    }

    #[test]
    fn final_object_uses_results_folder() {
        assert_eq!(
            final_video_object(VideoLanguage::Hindi, "E1", "D9"),
            "blusanta/results_hindi/E1_D9_final.mp4"
        );
    }

    #[test]
    fn normalize_converts_public_urls() {
        assert_eq!(
            normalize_video_url("https://storage.googleapis.com/bkt/uploads/my video.mp4"),
            "gs://bkt/uploads/my%20video.mp4"
        );
        assert_eq!(normalize_video_url("gs://bkt/a.mp4"), "gs://bkt/a.mp4");
    }

    #[test]
    fn parse_handles_both_forms() {
        assert_eq!(
            parse_storage_url("gs://bkt/dir/a%20b.mp4").unwrap(),
            ("bkt".to_string(), "dir/a b.mp4".to_string())
        );
        assert_eq!(
            parse_storage_url("https://storage.googleapis.com/bkt/x.mp3").unwrap(),
            ("bkt".to_string(), "x.mp3".to_string())
        );
    }

    #[test]
    fn parse_rejects_foreign_urls() {
        assert!(parse_storage_url("https://example.com/x.mp4").is_err());
        assert!(parse_storage_url("gs://bucket-only").is_err());
    }
}
