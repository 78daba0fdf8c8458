//! Campaign video languages and the storage folders derived from them.

use crate::error::CoreError;

/// Stored label for English-language videos.
pub const LANGUAGE_ENGLISH: &str = "English";

/// Stored label for Hindi-language videos.
pub const LANGUAGE_HINDI: &str = "Hindi";

/// Labels accepted on submission.
pub const SUPPORTED_LANGUAGES: &[&str] = &[LANGUAGE_ENGLISH, LANGUAGE_HINDI];

/// Language of the personalized video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoLanguage {
    English,
    Hindi,
}

impl VideoLanguage {
    /// Parse a submitted language label (case-insensitive, surrounding
    /// whitespace ignored).
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case(LANGUAGE_ENGLISH) {
            Ok(Self::English)
        } else if trimmed.eq_ignore_ascii_case(LANGUAGE_HINDI) {
            Ok(Self::Hindi)
        } else {
            Err(CoreError::Validation(format!(
                "Unsupported video language '{trimmed}'. Must be one of: {SUPPORTED_LANGUAGES:?}"
            )))
        }
    }

    /// Resolve a label read back from the store. Anything that is not Hindi
    /// renders with the English assets.
    pub fn from_stored(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case(LANGUAGE_HINDI) {
            Self::Hindi
        } else {
            Self::English
        }
    }

    /// Canonical label persisted in `assessments.video_language`.
    pub fn label(self) -> &'static str {
        match self {
            Self::English => LANGUAGE_ENGLISH,
            Self::Hindi => LANGUAGE_HINDI,
        }
    }

    /// Folder segment used for audio and template assets.
    pub fn folder(self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Hindi => "hindi",
        }
    }

    /// Folder segment used for final stitched videos.
    pub fn results_folder(self) -> &'static str {
        match self {
            Self::English => "results",
            Self::Hindi => "results_hindi",
        }
    }
}

impl std::fmt::Display for VideoLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_supported_labels_in_any_case() {
        assert_eq!(VideoLanguage::parse("English").unwrap(), VideoLanguage::English);
        assert_eq!(VideoLanguage::parse(" hindi ").unwrap(), VideoLanguage::Hindi);
    }

    #[test]
    fn parse_rejects_unknown_label() {
        let err = VideoLanguage::parse("Tamil").unwrap_err();
        assert!(err.to_string().contains("Tamil"));
    }

    #[test]
    fn stored_labels_default_to_english() {
        assert_eq!(VideoLanguage::from_stored("Hindi"), VideoLanguage::Hindi);
        assert_eq!(VideoLanguage::from_stored(""), VideoLanguage::English);
        assert_eq!(VideoLanguage::from_stored("Marathi"), VideoLanguage::English);
    }

    #[test]
    fn folders_follow_language() {
        assert_eq!(VideoLanguage::English.folder(), "english");
        assert_eq!(VideoLanguage::Hindi.results_folder(), "results_hindi");
    }
}
