//! Shared request body and query types for API handlers.

use blusanta_core::error::CoreError;
use blusanta_core::language::VideoLanguage;
use blusanta_core::types::DbId;
use serde::Deserialize;
use serde_json::Value;

/// Body of the stage trigger endpoints: `{ "language": "Hindi" }`.
///
/// The body, and the field, are optional.
#[derive(Debug, Default, Deserialize)]
pub struct LanguageFilter {
    pub language: Option<String>,
}

impl LanguageFilter {
    /// Parse the filter. A blank value means no filter.
    pub fn parse(&self) -> Result<Option<VideoLanguage>, CoreError> {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(VideoLanguage::parse)
            .transpose()
    }
}

/// Read an id sent either as a JSON number or as a numeric string.
pub fn flexible_id(value: Option<&Value>) -> Option<DbId> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ids_accept_numbers_and_numeric_strings() {
        assert_eq!(flexible_id(Some(&json!(42))), Some(42));
        assert_eq!(flexible_id(Some(&json!(" 42 "))), Some(42));
        assert_eq!(flexible_id(Some(&json!("abc"))), None);
        assert_eq!(flexible_id(Some(&json!(null))), None);
        assert_eq!(flexible_id(None), None);
    }

    #[test]
    fn blank_language_means_all() {
        let filter = LanguageFilter {
            language: Some("  ".into()),
        };
        assert_eq!(filter.parse().unwrap(), None);
        assert_eq!(LanguageFilter::default().parse().unwrap(), None);
    }

    #[test]
    fn unknown_language_is_rejected() {
        let filter = LanguageFilter {
            language: Some("Tamil".into()),
        };
        assert!(filter.parse().is_err());
    }
}
