//! Pronunciation resolution and the text sent to the speech synthesizer.
//!
//! The transliteration provider is called per word by the audio stage; this
//! module only decides which words need it.

use std::sync::LazyLock;

use regex::Regex;

/// Characters stripped before a name is split into words.
static NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.\u{200B}\u{200C}\u{200D}\u{FEFF}]").expect("valid regex"));

/// Runs of whitespace collapsed to a single space.
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Two to four capital letters: read out as initials.
static INITIALS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,4}$").expect("valid regex"));

/// Rough TTS character cost of one pending record, used for the quota check.
pub const ESTIMATED_CHARS_PER_RECORD: u64 = 50;

/// How a single word of a name is voiced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameToken {
    /// Initials such as `AR`, already spaced out (`A R`).
    Initials(String),
    /// A lone capital letter, kept as-is.
    Letter(String),
    /// Anything else; sent to the transliteration provider.
    Word(String),
}

impl NameToken {
    /// Text used when no transliteration is available.
    pub fn fallback(&self) -> &str {
        match self {
            Self::Initials(s) | Self::Letter(s) | Self::Word(s) => s,
        }
    }
}

/// Title-case every whitespace-separated word: `"sHARMA ji"` -> `"Sharma Ji"`.
pub fn sentence_case_name(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Choose the text to pronounce for a doctor.
///
/// An explicit pronunciation wins; otherwise the doctor's first and last name
/// are title-cased and joined.
pub fn resolve_pronunciation(explicit: Option<&str>, first_name: &str, last_name: &str) -> String {
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => text.to_string(),
        None => format!(
            "{} {}",
            sentence_case_name(first_name),
            sentence_case_name(last_name)
        )
        .trim()
        .to_string(),
    }
}

/// Remove dots and zero-width characters and normalise whitespace.
pub fn clean_name(name: &str) -> String {
    let stripped = NOISE_RE.replace_all(name, "");
    WHITESPACE_RE.replace_all(&stripped, " ").trim().to_string()
}

/// Split a cleaned name into voicing tokens.
pub fn tokenize_name(name: &str) -> Vec<NameToken> {
    clean_name(name)
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(classify_word)
        .collect()
}

fn classify_word(word: &str) -> NameToken {
    if INITIALS_RE.is_match(word) {
        let spaced = word.chars().map(String::from).collect::<Vec<_>>().join(" ");
        NameToken::Initials(spaced)
    } else if word.len() == 1 && word.chars().all(|c| c.is_ascii_uppercase()) {
        NameToken::Letter(word.to_string())
    } else {
        NameToken::Word(word.to_string())
    }
}

/// Greeting phrase voiced over the first placeholder clip.
pub fn greeting_text(name: &str) -> String {
    format!("- डॉक्टर {name} ! - - - welcome, and thank you for joining us today.")
}

/// Closing phrase voiced over the second placeholder clip.
pub fn thank_you_text(name: &str) -> String {
    format!("Thank you Doctor {name}")
}

/// Estimated TTS characters needed for `pending` records.
pub fn estimated_quota_cost(pending: usize) -> u64 {
    pending as u64 * ESTIMATED_CHARS_PER_RECORD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_case_normalises_each_word() {
        assert_eq!(sentence_case_name("aPARNA"), "Aparna");
        assert_eq!(sentence_case_name("  ravi   kumar "), "Ravi Kumar");
        assert_eq!(sentence_case_name(""), "");
    }

    #[test]
    fn explicit_pronunciation_wins() {
        assert_eq!(resolve_pronunciation(Some(" Apurna "), "aparna", "rao"), "Apurna");
    }

    #[test]
    fn blank_pronunciation_falls_back_to_name() {
        assert_eq!(resolve_pronunciation(Some("  "), "aparna", "RAO"), "Aparna Rao");
        assert_eq!(resolve_pronunciation(None, "ravi", ""), "Ravi");
    }

    #[test]
    fn clean_name_strips_dots_and_zero_width() {
        assert_eq!(clean_name("Dr.\u{200B}  A.R.   Rahman"), "Dr AR Rahman");
    }

    #[test]
    fn tokenize_expands_initials_and_keeps_letters() {
        let tokens = tokenize_name("AR D Rahman");
        assert_eq!(
            tokens,
            vec![
                NameToken::Initials("A R".into()),
                NameToken::Letter("D".into()),
                NameToken::Word("Rahman".into()),
            ]
        );
    }

    #[test]
    fn five_capitals_are_a_word() {
        assert_eq!(tokenize_name("ABCDE"), vec![NameToken::Word("ABCDE".into())]);
    }

    #[test]
    fn phrases_embed_the_name() {
        assert_eq!(thank_you_text("Aparna"), "Thank you Doctor Aparna");
        assert!(greeting_text("Aparna").contains("डॉक्टर Aparna !"));
    }

    #[test]
    fn quota_cost_scales_with_pending() {
        assert_eq!(estimated_quota_cost(0), 0);
        assert_eq!(estimated_quota_cost(3), 150);
    }
}
