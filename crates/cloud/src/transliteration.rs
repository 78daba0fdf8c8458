//! Latin to Devanagari transliteration via Google Input Tools.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CloudResult;
use crate::http::parse_response;

const SERVICE: &str = "Input Tools";
const DEFAULT_BASE_URL: &str = "https://inputtools.google.com";
const HINDI_INPUT_CODE: &str = "hi-t-i0-und";

#[async_trait]
pub trait Transliterator: Send + Sync {
    /// Best suggestion for `word`, `None` when the service has none.
    async fn transliterate(&self, word: &str) -> CloudResult<Option<String>>;
}

pub struct InputToolsTransliterator {
    client: reqwest::Client,
    base_url: String,
}

impl InputToolsTransliterator {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Transliterator for InputToolsTransliterator {
    async fn transliterate(&self, word: &str) -> CloudResult<Option<String>> {
        let Some(latin) = latin_segment(word) else {
            return Ok(None);
        };
        let response = self
            .client
            .get(format!("{}/request", self.base_url))
            .query(&[
                ("text", latin),
                ("itc", HINDI_INPUT_CODE),
                ("num", "1"),
                ("cp", "0"),
                ("cs", "1"),
                ("ie", "utf-8"),
                ("oe", "utf-8"),
                ("app", "gonuts"),
            ])
            .send()
            .await?;
        let body: Value = parse_response(SERVICE, response).await?;
        Ok(first_suggestion(&body))
    }
}

fn is_latin(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c == '.'
        || c == ' '
        || ('\u{00C0}'..='\u{024F}').contains(&c)
        || ('\u{1E00}'..='\u{1EFF}').contains(&c)
}

/// First run of Latin letters, digits, dots and spaces in `word`.
fn latin_segment(word: &str) -> Option<&str> {
    let start = word.char_indices().find(|(_, c)| is_latin(*c))?.0;
    let end = word[start..]
        .char_indices()
        .find(|(_, c)| !is_latin(*c))
        .map_or(word.len(), |(i, _)| start + i);
    let segment = word[start..end].trim();
    (!segment.is_empty()).then_some(segment)
}

/// `["SUCCESS", [["word", ["suggestion", ...], ...]]]`
fn first_suggestion(body: &Value) -> Option<String> {
    if body.get(0)?.as_str()? != "SUCCESS" {
        return None;
    }
    body.get(1)?
        .get(0)?
        .get(1)?
        .get(0)?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
