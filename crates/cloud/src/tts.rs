//! Speech synthesis via ElevenLabs.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::CloudResult;
use crate::http::{ensure_success, parse_response, required_env};

const SERVICE: &str = "ElevenLabs";
const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";
const MODEL_ID: &str = "eleven_multilingual_v2";
const OUTPUT_FORMAT: &str = "mp3_44100_128";

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Render `text` to MP3 bytes.
    async fn synthesize(&self, text: &str) -> CloudResult<Vec<u8>>;

    /// Characters left in the current billing period.
    async fn remaining_characters(&self) -> CloudResult<u64>;
}

#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub api_key: String,
    pub voice_id: String,
    pub base_url: String,
}

impl ElevenLabsConfig {
    /// | Env var               | Default                          |
    /// |-----------------------|----------------------------------|
    /// | `ELEVENLABS_API_KEY`  | required                         |
    /// | `ELEVENLABS_VOICE_ID` | required                         |
    /// | `ELEVENLABS_BASE_URL` | `https://api.elevenlabs.io/v1`   |
    pub fn from_env() -> CloudResult<Self> {
        Ok(Self {
            api_key: required_env("ELEVENLABS_API_KEY")?,
            voice_id: required_env("ELEVENLABS_VOICE_ID")?,
            base_url: std::env::var("ELEVENLABS_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct Subscription {
    character_count: u64,
    character_limit: u64,
}

pub struct ElevenLabsClient {
    client: reqwest::Client,
    config: ElevenLabsConfig,
}

impl ElevenLabsClient {
    pub fn new(client: reqwest::Client, config: ElevenLabsConfig) -> Self {
        Self { client, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str) -> CloudResult<Vec<u8>> {
        let body = serde_json::json!({
            "text": text,
            "model_id": MODEL_ID,
            "voice_settings": {
                "stability": 0.5,
                "similarity_boost": 0.75,
                "style": 0.0,
                "use_speaker_boost": true,
            },
        });
        let response = self
            .client
            .post(self.url(&format!("/text-to-speech/{}", self.config.voice_id)))
            .query(&[("output_format", OUTPUT_FORMAT)])
            .header("xi-api-key", &self.config.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn remaining_characters(&self) -> CloudResult<u64> {
        let response = self
            .client
            .get(self.url("/user/subscription"))
            .header("xi-api-key", &self.config.api_key)
            .send()
            .await?;
        let sub: Subscription = parse_response(SERVICE, response).await?;
        Ok(sub.character_limit.saturating_sub(sub.character_count))
    }
}
