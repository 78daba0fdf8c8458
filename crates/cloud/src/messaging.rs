//! WhatsApp template messages via Gupshup.

use async_trait::async_trait;

use crate::error::CloudResult;
use crate::http::{ensure_success, required_env};

const SERVICE: &str = "Gupshup";
const DEFAULT_ENDPOINT: &str = "https://api.gupshup.io/wa/api/v1/template/msg";
const COUNTRY_CODE: &str = "91";

#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send an approved template with positional `params` to `destination`.
    async fn send_template(
        &self,
        template_id: &str,
        destination: &str,
        params: &[String],
    ) -> CloudResult<()>;
}

#[derive(Debug, Clone)]
pub struct GupshupConfig {
    pub api_key: String,
    pub source_number: String,
    pub source_name: String,
    pub endpoint: String,
}

impl GupshupConfig {
    /// | Env var                 | Default  |
    /// |-------------------------|----------|
    /// | `GUPSHUP_API_KEY`       | required |
    /// | `GUPSHUP_SOURCE_NUMBER` | required |
    /// | `GUPSHUP_SOURCE_NAME`   | required |
    pub fn from_env() -> CloudResult<Self> {
        Ok(Self {
            api_key: required_env("GUPSHUP_API_KEY")?,
            source_number: required_env("GUPSHUP_SOURCE_NUMBER")?,
            source_name: required_env("GUPSHUP_SOURCE_NAME")?,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }
}

/// Prefix the national country code unless already present.
pub fn format_destination(number: &str) -> String {
    let number = number.trim().trim_start_matches('+');
    if number.starts_with(COUNTRY_CODE) {
        number.to_string()
    } else {
        format!("{COUNTRY_CODE}{number}")
    }
}

pub struct GupshupMessenger {
    client: reqwest::Client,
    config: GupshupConfig,
}

impl GupshupMessenger {
    pub fn new(client: reqwest::Client, config: GupshupConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Messenger for GupshupMessenger {
    async fn send_template(
        &self,
        template_id: &str,
        destination: &str,
        params: &[String],
    ) -> CloudResult<()> {
        let destination = format_destination(destination);
        let template = serde_json::json!({ "id": template_id, "params": params }).to_string();
        let form = [
            ("channel", "whatsapp"),
            ("source", self.config.source_number.as_str()),
            ("src.name", self.config.source_name.as_str()),
            ("destination", destination.as_str()),
            ("template", template.as_str()),
        ];
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Apikey", &self.config.api_key)
            .form(&form)
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;
        tracing::info!(template_id, destination = %destination, "WhatsApp template sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_gets_country_code_once() {
        assert_eq!(format_destination("9876543210"), "919876543210");
        assert_eq!(format_destination("919876543210"), "919876543210");
        assert_eq!(format_destination(" +919876543210 "), "919876543210");
    }
}
