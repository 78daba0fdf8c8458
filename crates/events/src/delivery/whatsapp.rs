//! WhatsApp template notifications with exponential-backoff retry.
//!
//! [`Notifier`] maps pipeline moments to approved message templates and
//! sends them through a [`Messenger`]. Failed attempts are retried up to
//! three times with exponential backoff (1 s, 2 s, 4 s).

use std::sync::Arc;
use std::time::Duration;

use blusanta_cloud::messaging::Messenger;
use blusanta_cloud::{CloudError, CloudResult};

use crate::payloads::Recipient;

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

// ---------------------------------------------------------------------------
// TemplateIds
// ---------------------------------------------------------------------------

/// Approved template identifiers, one per notification kind.
#[derive(Debug, Clone)]
pub struct TemplateIds {
    pub upload_success: String,
    pub upload_failure: String,
    pub video_ready: String,
    pub reupload: String,
}

impl TemplateIds {
    /// | Variable                                   | Required |
    /// |--------------------------------------------|----------|
    /// | `GUPSHUP_VIDEO_UPLOAD_SUCCESS_TEMPLATE_ID` | yes      |
    /// | `GUPSHUP_VIDEO_UPLOAD_FAILURE_TEMPLATE_ID` | yes      |
    /// | `GUPSHUP_VIDEO_READY_TEMPLATE_ID`          | yes      |
    /// | `GUPSHUP_VIDEO_REUPLOAD_TEMPLATE_ID`       | yes      |
    pub fn from_env() -> CloudResult<Self> {
        fn var(name: &'static str) -> CloudResult<String> {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or(CloudError::Config(name))
        }
        Ok(Self {
            upload_success: var("GUPSHUP_VIDEO_UPLOAD_SUCCESS_TEMPLATE_ID")?,
            upload_failure: var("GUPSHUP_VIDEO_UPLOAD_FAILURE_TEMPLATE_ID")?,
            video_ready: var("GUPSHUP_VIDEO_READY_TEMPLATE_ID")?,
            reupload: var("GUPSHUP_VIDEO_REUPLOAD_TEMPLATE_ID")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

pub struct Notifier {
    messenger: Arc<dyn Messenger>,
    templates: TemplateIds,
}

impl Notifier {
    pub fn new(messenger: Arc<dyn Messenger>, templates: TemplateIds) -> Self {
        Self {
            messenger,
            templates,
        }
    }

    /// Videos were received and queued for generation.
    pub async fn upload_success(&self, to: &Recipient) -> CloudResult<()> {
        let params = vec![
            to.employee_name.clone(),
            to.doctor_name.clone(),
            to.dr_code.clone(),
        ];
        self.deliver(&self.templates.upload_success, to, params).await
    }

    /// The submission was rejected.
    pub async fn upload_failure(&self, to: &Recipient) -> CloudResult<()> {
        let params = vec![
            to.employee_name.clone(),
            to.doctor_name.clone(),
            to.dr_code.clone(),
        ];
        self.deliver(&self.templates.upload_failure, to, params).await
    }

    /// A reviewer approved the final video.
    pub async fn video_ready(&self, to: &Recipient, video_url: &str) -> CloudResult<()> {
        let params = vec![
            to.employee_name.clone(),
            to.doctor_name.clone(),
            to.dr_code.clone(),
            video_url.to_string(),
        ];
        self.deliver(&self.templates.video_ready, to, params).await
    }

    /// A reviewer asked for new response videos.
    pub async fn reupload_request(&self, to: &Recipient, reason: &str) -> CloudResult<()> {
        let params = vec![
            to.employee_name.clone(),
            to.dr_code.clone(),
            to.doctor_name.clone(),
            reason.to_string(),
        ];
        self.deliver(&self.templates.reupload, to, params).await
    }

    /// Send with retry. Returns the first error if every attempt fails.
    async fn deliver(
        &self,
        template_id: &str,
        to: &Recipient,
        params: Vec<String>,
    ) -> CloudResult<()> {
        let mut first_err: Option<CloudError> = None;

        for (attempt, delay_secs) in RETRY_DELAYS_SECS.iter().enumerate() {
            match self
                .messenger
                .send_template(template_id, &to.employee_mobile, &params)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        template_id,
                        dr_code = %to.dr_code,
                        error = %e,
                        "WhatsApp delivery attempt failed, retrying"
                    );
                    first_err.get_or_insert(e);
                    tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
                }
            }
        }

        // Final attempt after the last backoff.
        match self
            .messenger
            .send_template(template_id, &to.employee_mobile, &params)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(
                    template_id,
                    dr_code = %to.dr_code,
                    error = %e,
                    "WhatsApp delivery failed after all retries"
                );
                Err(first_err.unwrap_or(e))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
