//! Periodic trigger of the audio and stitching stages.

use std::sync::Arc;
use std::time::Duration;

use blusanta_pipeline::AssessmentStore;
use serde_json::Value;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub const AUDIO_TRIGGER_PATH: &str = "/api/blusanta/initiate-audio-generation";
pub const STITCH_TRIGGER_PATH: &str = "/api/blusanta/initiate-video-stitching";

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Backend { status: u16, body: String },
}

/// Which stages a tick asked the backend to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub audio_triggered: bool,
    pub stitch_triggered: bool,
}

// ---------------------------------------------------------------------------
// Poller
// ---------------------------------------------------------------------------

pub struct Poller {
    store: Arc<dyn AssessmentStore>,
    client: reqwest::Client,
    backend_url: String,
    interval: Duration,
}

impl Poller {
    pub fn new(
        store: Arc<dyn AssessmentStore>,
        client: reqwest::Client,
        backend_url: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            client,
            backend_url: backend_url.into().trim_end_matches('/').to_string(),
            interval,
        }
    }

    /// Tick immediately, then every interval, until cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Poller cancelled");
                    break;
                }
                _ = interval.tick() => {
                    let report = self.tick().await;
                    tracing::debug!(?report, "Poll complete");
                }
            }
        }
    }

    /// Check both stages. A failure in one does not skip the other.
    pub async fn tick(&self) -> TickReport {
        tracing::info!("Checking for pending assessments");
        let mut report = TickReport::default();

        match self.store.count_pending_audio().await {
            Ok(0) => {}
            Ok(count) => {
                tracing::info!(count, "Assessments pending audio generation");
                report.audio_triggered = self.trigger("audio", AUDIO_TRIGGER_PATH).await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to count pending audio"),
        }

        match self.store.count_pending_stitch().await {
            Ok(0) => {}
            Ok(count) => {
                tracing::info!(count, "Assessments pending video stitching");
                report.stitch_triggered = self.trigger("stitching", STITCH_TRIGGER_PATH).await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to count pending stitching"),
        }

        report
    }

    async fn trigger(&self, stage: &'static str, path: &str) -> bool {
        match self.post_trigger(path).await {
            Ok(message) => {
                tracing::info!(stage, message = %message, "Stage triggered");
                true
            }
            Err(e) => {
                tracing::error!(stage, error = %e, "Failed to trigger stage");
                false
            }
        }
    }

    /// POST `{}` and return the backend's `message`.
    async fn post_trigger(&self, path: &str) -> Result<String, WorkerError> {
        let response = self
            .client
            .post(format!("{}{path}", self.backend_url))
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        Ok(body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_shows_status() {
        let err = WorkerError::Backend {
            status: 503,
            body: "down".into(),
        };
        assert_eq!(err.to_string(), "Backend returned 503: down");
    }
}
