//! Mirrors pipeline progress into the QC tracking sheet.

use std::sync::Arc;

use blusanta_cloud::sheet::{QcSheet, SheetUpdate};
use blusanta_cloud::CloudResult;
use blusanta_core::types::DbId;
use tokio::sync::broadcast;

use crate::bus::PipelineEvent;
use crate::payloads::{Regenerated, StitchCompleted, Submitted};

const YES: &str = "Yes";

/// Appends a row per submission and fills in completion columns.
///
/// Sheet failures are logged and never reach the pipeline.
pub struct SheetSync {
    sheet: Arc<dyn QcSheet>,
}

impl SheetSync {
    pub fn new(sheet: Arc<dyn QcSheet>) -> Self {
        Self { sheet }
    }

    /// Run the sync loop until the bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<PipelineEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.apply(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            assessment_id = ?event.assessment_id,
                            "Failed to sync QC sheet"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Sheet sync lagged, some rows were not updated");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, sheet sync shutting down");
                    break;
                }
            }
        }
    }

    async fn apply(&self, event: &PipelineEvent) -> CloudResult<()> {
        if let Some(submitted) = event.decode::<Submitted>() {
            self.sheet.append_row(submitted.sheet_row).await?;
            tracing::info!(assessment_id = ?event.assessment_id, "QC sheet row appended");
            return Ok(());
        }

        let Some(id) = event.assessment_id else {
            return Ok(());
        };

        let update = if let Some(done) = event.decode::<StitchCompleted>() {
            SheetUpdate {
                final_video_url: Some(done.final_video_url),
                video_generated_on: Some(done.video_generated_on),
                regenerated: done.is_regenerated.then(|| YES.to_string()),
            }
        } else if event.decode::<Regenerated>().is_some() {
            SheetUpdate {
                regenerated: Some(YES.to_string()),
                ..Default::default()
            }
        } else {
            return Ok(());
        };

        self.update(id, &update).await
    }

    async fn update(&self, id: DbId, update: &SheetUpdate) -> CloudResult<()> {
        if self.sheet.update_by_assessment_id(id, update).await? {
            tracing::info!(assessment_id = id, "QC sheet row updated");
        } else {
            tracing::warn!(assessment_id = id, "No QC sheet row for assessment");
        }
        Ok(())
    }
}
