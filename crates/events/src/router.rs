//! Event-to-WhatsApp routing.
//!
//! [`NotificationRouter`] subscribes to the event bus and sends the
//! submission receipt for every accepted or rejected upload. Review outcomes
//! are notified synchronously by the QC handler instead, since the reviewer
//! needs to know whether the message went out.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::bus::PipelineEvent;
use crate::delivery::whatsapp::Notifier;
use crate::payloads::{Submitted, UploadRejected};

pub struct NotificationRouter {
    notifier: Arc<Notifier>,
}

impl NotificationRouter {
    pub fn new(notifier: Arc<Notifier>) -> Self {
        Self { notifier }
    }

    /// Run the routing loop until the bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<PipelineEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.route_event(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    async fn route_event(&self, event: &PipelineEvent) {
        let result = if let Some(submitted) = event.decode::<Submitted>() {
            self.notifier.upload_success(&submitted.recipient).await
        } else if let Some(rejected) = event.decode::<UploadRejected>() {
            self.notifier.upload_failure(&rejected.recipient).await
        } else {
            return;
        };

        if let Err(e) = result {
            tracing::error!(
                error = %e,
                event_type = %event.event_type,
                assessment_id = ?event.assessment_id,
                "Failed to send notification"
            );
        }
    }
}
