use std::sync::Arc;

use blusanta_cloud::storage::ObjectStorage;
use blusanta_events::{EventBus, Notifier};
use blusanta_pipeline::{CampaignConfig, Pipeline};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: blusanta_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Campaign tag, bucket and stitching host settings.
    pub campaign: Arc<CampaignConfig>,
    /// Object storage for upload checks and signed URLs.
    pub storage: Arc<dyn ObjectStorage>,
    /// WhatsApp notifications sent synchronously by the QC handler.
    pub notifier: Arc<Notifier>,
    /// Centralized event bus for publishing pipeline events.
    pub event_bus: Arc<EventBus>,
    /// Audio generation and stitching stages.
    pub pipeline: Arc<Pipeline>,
}
