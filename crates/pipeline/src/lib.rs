//! Stage orchestration: audio generation, stitching dispatch and the
//! capacity and validation steps they depend on.

pub mod audio;
pub mod capacity;
pub mod config;
pub mod error;
pub mod single_flight;
pub mod stitching;
pub mod store;
pub mod validator;

use std::sync::Arc;

use blusanta_cloud::compute::ComputeProvider;
use blusanta_cloud::storage::ObjectStorage;
use blusanta_cloud::transliteration::Transliterator;
use blusanta_cloud::tts::SpeechSynthesizer;
use blusanta_stitcher::StitchHost;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

pub use audio::{AudioGenerationStage, AudioTimings, AudioTrigger};
pub use capacity::{CapacityManager, CapacityTimings, HostRef};
pub use config::CampaignConfig;
pub use error::PipelineError;
pub use stitching::{DispatchSettings, DispatchTimings, StitchTrigger, StitchingDispatcher};
pub use store::{AssessmentStore, PgAssessmentStore};
pub use validator::AssetValidator;

/// External collaborators the stages talk to.
#[derive(Clone)]
pub struct PipelineDeps {
    pub store: Arc<dyn AssessmentStore>,
    pub storage: Arc<dyn ObjectStorage>,
    pub compute: Arc<dyn ComputeProvider>,
    pub tts: Arc<dyn SpeechSynthesizer>,
    pub transliterator: Arc<dyn Transliterator>,
    pub stitch_host: Arc<dyn StitchHost>,
}

/// Timings for every stage, overridable in tests.
#[derive(Debug, Clone, Default)]
pub struct PipelineTimings {
    pub audio: AudioTimings,
    pub dispatch: DispatchTimings,
    pub capacity: CapacityTimings,
}

/// Pending work found by [`Pipeline::retry_pending`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PendingCounts {
    pub audio: i64,
    pub stitch: i64,
}

/// Both stages wired together.
pub struct Pipeline {
    pub audio: Arc<AudioGenerationStage>,
    pub stitching: Arc<StitchingDispatcher>,
    store: Arc<dyn AssessmentStore>,
}

impl Pipeline {
    pub fn new(
        deps: PipelineDeps,
        config: &CampaignConfig,
        webhook_base_url: &str,
        timings: PipelineTimings,
        cancel: CancellationToken,
    ) -> Self {
        let capacity = CapacityManager::new(
            deps.compute,
            config.stitch_hosts.clone(),
            timings.capacity,
        );
        let stitching = Arc::new(StitchingDispatcher::new(
            Arc::clone(&deps.store),
            capacity,
            deps.stitch_host,
            AssetValidator::new(Arc::clone(&deps.storage)),
            DispatchSettings {
                bucket: config.bucket.clone(),
                webhook_base_url: webhook_base_url.trim_end_matches('/').to_string(),
                timings: timings.dispatch,
            },
            cancel,
        ));
        let audio = Arc::new(AudioGenerationStage::new(
            Arc::clone(&deps.store),
            deps.tts,
            deps.transliterator,
            deps.storage,
            config.bucket.clone(),
            Arc::clone(&stitching),
            timings.audio,
        ));
        Self {
            audio,
            stitching,
            store: deps.store,
        }
    }

    /// Trigger whichever stages have pending work.
    pub async fn retry_pending(&self) -> Result<PendingCounts, PipelineError> {
        let counts = PendingCounts {
            audio: self.store.count_pending_audio().await?,
            stitch: self.store.count_pending_stitch().await?,
        };
        tracing::info!(audio = counts.audio, stitch = counts.stitch, "Retrying pending work");

        if counts.audio > 0 {
            self.audio.trigger(None).await?;
        }
        if counts.stitch > 0 {
            self.stitching.trigger(None);
        }
        Ok(counts)
    }
}
