//! Audio generation stage: voice the doctor's name and upload the clips.

use std::sync::Arc;
use std::time::Duration;

use blusanta_cloud::storage::ObjectStorage;
use blusanta_cloud::transliteration::Transliterator;
use blusanta_cloud::tts::SpeechSynthesizer;
use blusanta_cloud::CloudError;
use blusanta_core::language::VideoLanguage;
use blusanta_core::pronunciation::{
    estimated_quota_cost, greeting_text, resolve_pronunciation, thank_you_text, tokenize_name,
    NameToken,
};
use blusanta_core::storage_paths::{audio_object, AudioClip};
use blusanta_db::models::assessment::Assessment;

use crate::error::PipelineError;
use crate::single_flight::{FlightGuard, SingleFlight};
use crate::stitching::StitchingDispatcher;
use crate::store::AssessmentStore;

const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Result of asking the stage to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioTrigger {
    /// A batch was started in the background.
    Started { pending: usize },
    AlreadyRunning,
    NoPending,
}

#[derive(Debug, Clone)]
pub struct AudioTimings {
    /// Pause between records to stay under the synthesizer's rate limit.
    pub inter_record_delay: Duration,
}

impl Default for AudioTimings {
    fn default() -> Self {
        Self {
            inter_record_delay: Duration::from_secs(1),
        }
    }
}

/// Summary of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioBatchReport {
    pub succeeded: usize,
    pub failed: usize,
    /// The synthesizer quota could not cover the batch; nothing was voiced.
    pub quota_exhausted: bool,
}

pub struct AudioGenerationStage {
    store: Arc<dyn AssessmentStore>,
    tts: Arc<dyn SpeechSynthesizer>,
    transliterator: Arc<dyn Transliterator>,
    storage: Arc<dyn ObjectStorage>,
    bucket: String,
    stitching: Arc<StitchingDispatcher>,
    lock: Arc<SingleFlight>,
    timings: AudioTimings,
}

impl AudioGenerationStage {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn AssessmentStore>,
        tts: Arc<dyn SpeechSynthesizer>,
        transliterator: Arc<dyn Transliterator>,
        storage: Arc<dyn ObjectStorage>,
        bucket: impl Into<String>,
        stitching: Arc<StitchingDispatcher>,
        timings: AudioTimings,
    ) -> Self {
        Self {
            store,
            tts,
            transliterator,
            storage,
            bucket: bucket.into(),
            stitching,
            lock: SingleFlight::new("audio-generation"),
            timings,
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock.is_busy()
    }

    /// Start a batch over every pending record unless one is already running.
    pub async fn trigger(
        self: &Arc<Self>,
        language: Option<VideoLanguage>,
    ) -> Result<AudioTrigger, PipelineError> {
        let Some(guard) = self.lock.try_acquire() else {
            tracing::info!("Audio generation already running");
            return Ok(AudioTrigger::AlreadyRunning);
        };

        let pending = self.store.pending_audio(language).await?;
        if pending.is_empty() {
            tracing::info!(language = ?language, "No assessments pending audio");
            return Ok(AudioTrigger::NoPending);
        }

        let count = pending.len();
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let report = this.run_batch(guard, pending, language).await;
            tracing::info!(
                succeeded = report.succeeded,
                failed = report.failed,
                quota_exhausted = report.quota_exhausted,
                "Audio generation batch finished"
            );
        });
        Ok(AudioTrigger::Started { pending: count })
    }

    /// Voice every record in order, then hand over to stitching.
    ///
    /// The guard is released before stitching is triggered.
    pub async fn run_batch(
        &self,
        guard: FlightGuard,
        records: Vec<Assessment>,
        language: Option<VideoLanguage>,
    ) -> AudioBatchReport {
        let mut report = AudioBatchReport::default();

        if !self.has_quota_for(records.len()).await {
            report.quota_exhausted = true;
            return report;
        }

        let total = records.len();
        for (index, record) in records.iter().enumerate() {
            match self.voice_record(record).await {
                Ok(()) => {
                    if let Err(e) = self.store.mark_audio_done(record.id).await {
                        tracing::error!(assessment_id = record.id, error = %e, "Failed to mark audio done");
                    }
                    report.succeeded += 1;
                    tracing::info!(assessment_id = record.id, "Audio generated");
                    if index + 1 < total {
                        tokio::time::sleep(self.timings.inter_record_delay).await;
                    }
                }
                Err(e) => {
                    tracing::error!(assessment_id = record.id, error = %e, "Audio generation failed");
                    let message = format!("Audio generation failed: {e}");
                    if let Err(e) = self.store.mark_audio_failed(record.id, &message).await {
                        tracing::error!(assessment_id = record.id, error = %e, "Failed to mark audio failed");
                    }
                    report.failed += 1;
                }
            }
        }

        drop(guard);
        tracing::info!(language = ?language, "Triggering stitching after audio batch");
        self.stitching.trigger(language);
        report
    }

    async fn has_quota_for(&self, records: usize) -> bool {
        let needed = estimated_quota_cost(records);
        match self.tts.remaining_characters().await {
            Ok(remaining) if remaining < needed => {
                tracing::error!(remaining, needed, "Insufficient speech synthesis quota, aborting batch");
                false
            }
            Ok(remaining) => {
                tracing::info!(remaining, needed, "Speech synthesis quota ok");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not read speech synthesis quota, continuing");
                true
            }
        }
    }

    /// Synthesize and upload both clips for one record.
    pub async fn voice_record(&self, record: &Assessment) -> Result<(), CloudError> {
        let name = resolve_pronunciation(
            record.name_pronunciation.as_deref(),
            &record.dr_first_name,
            &record.dr_last_name,
        );
        let spoken = self.spoken_name(&name).await;
        let language = VideoLanguage::from_stored(&record.video_language);

        let clips = [
            (AudioClip::Greeting, greeting_text(&spoken)),
            (AudioClip::ThankYou, thank_you_text(&spoken)),
        ];
        for (clip, text) in clips {
            let bytes = self.tts.synthesize(&text).await?;
            let object = audio_object(language, &record.employee_code, &record.dr_code, clip);
            self.storage
                .upload(&self.bucket, &object, bytes, AUDIO_CONTENT_TYPE)
                .await?;
            tracing::debug!(assessment_id = record.id, object = %object, "Uploaded audio clip");
        }
        Ok(())
    }

    /// Transliterate each plain word; initials and letters pass through.
    async fn spoken_name(&self, name: &str) -> String {
        let mut words = Vec::new();
        for token in tokenize_name(name) {
            let word = match &token {
                NameToken::Word(word) => match self.transliterator.transliterate(word).await {
                    Ok(Some(script)) => script,
                    Ok(None) => word.clone(),
                    Err(e) => {
                        tracing::warn!(word = %word, error = %e, "Transliteration failed, using original");
                        word.clone()
                    }
                },
                other => other.fallback().to_string(),
            };
            words.push(word);
        }
        words.join(" ")
    }
}
