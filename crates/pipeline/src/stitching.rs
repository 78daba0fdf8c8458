//! The stitching dispatch loop.
//!
//! Takes the oldest record whose audio is ready, validates its inputs,
//! submits it to a free stitching host and waits for the completion webhook
//! to flip its stitch flag. One job is in flight at a time; the loop exits
//! when nothing is pending.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use blusanta_core::language::VideoLanguage;
use blusanta_core::storage_paths::normalize_video_url;
use blusanta_core::types::DbId;
use blusanta_db::models::assessment::PendingStitch;
use blusanta_db::models::status::StageFlag;
use blusanta_stitcher::{StitchHost, StitchJobInputs, StitchingJobPayload};
use futures::future::join_all;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::capacity::CapacityManager;
use crate::error::PipelineError;
use crate::single_flight::SingleFlight;
use crate::store::AssessmentStore;
use crate::validator::AssetValidator;

// ---------------------------------------------------------------------------
// Timings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DispatchTimings {
    /// Wait when every host is busy.
    pub busy_backoff: Duration,
    /// Wait after a host refuses a submission.
    pub rejected_backoff: Duration,
    /// Interval between completion checks.
    pub poll_interval: Duration,
    /// Host status is probed only after this much waiting...
    pub probe_after: Duration,
    /// ...and then at multiples of this.
    pub probe_every: Duration,
    /// Give up on a job after this long.
    pub completion_timeout: Duration,
    /// Pause between jobs.
    pub inter_job_pause: Duration,
    /// Pause after an unexpected per-job error.
    pub error_pause: Duration,
}

impl Default for DispatchTimings {
    fn default() -> Self {
        Self {
            busy_backoff: Duration::from_secs(120),
            rejected_backoff: Duration::from_secs(30),
            poll_interval: Duration::from_secs(10),
            probe_after: Duration::from_secs(60),
            probe_every: Duration::from_secs(30),
            completion_timeout: Duration::from_secs(40 * 60),
            inter_job_pause: Duration::from_secs(5),
            error_pause: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of asking the loop to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StitchTrigger {
    Started,
    /// A run is already in progress, working on `current` if anything.
    AlreadyActive { current: Option<DbId> },
}

/// How a single dispatched job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// The webhook marked the record done.
    Completed,
    /// Inputs were missing; the record is marked failed.
    InvalidInputs,
    /// The host refused the job; the record is untouched.
    Rejected,
    /// The host went idle without the webhook arriving; the record is
    /// untouched and keeps its original deadline.
    HostIdleEarly,
    /// Something else moved the record out of pending while we waited.
    Superseded,
    /// No completion within the deadline; the record is marked failed.
    TimedOut,
    Cancelled,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Inputs shared by every job payload.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub bucket: String,
    /// Public base URL of this API, for the completion webhook.
    pub webhook_base_url: String,
    pub timings: DispatchTimings,
}

pub struct StitchingDispatcher {
    store: Arc<dyn AssessmentStore>,
    capacity: CapacityManager,
    hosts: Arc<dyn StitchHost>,
    validator: AssetValidator,
    settings: DispatchSettings,
    lock: Arc<SingleFlight>,
    current: Mutex<Option<DbId>>,
    cancel: CancellationToken,
}

impl StitchingDispatcher {
    pub fn new(
        store: Arc<dyn AssessmentStore>,
        capacity: CapacityManager,
        hosts: Arc<dyn StitchHost>,
        validator: AssetValidator,
        settings: DispatchSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            capacity,
            hosts,
            validator,
            settings,
            lock: SingleFlight::new("stitching-queue"),
            current: Mutex::new(None),
            cancel,
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock.is_busy()
    }

    /// The assessment currently being stitched.
    pub fn current(&self) -> Option<DbId> {
        self.current.lock().map(|c| *c).unwrap_or(None)
    }

    fn set_current(&self, id: Option<DbId>) {
        if let Ok(mut current) = self.current.lock() {
            *current = id;
        }
    }

    /// Start the loop in the background unless it is already running.
    pub fn trigger(self: &Arc<Self>, language: Option<VideoLanguage>) -> StitchTrigger {
        let Some(guard) = self.lock.try_acquire() else {
            tracing::info!(current = ?self.current(), "Stitching queue already active");
            return StitchTrigger::AlreadyActive {
                current: self.current(),
            };
        };

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = guard;
            tracing::info!(language = ?language, "Stitching queue activated");
            if let Err(e) = this.run(language).await {
                tracing::error!(error = %e, "Stitching queue stopped on error");
            }
            this.set_current(None);
            tracing::info!("Stitching queue deactivated");
        });
        StitchTrigger::Started
    }

    /// Process pending records until none remain.
    ///
    /// A record whose host went idle early is picked up again, but the
    /// completion deadline runs from its first submission in this run.
    ///
    /// Callers are expected to hold the stitching lock; [`Self::trigger`]
    /// does.
    pub async fn run(&self, language: Option<VideoLanguage>) -> Result<(), PipelineError> {
        let mut addresses = self.capacity.ensure_running().await?;
        let timings = &self.settings.timings;
        let mut first_dispatched: HashMap<DbId, Instant> = HashMap::new();

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let pending = self.store.pending_stitch(language).await?;
            let Some(job) = pending.into_iter().next() else {
                tracing::info!("No assessments pending stitching");
                break;
            };

            let Some(ip) = self.first_free(&addresses).await else {
                tracing::info!(
                    wait_secs = timings.busy_backoff.as_secs(),
                    "No free stitching host, waiting"
                );
                addresses = self.capacity.ensure_running().await?;
                if !self.pause(timings.busy_backoff).await {
                    break;
                }
                continue;
            };

            let started = *first_dispatched.entry(job.id).or_insert_with(Instant::now);
            let budget = timings.completion_timeout.saturating_sub(started.elapsed());
            if budget.is_zero() {
                first_dispatched.remove(&job.id);
                self.fail_timed_out(job.id).await?;
                continue;
            }

            self.set_current(Some(job.id));
            let outcome = self.dispatch(&job, &ip, budget).await;
            if !matches!(outcome, Ok(JobOutcome::HostIdleEarly)) {
                first_dispatched.remove(&job.id);
            }
            let pause = match outcome {
                Ok(JobOutcome::Cancelled) => break,
                Ok(JobOutcome::InvalidInputs) => Duration::ZERO,
                Ok(JobOutcome::Rejected) => timings.rejected_backoff,
                Ok(outcome) => {
                    tracing::info!(assessment_id = job.id, ?outcome, "Stitching job finished");
                    timings.inter_job_pause
                }
                Err(e) => {
                    tracing::error!(assessment_id = job.id, error = %e, "Error stitching assessment");
                    timings.error_pause + timings.inter_job_pause
                }
            };
            self.set_current(None);

            if !self.pause(pause).await {
                break;
            }
        }
        Ok(())
    }

    /// Validate, submit and wait up to `budget` for one record.
    pub async fn dispatch(
        &self,
        job: &PendingStitch,
        ip: &str,
        budget: Duration,
    ) -> Result<JobOutcome, PipelineError> {
        let video = |url: &Option<String>| normalize_video_url(url.as_deref().unwrap_or_default());
        let inputs = StitchJobInputs {
            assessment_id: job.id,
            employee_code: &job.employee_code,
            dr_code: &job.dr_code,
            dr_first_name: &job.dr_first_name,
            dr_last_name: &job.dr_last_name,
            language: VideoLanguage::from_stored(&job.video_language),
            doctor_videos: [video(&job.video1_url), video(&job.video2_url)],
            bucket: &self.settings.bucket,
            webhook_base_url: &self.settings.webhook_base_url,
        };

        tracing::info!(
            assessment_id = job.id,
            employee_code = %job.employee_code,
            dr_code = %job.dr_code,
            "Validating stitching inputs"
        );
        let report = match self.validator.validate(&inputs.assets_to_validate()).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(assessment_id = job.id, error = %e, "Asset validation failed");
                self.store
                    .mark_stitch_failed(job.id, &format!("Validation failed: {e}"))
                    .await?;
                return Ok(JobOutcome::InvalidInputs);
            }
        };
        if !report.all_valid() {
            let summary = report.failure_summary();
            tracing::error!(assessment_id = job.id, missing = %summary, "Stitching inputs missing");
            self.store
                .mark_stitch_failed(job.id, &format!("Missing files: {summary}"))
                .await?;
            return Ok(JobOutcome::InvalidInputs);
        }

        let payload = StitchingJobPayload::build(&inputs);
        match self.hosts.submit(ip, &payload).await {
            Ok(()) => {}
            Err(e) if e.is_rejection() => {
                tracing::warn!(assessment_id = job.id, host = %ip, error = %e, "Stitching host rejected job");
                return Ok(JobOutcome::Rejected);
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(assessment_id = job.id, host = %ip, "Stitching job submitted");

        self.await_completion(job.id, ip, budget).await
    }

    async fn await_completion(
        &self,
        id: DbId,
        ip: &str,
        budget: Duration,
    ) -> Result<JobOutcome, PipelineError> {
        let timings = &self.settings.timings;
        let mut waited = Duration::ZERO;

        while waited < budget {
            if !self.pause(timings.poll_interval).await {
                return Ok(JobOutcome::Cancelled);
            }
            waited += timings.poll_interval;

            match self.store.stitch_state(id).await {
                Ok(Some(StageFlag::Done)) => {
                    tracing::info!(assessment_id = id, waited_secs = waited.as_secs(), "Stitching completed");
                    return Ok(JobOutcome::Completed);
                }
                Ok(Some(StageFlag::Pending)) => {}
                Ok(_) => {
                    tracing::warn!(assessment_id = id, "Assessment left pending while stitching");
                    return Ok(JobOutcome::Superseded);
                }
                Err(e) => {
                    tracing::error!(assessment_id = id, error = %e, "Failed to read stitch state");
                    continue;
                }
            }

            if self.probe_due(waited) && self.hosts.is_free(ip).await {
                tracing::error!(
                    assessment_id = id,
                    host = %ip,
                    "Host idle but stitch incomplete"
                );
                return Ok(JobOutcome::HostIdleEarly);
            }

            tracing::debug!(assessment_id = id, waited_secs = waited.as_secs(), "Waiting for stitching");
        }

        self.fail_timed_out(id).await?;
        Ok(JobOutcome::TimedOut)
    }

    async fn fail_timed_out(&self, id: DbId) -> Result<(), PipelineError> {
        let minutes = self.settings.timings.completion_timeout.as_secs() / 60;
        tracing::error!(assessment_id = id, minutes, "Stitching timed out");
        self.store
            .mark_stitch_failed(id, &format!("Stitching timeout after {minutes} minutes"))
            .await?;
        Ok(())
    }

    fn probe_due(&self, waited: Duration) -> bool {
        let timings = &self.settings.timings;
        let every = timings.probe_every.as_millis();
        waited > timings.probe_after && every > 0 && waited.as_millis() % every == 0
    }

    async fn first_free(&self, addresses: &[String]) -> Option<String> {
        let probes = join_all(addresses.iter().map(|ip| self.hosts.is_free(ip))).await;
        addresses
            .iter()
            .zip(probes)
            .find_map(|(ip, free)| free.then(|| ip.clone()))
    }

    /// Sleep unless cancelled. Returns `false` on cancellation.
    async fn pause(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
