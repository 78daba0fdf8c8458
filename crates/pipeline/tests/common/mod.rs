//! In-memory collaborators for driving the stages without a network.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use blusanta_cloud::compute::{ComputeProvider, InstanceState};
use blusanta_cloud::storage::{ObjectMetadata, ObjectStorage};
use blusanta_cloud::transliteration::Transliterator;
use blusanta_cloud::tts::SpeechSynthesizer;
use blusanta_cloud::{CloudError, CloudResult};
use blusanta_core::language::VideoLanguage;
use blusanta_core::storage_paths::{audio_object, gs_url, AudioClip};
use blusanta_core::types::DbId;
use blusanta_db::models::assessment::{Assessment, PendingStitch};
use blusanta_db::models::status::StageFlag;
use blusanta_pipeline::{
    AssessmentStore, CampaignConfig, HostRef, Pipeline, PipelineDeps, PipelineTimings,
};
use blusanta_stitcher::{StitchHost, StitchingJobPayload, StitcherApiError};
use chrono::{TimeZone, Utc};
use tokio_util::sync::CancellationToken;

pub const BUCKET: &str = "bkt";
pub const HOST_NAME: &str = "stitch-1";
pub const HOST_IP: &str = "10.0.0.1";

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

struct Row {
    assessment: Assessment,
    videos: [String; 2],
}

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Row>>,
}

/// A fresh English record with both stages pending.
pub fn assessment(id: DbId, dr_first_name: &str) -> Assessment {
    let at = Utc.timestamp_opt(1_700_000_000 + id, 0).unwrap();
    Assessment {
        id,
        employee_code: format!("E{id}"),
        employee_name: "Ravi".into(),
        employee_mobile: "9876543210".into(),
        dr_code: format!("D{id}"),
        dr_first_name: dr_first_name.into(),
        dr_last_name: "Sharma".into(),
        dr_mobile: "9123456780".into(),
        video_language: "English".into(),
        name_pronunciation: None,
        avatar_name: "blusanta".into(),
        audio_generation: 0,
        video_stitch: 0,
        final_video_url: None,
        error_message: None,
        is_regenerated: false,
        video_generated_on: None,
        created_at: at,
        updated_at: at,
    }
}

pub fn doctor_videos(id: DbId) -> [String; 2] {
    [
        format!("gs://{BUCKET}/uploads/{id}_1.mp4"),
        format!("gs://{BUCKET}/uploads/{id}_2.mp4"),
    ]
}

impl MemoryStore {
    pub fn insert(&self, assessment: Assessment) {
        let videos = doctor_videos(assessment.id);
        self.rows.lock().unwrap().push(Row { assessment, videos });
    }

    pub fn get(&self, id: DbId) -> Assessment {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.assessment.id == id)
            .map(|r| r.assessment.clone())
            .expect("assessment exists")
    }

    /// What the completion webhook does.
    pub fn complete_stitch(&self, id: DbId) {
        self.update(id, |a| {
            if a.video_stitch == 0 && a.audio_generation == 1 {
                a.video_stitch = 1;
                a.final_video_url = Some(format!("https://storage.googleapis.com/{BUCKET}/{id}.mp4"));
            }
        });
    }

    fn update(&self, id: DbId, f: impl FnOnce(&mut Assessment)) -> bool {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.assessment.id == id) {
            Some(row) => {
                f(&mut row.assessment);
                true
            }
            None => false,
        }
    }

    fn matching(&self, language: Option<VideoLanguage>, audio: i16) -> Vec<(Assessment, [String; 2])> {
        let rows = self.rows.lock().unwrap();
        let mut found: Vec<_> = rows
            .iter()
            .filter(|r| r.assessment.audio_generation == audio && r.assessment.video_stitch == 0)
            .filter(|r| language.is_none_or(|l| l.label() == r.assessment.video_language))
            .map(|r| (r.assessment.clone(), r.videos.clone()))
            .collect();
        found.sort_by_key(|(a, _)| (a.created_at, a.id));
        found
    }
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn pending_audio(
        &self,
        language: Option<VideoLanguage>,
    ) -> Result<Vec<Assessment>, sqlx::Error> {
        Ok(self.matching(language, 0).into_iter().map(|(a, _)| a).collect())
    }

    async fn pending_stitch(
        &self,
        language: Option<VideoLanguage>,
    ) -> Result<Vec<PendingStitch>, sqlx::Error> {
        Ok(self
            .matching(language, 1)
            .into_iter()
            .map(|(a, [v1, v2])| PendingStitch {
                id: a.id,
                employee_code: a.employee_code,
                dr_code: a.dr_code,
                dr_first_name: a.dr_first_name,
                dr_last_name: a.dr_last_name,
                video_language: a.video_language,
                video1_url: Some(v1),
                video2_url: Some(v2),
                created_at: a.created_at,
            })
            .collect())
    }

    async fn count_pending_audio(&self) -> Result<i64, sqlx::Error> {
        Ok(self.matching(None, 0).len() as i64)
    }

    async fn count_pending_stitch(&self) -> Result<i64, sqlx::Error> {
        Ok(self.matching(None, 1).len() as i64)
    }

    async fn mark_audio_done(&self, id: DbId) -> Result<bool, sqlx::Error> {
        Ok(self.update(id, |a| a.audio_generation = 1))
    }

    async fn mark_audio_failed(&self, id: DbId, message: &str) -> Result<bool, sqlx::Error> {
        Ok(self.update(id, |a| {
            a.audio_generation = -1;
            a.error_message = Some(message.into());
        }))
    }

    async fn mark_stitch_failed(&self, id: DbId, message: &str) -> Result<bool, sqlx::Error> {
        Ok(self.update(id, |a| {
            a.video_stitch = -1;
            a.error_message = Some(message.into());
        }))
    }

    async fn stitch_state(&self, id: DbId) -> Result<Option<StageFlag>, sqlx::Error> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|r| r.assessment.id == id)
            .and_then(|r| StageFlag::from_value(r.assessment.video_stitch)))
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Objects keyed by `gs://` URL with their sizes.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, u64>>,
}

impl MemoryStorage {
    pub fn put(&self, url: &str, size: u64) {
        self.objects.lock().unwrap().insert(url.to_string(), size);
    }

    pub fn contains(&self, url: &str) -> bool {
        self.objects.lock().unwrap().contains_key(url)
    }

    /// Seed the audio clips and doctor videos a record needs for stitching.
    pub fn seed_stitch_inputs(&self, a: &Assessment) {
        for clip in [AudioClip::Greeting, AudioClip::ThankYou] {
            let object = audio_object(VideoLanguage::English, &a.employee_code, &a.dr_code, clip);
            self.put(&gs_url(BUCKET, &object), 2048);
        }
        for video in doctor_videos(a.id) {
            self.put(&video, 1 << 20);
        }
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn metadata(&self, bucket: &str, object: &str) -> CloudResult<Option<ObjectMetadata>> {
        let size = self.objects.lock().unwrap().get(&gs_url(bucket, object)).copied();
        Ok(size.map(|size| ObjectMetadata {
            name: object.to_string(),
            size,
            content_type: None,
            updated: None,
        }))
    }

    async fn upload(
        &self,
        bucket: &str,
        object: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> CloudResult<()> {
        self.put(&gs_url(bucket, object), bytes.len() as u64);
        Ok(())
    }

    async fn signed_upload_url(
        &self,
        bucket: &str,
        object: &str,
        _content_type: &str,
        _ttl: Duration,
    ) -> CloudResult<String> {
        Ok(format!("https://signed.test/{bucket}/{object}"))
    }
}

// ---------------------------------------------------------------------------
// Speech and transliteration
// ---------------------------------------------------------------------------

pub struct FakeTts {
    pub remaining: u64,
    /// Synthesis fails for any text containing this.
    pub fail_on: Option<String>,
    pub texts: Mutex<Vec<String>>,
}

impl Default for FakeTts {
    fn default() -> Self {
        Self {
            remaining: 100_000,
            fail_on: None,
            texts: Mutex::new(Vec::new()),
        }
    }
}

impl FakeTts {
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeTts {
    async fn synthesize(&self, text: &str) -> CloudResult<Vec<u8>> {
        if self.fail_on.as_deref().is_some_and(|f| text.contains(f)) {
            return Err(CloudError::Api {
                service: "ElevenLabs",
                status: 500,
                body: "synthesis failed".into(),
            });
        }
        self.texts.lock().unwrap().push(text.to_string());
        Ok(text.as_bytes().to_vec())
    }

    async fn remaining_characters(&self) -> CloudResult<u64> {
        Ok(self.remaining)
    }
}

#[derive(Default)]
pub struct FakeTransliterator {
    pub words: HashMap<String, String>,
}

#[async_trait]
impl Transliterator for FakeTransliterator {
    async fn transliterate(&self, word: &str) -> CloudResult<Option<String>> {
        Ok(self.words.get(word).cloned())
    }
}

// ---------------------------------------------------------------------------
// Compute
// ---------------------------------------------------------------------------

/// Instances by name. A start moves the instance to `Staging`; the next
/// state read reports it `Running`.
#[derive(Default)]
pub struct FakeCompute {
    states: Mutex<HashMap<String, InstanceState>>,
    ips: Mutex<HashMap<String, String>>,
    pub starts: AtomicUsize,
    pub ip_lookups: AtomicUsize,
}

impl FakeCompute {
    pub fn with_host(self, name: &str, state: InstanceState, ip: Option<&str>) -> Self {
        self.states.lock().unwrap().insert(name.into(), state);
        if let Some(ip) = ip {
            self.ips.lock().unwrap().insert(name.into(), ip.into());
        }
        self
    }
}

#[async_trait]
impl ComputeProvider for FakeCompute {
    async fn instance_state(&self, _zone: &str, name: &str) -> CloudResult<InstanceState> {
        let mut states = self.states.lock().unwrap();
        let state = states.get(name).copied().unwrap_or(InstanceState::Unknown);
        if state == InstanceState::Staging {
            states.insert(name.into(), InstanceState::Running);
        }
        Ok(state)
    }

    async fn start_instance(&self, _zone: &str, name: &str) -> CloudResult<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.states
            .lock()
            .unwrap()
            .insert(name.into(), InstanceState::Staging);
        Ok(())
    }

    async fn external_ip(&self, _zone: &str, name: &str) -> CloudResult<Option<String>> {
        self.ip_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.ips.lock().unwrap().get(name).cloned())
    }
}

// ---------------------------------------------------------------------------
// Stitching host
// ---------------------------------------------------------------------------

/// What the host does with an accepted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostBehavior {
    /// Fires the completion webhook straight away.
    Completes,
    /// Stays busy forever without completing.
    Hangs,
    /// Reports free again without ever completing.
    GoesIdle,
}

pub struct FakeStitchHost {
    store: Arc<MemoryStore>,
    behavior: HostBehavior,
    pub busy: AtomicBool,
    pub rejections: AtomicUsize,
    working: AtomicBool,
    submissions: Mutex<Vec<StitchingJobPayload>>,
}

impl FakeStitchHost {
    pub fn new(store: Arc<MemoryStore>, behavior: HostBehavior) -> Self {
        Self {
            store,
            behavior,
            busy: AtomicBool::new(false),
            rejections: AtomicUsize::new(0),
            working: AtomicBool::new(false),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn submitted_ids(&self) -> Vec<DbId> {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.additional_data.id)
            .collect()
    }

    pub fn submissions(&self) -> Vec<StitchingJobPayload> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl StitchHost for FakeStitchHost {
    async fn is_free(&self, ip: &str) -> bool {
        ip == HOST_IP && !self.busy.load(Ordering::SeqCst) && !self.working.load(Ordering::SeqCst)
    }

    async fn submit(
        &self,
        _ip: &str,
        payload: &StitchingJobPayload,
    ) -> Result<(), StitcherApiError> {
        self.submissions.lock().unwrap().push(payload.clone());
        let rejected = self
            .rejections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(StitcherApiError::ApiError {
                status: 503,
                body: "busy".into(),
            });
        }
        match self.behavior {
            HostBehavior::Completes => self.store.complete_stitch(payload.additional_data.id),
            HostBehavior::Hangs => self.working.store(true, Ordering::SeqCst),
            HostBehavior::GoesIdle => {}
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub storage: Arc<MemoryStorage>,
    pub compute: Arc<FakeCompute>,
    pub tts: Arc<FakeTts>,
    pub host: Arc<FakeStitchHost>,
    pub pipeline: Pipeline,
    pub cancel: CancellationToken,
}

pub struct HarnessBuilder {
    pub behavior: HostBehavior,
    pub tts: FakeTts,
    pub transliterator: FakeTransliterator,
}

impl HarnessBuilder {
    pub fn new(behavior: HostBehavior) -> Self {
        Self {
            behavior,
            tts: FakeTts::default(),
            transliterator: FakeTransliterator::default(),
        }
    }

    pub fn build(self) -> Harness {
        let store = Arc::new(MemoryStore::default());
        let storage = Arc::new(MemoryStorage::default());
        let compute = Arc::new(FakeCompute::default().with_host(
            HOST_NAME,
            InstanceState::Running,
            Some(HOST_IP),
        ));
        let tts = Arc::new(self.tts);
        let host = Arc::new(FakeStitchHost::new(Arc::clone(&store), self.behavior));
        let cancel = CancellationToken::new();

        let deps = PipelineDeps {
            store: store.clone(),
            storage: storage.clone(),
            compute: compute.clone(),
            tts: tts.clone(),
            transliterator: Arc::new(self.transliterator),
            stitch_host: host.clone(),
        };
        let pipeline = Pipeline::new(
            deps,
            &campaign(),
            "https://api.test/",
            PipelineTimings::default(),
            cancel.clone(),
        );

        Harness {
            store,
            storage,
            compute,
            tts,
            host,
            pipeline,
            cancel,
        }
    }
}

pub fn campaign() -> CampaignConfig {
    CampaignConfig {
        avatar_name: "blusanta".into(),
        bucket: BUCKET.into(),
        stitch_hosts: vec![HostRef {
            zone: "us-central1-a".into(),
            name: HOST_NAME.into(),
        }],
        stitch_host_port: 8080,
        stitch_auth_token: "token".into(),
    }
}

impl Harness {
    /// Insert a record whose audio is done and whose inputs exist.
    pub fn insert_ready_for_stitch(&self, id: DbId) {
        let mut a = assessment(id, "Aparna");
        a.audio_generation = 1;
        self.storage.seed_stitch_inputs(&a);
        self.store.insert(a);
    }

    /// Wait (in paused time) until neither stage is running.
    pub async fn settle(&self) {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            if !self.pipeline.audio.is_running() && !self.pipeline.stitching.is_active() {
                break;
            }
        }
    }
}
