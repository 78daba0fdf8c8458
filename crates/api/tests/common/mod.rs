#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use blusanta_api::config::ServerConfig;
use blusanta_api::router::build_app_router;
use blusanta_api::state::AppState;
use blusanta_cloud::compute::{ComputeProvider, InstanceState};
use blusanta_cloud::messaging::Messenger;
use blusanta_cloud::storage::{ObjectMetadata, ObjectStorage};
use blusanta_cloud::transliteration::Transliterator;
use blusanta_cloud::tts::SpeechSynthesizer;
use blusanta_cloud::CloudResult;
use blusanta_core::types::DbId;
use blusanta_db::models::assessment::{Assessment, SubmitAssessment};
use blusanta_db::repositories::AssessmentRepo;
use blusanta_events::{EventBus, Notifier, PipelineEvent, TemplateIds};
use blusanta_pipeline::{CampaignConfig, PgAssessmentStore, Pipeline, PipelineDeps, PipelineTimings};
use blusanta_stitcher::{StitchHost, StitcherApiError, StitchingJobPayload};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const BUCKET: &str = "bkt";
pub const AVATAR: &str = "blusanta";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        max_body_bytes: 64 * 1024,
        shutdown_timeout_secs: 30,
        webhook_base_url: "http://api.test".to_string(),
    }
}

/// No stitching hosts, so a triggered stitching loop stops right away.
pub fn test_campaign() -> CampaignConfig {
    CampaignConfig {
        avatar_name: AVATAR.to_string(),
        bucket: BUCKET.to_string(),
        stitch_hosts: Vec::new(),
        stitch_host_port: 8080,
        stitch_auth_token: "token".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<(String, String), u64>>,
}

impl MemoryStorage {
    pub fn put(&self, bucket: &str, object: &str, size: u64) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), object.to_string()), size);
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn metadata(&self, bucket: &str, object: &str) -> CloudResult<Option<ObjectMetadata>> {
        let objects = self.objects.lock().unwrap();
        Ok(objects
            .get(&(bucket.to_string(), object.to_string()))
            .map(|size| ObjectMetadata {
                name: object.to_string(),
                size: *size,
                content_type: Some("video/mp4".to_string()),
                updated: Some("2026-01-01T00:00:00Z".to_string()),
            }))
    }

    async fn upload(
        &self,
        bucket: &str,
        object: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> CloudResult<()> {
        self.put(bucket, object, bytes.len() as u64);
        Ok(())
    }

    async fn signed_upload_url(
        &self,
        bucket: &str,
        object: &str,
        _content_type: &str,
        ttl: Duration,
    ) -> CloudResult<String> {
        Ok(format!(
            "https://signed.test/{bucket}/{object}?X-Goog-Expires={}",
            ttl.as_secs()
        ))
    }
}

/// A sent WhatsApp template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub template_id: String,
    pub destination: String,
    pub params: Vec<String>,
}

#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingMessenger {
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_template(
        &self,
        template_id: &str,
        destination: &str,
        params: &[String],
    ) -> CloudResult<()> {
        self.sent.lock().unwrap().push(SentMessage {
            template_id: template_id.to_string(),
            destination: destination.to_string(),
            params: params.to_vec(),
        });
        Ok(())
    }
}

/// Reports no quota so a triggered audio batch aborts without touching records.
struct NoQuotaTts;

#[async_trait]
impl SpeechSynthesizer for NoQuotaTts {
    async fn synthesize(&self, _text: &str) -> CloudResult<Vec<u8>> {
        Ok(Vec::new())
    }

    async fn remaining_characters(&self) -> CloudResult<u64> {
        Ok(0)
    }
}

struct NoTransliteration;

#[async_trait]
impl Transliterator for NoTransliteration {
    async fn transliterate(&self, _word: &str) -> CloudResult<Option<String>> {
        Ok(None)
    }
}

struct NoCompute;

#[async_trait]
impl ComputeProvider for NoCompute {
    async fn instance_state(&self, _zone: &str, _name: &str) -> CloudResult<InstanceState> {
        Ok(InstanceState::Terminated)
    }

    async fn start_instance(&self, _zone: &str, _name: &str) -> CloudResult<()> {
        Ok(())
    }

    async fn external_ip(&self, _zone: &str, _name: &str) -> CloudResult<Option<String>> {
        Ok(None)
    }
}

struct BusyHost;

#[async_trait]
impl StitchHost for BusyHost {
    async fn is_free(&self, _ip: &str) -> bool {
        false
    }

    async fn submit(
        &self,
        _ip: &str,
        _payload: &StitchingJobPayload,
    ) -> Result<(), StitcherApiError> {
        Ok(())
    }
}

pub fn templates() -> TemplateIds {
    TemplateIds {
        upload_success: "tpl-success".to_string(),
        upload_failure: "tpl-failure".to_string(),
        video_ready: "tpl-ready".to_string(),
        reupload: "tpl-reupload".to_string(),
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// The application router plus handles on its fakes.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub storage: Arc<MemoryStorage>,
    pub messenger: Arc<RecordingMessenger>,
    pub events: broadcast::Receiver<PipelineEvent>,
}

impl TestApp {
    pub fn new(pool: PgPool) -> Self {
        let config = test_config();
        let campaign = test_campaign();
        let storage = Arc::new(MemoryStorage::default());
        let messenger = Arc::new(RecordingMessenger::default());
        let notifier = Arc::new(Notifier::new(messenger.clone(), templates()));
        let event_bus = Arc::new(EventBus::default());
        let events = event_bus.subscribe();

        let deps = PipelineDeps {
            store: Arc::new(PgAssessmentStore::new(pool.clone(), AVATAR)),
            storage: storage.clone(),
            compute: Arc::new(NoCompute),
            tts: Arc::new(NoQuotaTts),
            transliterator: Arc::new(NoTransliteration),
            stitch_host: Arc::new(BusyHost),
        };
        let pipeline = Arc::new(Pipeline::new(
            deps,
            &campaign,
            &config.webhook_base_url,
            PipelineTimings::default(),
            CancellationToken::new(),
        ));

        let state = AppState {
            pool: pool.clone(),
            config: Arc::new(config.clone()),
            campaign: Arc::new(campaign),
            storage: storage.clone(),
            notifier,
            event_bus,
            pipeline,
        };

        Self {
            router: build_app_router(state, &config),
            pool,
            storage,
            messenger,
            events,
        }
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        get(self.router.clone(), uri).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response<Body> {
        post_json(self.router.clone(), uri, body).await
    }

    /// Store both response videos referenced by [`submission`].
    pub fn upload_videos(&self, dr_code: &str) {
        self.storage.put(BUCKET, &format!("uploads/{dr_code}_1.mp4"), 2048);
        self.storage.put(BUCKET, &format!("uploads/{dr_code}_2.mp4"), 2048);
    }

    /// Events published so far, in order.
    pub fn drain_events(&mut self) -> Vec<PipelineEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    TestApp::new(pool).router
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A valid upload-form body for `dr_code`.
pub fn submission(dr_code: &str) -> Value {
    serde_json::json!({
        "employeeCode": "E100",
        "employeeName": "Ravi Kumar",
        "employeeMobile": "9876543210",
        "drCode": dr_code,
        "drFirstName": "Aparna",
        "drLastName": "Rao",
        "drMobile": "9123456780",
        "videoLanguage": "English",
        "namePronunciation": "Apurna",
        "videos": {
            "video1": format!("gs://{BUCKET}/uploads/{dr_code}_1.mp4"),
            "video2": format!("https://storage.googleapis.com/{BUCKET}/uploads/{dr_code}_2.mp4"),
        }
    })
}

/// Insert a record directly, bypassing the HTTP layer and its background trigger.
pub async fn seed_assessment(pool: &PgPool, dr_code: &str) -> Assessment {
    let input: SubmitAssessment = serde_json::from_value(submission(dr_code)).unwrap();
    let (assessment, _) = AssessmentRepo::upsert_submission(pool, AVATAR, &input.trimmed())
        .await
        .unwrap();
    assessment
}

/// Poll until `check` holds for the record, for up to two seconds.
pub async fn wait_for_record(
    pool: &PgPool,
    id: DbId,
    check: impl Fn(&Assessment) -> bool,
) -> Assessment {
    for _ in 0..40 {
        let record = AssessmentRepo::find_by_id(pool, id).await.unwrap().unwrap();
        if check(&record) {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("assessment {id} never reached the expected state");
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
