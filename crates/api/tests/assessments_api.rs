//! Submission, lookup and listing of assessments.

mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use blusanta_core::pipeline_events::{EVENT_SUBMITTED, EVENT_UPLOAD_REJECTED};
use blusanta_db::repositories::AssessmentRepo;
use blusanta_events::payloads::Submitted;
use common::{body_json, submission, TestApp};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn submit_creates_pending_record(pool: PgPool) {
    let mut app = TestApp::new(pool.clone());
    app.upload_videos("12345678");

    let response = app.post_json("/api/submit-assessment", submission("12345678")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["created"], true);
    assert_eq!(json["message"], "Assessment submitted successfully");
    let id = json["assessment_id"].as_i64().unwrap();

    let record = AssessmentRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(record.dr_code, "12345678");
    assert_eq!(record.avatar_name, common::AVATAR);
    assert_eq!(record.audio_generation, 0);
    assert_eq!(record.video_stitch, 0);

    let events = app.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EVENT_SUBMITTED);
    assert_eq!(events[0].assessment_id, Some(id));
    assert_matches!(
        events[0].decode::<Submitted>(),
        Some(Submitted { recipient, created: true, .. }) if recipient.doctor_name == "Aparna Rao"
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn resubmission_overwrites_same_record(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    app.upload_videos("12345678");

    let first = body_json(app.post_json("/api/submit-assessment", submission("12345678")).await).await;
    let id = first["assessment_id"].as_i64().unwrap();
    AssessmentRepo::mark_audio_failed(&pool, id, "boom").await.unwrap();

    let mut body = submission("12345678");
    body["namePronunciation"] = json!("Aparnaa");
    let second = body_json(app.post_json("/api/submit-assessment", body).await).await;

    assert_eq!(second["assessment_id"].as_i64().unwrap(), id);
    assert_eq!(second["created"], false);

    let record = AssessmentRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(record.name_pronunciation.as_deref(), Some("Aparnaa"));
    assert_eq!(record.audio_generation, 0);
    assert!(record.error_message.is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn submit_rejects_wrong_video_count(pool: PgPool) {
    let mut app = TestApp::new(pool);
    let mut body = submission("12345678");
    body["videos"] = json!({ "video1": "gs://bkt/uploads/a.mp4" });

    let response = app.post_json("/api/submit-assessment", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("got 1"));

    let events = app.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EVENT_UPLOAD_REJECTED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn submit_requires_pronunciation(pool: PgPool) {
    let app = TestApp::new(pool);
    app.upload_videos("12345678");
    let mut body = submission("12345678");
    body["namePronunciation"] = json!("   ");

    let response = app.post_json("/api/submit-assessment", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Name pronunciation is required for audio generation.");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn submit_rejects_unknown_language(pool: PgPool) {
    let app = TestApp::new(pool);
    app.upload_videos("12345678");
    let mut body = submission("12345678");
    body["videoLanguage"] = json!("Tamil");

    let response = app.post_json("/api/submit-assessment", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn submit_rejects_missing_upload(pool: PgPool) {
    let mut app = TestApp::new(pool.clone());
    app.storage.put(common::BUCKET, "uploads/12345678_1.mp4", 10);

    let response = app.post_json("/api/submit-assessment", submission("12345678")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Video for key \"video2\" not found in storage"));

    assert!(AssessmentRepo::find_by_dr_code(&pool, "12345678")
        .await
        .unwrap()
        .is_none());
    let events = app.drain_events();
    assert_eq!(events[0].event_type, EVENT_UPLOAD_REJECTED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn submit_normalizes_language_label(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    app.upload_videos("12345678");
    let mut body = submission("12345678");
    body["videoLanguage"] = json!("hindi");

    let json = body_json(app.post_json("/api/submit-assessment", body).await).await;
    let id = json["assessment_id"].as_i64().unwrap();
    let record = AssessmentRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(record.video_language, "Hindi");
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn get_assessment_includes_videos(pool: PgPool) {
    let app = TestApp::new(pool);
    app.upload_videos("12345678");
    let created = body_json(app.post_json("/api/submit-assessment", submission("12345678")).await).await;
    let id = created["assessment_id"].as_i64().unwrap();

    let response = app.get(&format!("/api/assessment/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], id);
    assert_eq!(json["data"]["dr_code"], "12345678");
    assert_eq!(json["data"]["videos"]["video1"], "gs://bkt/uploads/12345678_1.mp4");
    assert!(json["data"]["videos"]["video2"].is_string());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn get_missing_assessment_returns_404(pool: PgPool) {
    let app = TestApp::new(pool);
    let response = app.get("/api/assessment/999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_filters_by_status(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let pending = common::seed_assessment(&pool, "D1").await;
    let failed = common::seed_assessment(&pool, "D2").await;
    AssessmentRepo::mark_stitch_failed(&pool, failed.id, "boom").await.unwrap();

    let all = body_json(app.get("/api/assessments").await).await;
    assert_eq!(all["data"].as_array().unwrap().len(), 2);

    let json = body_json(app.get("/api/assessments?status=failed").await).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], failed.id);

    let json = body_json(app.get("/api/assessments?status=pending").await).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], pending.id);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_rejects_unknown_status(pool: PgPool) {
    let app = TestApp::new(pool);
    let response = app.get("/api/assessments?status=sideways").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
