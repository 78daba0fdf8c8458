//! Operator endpoints.

mod common;

use axum::http::StatusCode;
use blusanta_db::repositories::assessment_repo::SKIPPED_BY_ADMIN;
use blusanta_db::repositories::AssessmentRepo;
use common::{body_json, post_empty, seed_assessment, TestApp};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn stats_count_each_stage(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    seed_assessment(&pool, "D1").await;
    let voiced = seed_assessment(&pool, "D2").await;
    AssessmentRepo::mark_audio_done(&pool, voiced.id).await.unwrap();
    let failed = seed_assessment(&pool, "D3").await;
    AssessmentRepo::mark_audio_failed(&pool, failed.id, "boom").await.unwrap();

    let json = body_json(app.get("/api/admin/stats").await).await;
    assert_eq!(json["data"]["total"], 3);
    assert_eq!(json["data"]["pending_audio"], 1);
    assert_eq!(json["data"]["pending_stitch"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_all_returns_every_record(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    seed_assessment(&pool, "D1").await;
    seed_assessment(&pool, "D2").await;

    let json = body_json(app.get("/api/admin/assessments").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn skip_fails_both_stages(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let record = seed_assessment(&pool, "D1").await;

    let response = post_empty(
        app.router.clone(),
        &format!("/api/admin/assessments/{}/skip", record.id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["audio_generation"], -1);
    assert_eq!(json["data"]["video_stitch"], -1);
    assert_eq!(json["data"]["error_message"], SKIPPED_BY_ADMIN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn reset_returns_record_to_pending(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let record = seed_assessment(&pool, "D1").await;
    AssessmentRepo::mark_audio_failed(&pool, record.id, "boom").await.unwrap();

    let response = post_empty(
        app.router.clone(),
        &format!("/api/admin/assessments/{}/reset", record.id),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["audio_generation"], 0);
    assert_eq!(json["data"]["video_stitch"], 0);
    assert!(json["data"]["error_message"].is_null());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn regenerate_accepts_optional_pronunciation(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let record = seed_assessment(&pool, "D1").await;
    let uri = format!("/api/admin/assessments/{}/regenerate", record.id);

    let json = body_json(post_empty(app.router.clone(), &uri).await).await;
    assert_eq!(json["data"]["name_pronunciation"], "Apurna");
    assert_eq!(json["data"]["is_regenerated"], true);

    let json = body_json(
        app.post_json(&uri, json!({ "name_pronunciation": "Aparnaa" }))
            .await,
    )
    .await;
    assert_eq!(json["data"]["name_pronunciation"], "Aparnaa");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn actions_on_missing_record_return_404(pool: PgPool) {
    let app = TestApp::new(pool);
    for action in ["reset", "skip", "regenerate"] {
        let response = post_empty(
            app.router.clone(),
            &format!("/api/admin/assessments/404/{action}"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{action}");
    }
}
