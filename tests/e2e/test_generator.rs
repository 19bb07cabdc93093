use crate::e2e::helpers;

use helpers::assertions::{assert_failure, assert_report_totals};
use helpers::fixtures;
use helpers::TestContext;
use hyper::StatusCode;
use lesson_forge::domain::content::{CefrLevel, ContentType};
use serde_json::json;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_generate_a_full_queue(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/api/generator/queue", &json!({ "amount_per_genre": 1 }))
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let report = response.body.as_ref().unwrap();

    // 1 topic x 6 levels x 2 content types
    assert_report_totals(report, 12, 12);
    assert!(report["failures"].as_array().unwrap().is_empty());

    assert_eq!(ctx.store.article_count(), 12);
    assert_eq!(ctx.llm.calls_for("topics"), 2);
    assert_eq!(ctx.llm.calls_for("article"), 12);
    assert_eq!(ctx.llm.calls_for("article_rating"), 12);
    assert_eq!(ctx.tts.passage_calls(), 12);
    assert_eq!(ctx.tts.word_calls(), 12);
    assert_eq!(ctx.images.generated(), 12);
    assert!(ctx.store.error_logs().is_empty());
    ctx.assert_staging_empty();
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_store_every_artifact_of_a_unit(ctx: &TestContext) {
    let request = fixtures::request(ContentType::Fiction, CefrLevel::B2);

    let response = ctx
        .client
        .post("/api/generator/article", &request)
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let report = response.body.as_ref().unwrap();
    assert_report_totals(report, 1, 1);

    let content_id = report["content_ids"][0].as_str().unwrap();
    let stored = ctx.store.article(content_id).expect("article stored");

    assert_eq!(stored.request, request);
    assert_eq!(stored.article.title, "The Lighthouse Keeper");
    assert_eq!(stored.questions.len(), 3);
    assert_eq!(stored.article.average_rating, 4);
    assert_eq!(stored.word_list.len(), 2);
    assert_eq!(stored.timepoints.len(), 3);
    assert_eq!(stored.word_timepoints.len(), 2);
    assert_eq!(
        stored.word_timepoints[1].source_file,
        format!("{}_words_0.mp3", content_id)
    );
    assert_eq!(
        stored.image_key.as_deref(),
        Some(format!("images/{}.png", content_id).as_str())
    );

    let keys = ctx.blobs.keys();
    assert!(keys.contains(&format!("audios/{}_0.mp3", content_id)));
    assert!(keys.contains(&format!("audios-words/{}_words_0.mp3", content_id)));
    assert!(keys.contains(&format!("images/{}.png", content_id)));
    assert!(ctx.blobs.deleted().is_empty());
    ctx.assert_staging_empty();
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_out_of_range_amounts(ctx: &TestContext) {
    for amount in [0, 21] {
        let response = ctx
            .client
            .post("/api/generator/queue", &json!({ "amount_per_genre": amount }))
            .await
            .unwrap();

        response
            .assert_status(StatusCode::BAD_REQUEST)
            .assert_error_message("amount_per_genre");
    }

    assert_eq!(ctx.llm.total_calls(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_an_empty_topic(ctx: &TestContext) {
    let mut request = fixtures::request(ContentType::Nonfiction, CefrLevel::A1);
    request.topic = "   ".to_string();

    let response = ctx
        .client
        .post("/api/generator/article", &request)
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("topic cannot be empty");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_malformed_bodies(ctx: &TestContext) {
    let response = ctx
        .client
        .post_raw("/api/generator/article", r#"{"content_type":"poetry"}"#)
        .await
        .unwrap();

    assert!(response.status.is_client_error());
    assert_eq!(ctx.llm.total_calls(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_echo_the_caller_request_id(ctx: &TestContext) {
    let request = fixtures::request(ContentType::Fiction, CefrLevel::A2);

    let response = ctx
        .client
        .post_with_headers(
            "/api/generator/article",
            &request,
            &[("x-request-id", "run-42")],
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.header("x-request-id").map(String::as_str), Some("run-42"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_cancelled_units_after_shutdown(ctx: &TestContext) {
    ctx.shutdown.cancel();
    let request = fixtures::request(ContentType::Fiction, CefrLevel::C1);

    let response = ctx
        .client
        .post("/api/generator/article", &request)
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let report = response.body.as_ref().unwrap();
    assert_report_totals(report, 1, 0);
    assert_failure(&report["failures"][0], "article", "cancelled");
    assert_eq!(ctx.llm.total_calls(), 0);
}
