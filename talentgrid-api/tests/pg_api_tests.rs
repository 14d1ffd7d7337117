/// HTTP-level tests for the PostgreSQL-backed routes
///
/// DATABASE_URL=... cargo test --test pg_api_tests -- --ignored

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;
use uuid::Uuid;

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4())
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_apply_to_closed_posting_is_unprocessable() {
    let ctx = TestContext::with_postgres().await;
    let founder = ctx.create_identity(&unique_email("founder")).await;
    let candidate = ctx.create_identity(&unique_email("candidate")).await;
    let org = ctx.create_company("Acme", Some(&founder)).await;

    let (status, posting) = ctx
        .post("/v1/job-postings", TestContext::job_posting(&org, Some(&founder)))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{posting}");
    let job_id = posting["id"].as_str().unwrap().to_string();

    let (status, closed) = ctx
        .send("POST", &format!("/v1/job-postings/{job_id}/close"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["status"], "closed");

    let (status, body) = ctx
        .post(
            &format!("/v1/job-postings/{job_id}/applications"),
            json!({ "candidate_id": candidate }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "job_closed");

    let (_, applications) = ctx
        .get(&format!("/v1/job-postings/{job_id}/applications"))
        .await;
    assert!(applications.as_array().unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_only_participants_post_messages() {
    let ctx = TestContext::with_postgres().await;
    let alice = ctx.create_identity(&unique_email("alice")).await;
    let bob = ctx.create_identity(&unique_email("bob")).await;
    let outsider = ctx.create_identity(&unique_email("outsider")).await;

    let (status, conversation) = ctx
        .post(
            "/v1/conversations",
            json!({ "subject": "Internship", "participant_ids": [alice, bob] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{conversation}");
    let uri = format!(
        "/v1/conversations/{}/messages",
        conversation["id"].as_str().unwrap()
    );

    let (status, body) = ctx
        .post(&uri, json!({ "sender_id": outsider, "body": "hello?" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = ctx
        .post(&uri, json!({ "sender_id": alice, "body": "welcome aboard" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, messages) = ctx.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["sender_id"], alice.as_str());
}
