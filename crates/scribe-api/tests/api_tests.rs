//! Integration tests for the SOW API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` against the
//! in-memory store, without starting a TCP server or a database.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use scribe_api::router::build_router;
use scribe_api::state::AppState;
use scribe_core::{Rewriter, parse_template};
use scribe_db::{MemoryStore, RecordStore};
use scribe_types::EmployeeId;
use serde_json::{Value, json};
use tower::ServiceExt;

const TEMPLATE: &str = r#"{
    "documentMetadata": {"templateName": "Statement of Work"},
    "sections": [
        {"sectionOrder": 1, "sectionTitle": "Overview", "questions": [{"questionId": "Q1"}]},
        {"sectionOrder": 2, "sectionTitle": "Scope", "questions": [{"questionId": "Q2"}]}
    ]
}"#;

fn make_router() -> Router {
    let store = RecordStore::Memory(Arc::new(
        MemoryStore::new().with_employee(EmployeeId(42), "Dana Reyes"),
    ));
    let state = AppState::new(store, parse_template(TEMPLATE).unwrap(), Rewriter::Passthrough);
    build_router(Arc::new(state))
}

fn sow_event(lead_id: &str, reference: &str, answer: &str) -> Value {
    json!({
        "sow_template_reference_number": reference,
        "meeting_id": "M1",
        "lead_id": lead_id,
        "lead_name": "Acme Corp",
        "organization_id": 7,
        "organization_name": "Acme",
        "created_by": 42,
        "sections": [{
            "questionsAndAnswers": [
                {"question_id": "Q1", "answers_found": [answer]}
            ]
        }]
    })
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Body) {
    let response = router.clone().oneshot(request).await.unwrap();
    (response.status(), response.into_body())
}

async fn post_json(router: &Router, path: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::post(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, body) = send(router, request).await;
    (status, body_to_json(body).await)
}

async fn get_json(router: &Router, path: &str) -> (StatusCode, Value) {
    let (status, body) = send(router, Request::get(path).body(Body::empty()).unwrap()).await;
    (status, body_to_json(body).await)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_health() {
    let router = make_router();
    let (status, json) = get_json(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["backend"], "memory");
    assert_eq!(json["rewriter"], "passthrough");
}

#[tokio::test]
async fn test_store_sow_assigns_versions() {
    let router = make_router();

    let (status, first) = post_json(&router, "/api/sow", &sow_event("L1", "R1", "a")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["version_number"], 1);
    assert_eq!(first["lead_id"], "L1");
    assert_eq!(
        first["message"],
        "SOW JSON stored for lead_id L1 under reference R1 as version 1."
    );

    let (status, second) = post_json(&router, "/api/sow", &sow_event("L1", "R2", "b")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["version_number"], 2);

    let (status, latest) = get_json(&router, "/api/sow/L1/latest").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["version_number"], 2);
    assert_eq!(latest["is_latest"], true);
    assert_eq!(latest["parent_id"], first["record_id"]);
    assert_eq!(latest["reference_number"], "R2");
}

#[tokio::test]
async fn test_store_sow_rejects_missing_field() {
    let router = make_router();
    let mut event = sow_event("L1", "R1", "a");
    event.as_object_mut().unwrap().remove("created_by");

    let (status, json) = post_json(&router, "/api/sow", &event).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert!(json["error"].as_str().unwrap().contains("created_by"));

    // Nothing was stored.
    let (status, _) = get_json(&router, "/api/sow/L1/latest").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_store_sow_rejects_invalid_json() {
    let router = make_router();
    let request = Request::post("/api/sow")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json = body_to_json(body).await;
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_latest_not_found() {
    let router = make_router();
    let (status, json) = get_json(&router, "/api/sow/nobody/latest").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_list_versions_newest_first() {
    let router = make_router();
    for reference in ["R1", "R2", "R3"] {
        post_json(&router, "/api/sow", &sow_event("L1", reference, "x")).await;
    }

    let (status, json) = get_json(&router, "/api/sow/L1/versions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 3);
    assert_eq!(json["versions"][0]["version_number"], 3);
    assert_eq!(json["versions"][2]["version_number"], 1);
    assert_eq!(json["versions"][2]["is_latest"], false);
}

#[tokio::test]
async fn test_document_json() {
    let router = make_router();
    post_json(
        &router,
        "/api/sow",
        &sow_event("L1", "R1", "Automate reporting"),
    )
    .await;

    let (status, json) = get_json(&router, "/api/sow/L1/document").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["version_number"], 1);
    assert_eq!(json["styles"]["body"]["font"], "Times New Roman");

    let blocks = json["body"]["blocks"].as_array().unwrap();
    assert_eq!(blocks[0]["kind"], "heading");
    assert_eq!(blocks[0]["text"], "Statement of Work");
    assert_eq!(blocks[2]["text"], "Created By: Dana Reyes");

    let heading = blocks
        .iter()
        .position(|b| b["text"] == "1 Overview")
        .unwrap();
    assert_eq!(blocks[heading + 1]["kind"], "paragraph");
    assert_eq!(blocks[heading + 1]["text"], "Automate reporting");
    assert_eq!(blocks[heading + 2]["text"], "2 Scope");
}

#[tokio::test]
async fn test_document_markdown() {
    let router = make_router();
    post_json(
        &router,
        "/api/sow",
        &sow_event("L1", "R1", "Automate reporting"),
    )
    .await;

    let request = Request::get("/api/sow/L1/document?format=markdown")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(content_type.starts_with("text/markdown"));
    let text = body_to_string(response.into_body()).await;
    assert!(text.starts_with("# Statement of Work"));
    assert!(text.contains("## 1 Overview\n\nAutomate reporting\n\n"));
}

#[tokio::test]
async fn test_document_rejects_unknown_format() {
    let router = make_router();
    post_json(&router, "/api/sow", &sow_event("L1", "R1", "a")).await;
    let (status, _) = get_json(&router, "/api/sow/L1/document?format=pdf").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_document_unknown_lead() {
    let router = make_router();
    let (status, _) = get_json(&router, "/api/sow/nobody/document").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_records_paging_and_lookup() {
    let router = make_router();
    post_json(&router, "/api/sow", &sow_event("L1", "R1", "a")).await;
    post_json(&router, "/api/sow", &sow_event("L2", "R2", "b")).await;
    let (_, third) = post_json(&router, "/api/sow", &sow_event("L1", "R3", "c")).await;

    let (status, json) = get_json(&router, "/api/records?limit=2&order=desc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_count"], 3);
    assert_eq!(json["items"].as_array().unwrap().len(), 2);
    assert_eq!(json["items"][0]["id"], third["record_id"]);

    let path = format!("/api/records/{}", third["record_id"]);
    let (status, record) = get_json(&router, &path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["reference_number"], "R3");

    let (status, _) = get_json(&router, "/api/records/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get_json(&router, "/api/records/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get_json(&router, "/api/records?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get_json(&router, "/api/records?order=sideways").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_meeting_answers_round_trip() {
    let router = make_router();
    let event = json!({
        "meeting_id": "M7",
        "answers": {
            "Q10": "Budget?", "A10": "50k",
            "Q2": "Goal?", "A2": "Automate",
            "Q5": "Unanswered?"
        }
    });

    let (status, json) = post_json(&router, "/api/meetings", &event).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["stored"], 2);

    let (status, json) = get_json(&router, "/api/meetings/M7/answers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
    assert_eq!(json["answers"][0]["question_id"], "Q2");
    assert_eq!(json["answers"][1]["answer_text"], "50k");
}

#[tokio::test]
async fn test_meeting_answers_rejects_bad_event() {
    let router = make_router();
    let (status, json) = post_json(&router, "/api/meetings", &json!({"answers": {}})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("meeting_id"));

    let (status, _) = get_json(&router, "/api/meetings/unknown/answers").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bad_query_string_returns_json_error() {
    let router = make_router();

    let (status, json) = get_json(&router, "/api/records?page=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert!(json["error"].as_str().unwrap().contains("page"));

    let (status, json) = get_json(&router, "/api/records?limit=-5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_store_sow_rejects_overlong_fields_before_writing() {
    let router = make_router();

    let mut event = sow_event("L1", "R1", "a");
    event["lead_name"] = json!("x".repeat(256));
    let (status, json) = post_json(&router, "/api/sow", &event).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("lead_name"));

    let event = sow_event(&"L".repeat(65), "R1", "a");
    let (status, _) = post_json(&router, "/api/sow", &event).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&router, "/api/sow/L1/latest").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_meeting_answers_rejects_out_of_range_question() {
    let router = make_router();
    let event = json!({
        "meeting_id": "M9",
        "answers": {"Q4294967296": "Goal?", "A4294967296": "Automate"}
    });
    let (status, json) = post_json(&router, "/api/meetings", &event).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("out of range"));

    let (status, _) = get_json(&router, "/api/meetings/M9/answers").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
