//! Route-level tests: the axum router is driven with `oneshot`, no socket.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use kbb_agent::AgentVariant;
use kbb_gateway::{Gateway, GatewayConfig};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn wiki_router(dir: &TempDir) -> Router {
    let config = GatewayConfig::new()
        .with_variant(AgentVariant::Wiki)
        .with_data_dir(dir.path().join("LTM"));
    Gateway::from_config(config)
        .expect("wiki gateway should build")
        .build_router()
}

fn post_message(content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/message")
        .header(header::CONTENT_TYPE, content_type)
        .body(body.into())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn wiki_envelope(request_id: &str, text: &str) -> String {
    json!({
        "request_id": request_id,
        "agent_name": "KnowledgeBaseBuilderAgent",
        "intent": "update_wiki",
        "input": { "text": text, "metadata": { "update_mode": "overwrite" } },
        "context": { "user_id": "u1" }
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// POST /message
// ---------------------------------------------------------------------------
#[tokio::test]
async fn test_message_success() {
    let dir = TempDir::new().unwrap();
    let response = wiki_router(&dir)
        .oneshot(post_message("application/json", wiki_envelope("t1", "# Wiki\n\nHello")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["request_id"], "t1");
    assert_eq!(body["output"]["details"]["wiki_size"], 13);
}

#[tokio::test]
async fn test_validation_errors_are_200_envelopes() {
    let dir = TempDir::new().unwrap();
    let request = json!({
        "request_id": "t2",
        "agent_name": "KnowledgeBaseBuilderAgent",
        "intent": "delete_everything",
        "input": { "text": "x" },
        "context": { "user_id": "u1" }
    });

    let response = wiki_router(&dir)
        .oneshot(post_message("application/json", request.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["type"], "UNSUPPORTED_INTENT");
    assert!(body["output"].is_null());
}

#[tokio::test]
async fn test_wrong_content_type_is_400() {
    let dir = TempDir::new().unwrap();
    let response = wiki_router(&dir)
        .oneshot(post_message("text/plain", wiki_envelope("t3", "x")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Content-Type must be application/json");
}

#[tokio::test]
async fn test_unparsable_body_is_400() {
    let dir = TempDir::new().unwrap();
    let response = wiki_router(&dir)
        .oneshot(post_message("application/json; charset=utf-8", "{ nope"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Invalid JSON format");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_non_object_json_is_invalid_json_envelope() {
    let dir = TempDir::new().unwrap();
    let response = wiki_router(&dir)
        .oneshot(post_message("application/json", "[1, 2, 3]"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["error"]["type"], "INVALID_JSON");
}

// ---------------------------------------------------------------------------
// GET /health and GET /
// ---------------------------------------------------------------------------
#[tokio::test]
async fn test_health_route() {
    let dir = TempDir::new().unwrap();
    let response = wiki_router(&dir)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["request_id"], "health-check");
    assert_eq!(body["output"]["result"], "I'm up and ready");
    assert!(!dir.path().join("LTM").join("cache.json").exists());
}

#[tokio::test]
async fn test_index_metadata() {
    let dir = TempDir::new().unwrap();
    let response = wiki_router(&dir)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(body["service"], "KnowledgeBaseBuilderAgent API");
    assert_eq!(body["variant"], "wiki");
    assert_eq!(body["intents"], json!(["update_wiki", "health_check"]));
    assert!(body["endpoints"]["POST /message"].is_string());
}

// ---------------------------------------------------------------------------
// Startup
// ---------------------------------------------------------------------------
#[test]
fn test_tasks_variant_needs_api_key() {
    let dir = TempDir::new().unwrap();
    let mut config = GatewayConfig::new()
        .with_variant(AgentVariant::Tasks)
        .with_data_dir(dir.path());
    config.llm.api_key_env = "KBB_GATEWAY_TEST_KEY_NEVER_SET".to_string();

    let err = Gateway::from_config(config).unwrap_err();
    assert!(err.to_string().contains("KBB_GATEWAY_TEST_KEY_NEVER_SET not configured"));
}
