use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use translingua::{Dispatcher, Gemini, TranslationRequest, TranslationResult};

const FIRST: &str = "gemini-3-flash-preview";
const SECOND: &str = "gemini-2.5-flash";

#[derive(Debug, Clone)]
struct RecordedCall {
    model: String,
    key: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct FakeGemini {
    script: Arc<HashMap<String, (StatusCode, Value)>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl FakeGemini {
    fn new(script: Vec<(&str, StatusCode, Value)>) -> Self {
        let script = script
            .into_iter()
            .map(|(model, status, body)| (model.to_string(), (status, body)))
            .collect();
        Self {
            script: Arc::new(script),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }
}

async fn generate(
    State(fake): State<FakeGemini>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let model = call
        .strip_suffix(":generateContent")
        .unwrap_or(&call)
        .to_string();
    fake.calls.lock().expect("calls lock").push(RecordedCall {
        model: model.clone(),
        key: headers
            .get("x-goog-api-key")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string()),
        body,
    });
    let (status, body) = fake.script.get(&model).cloned().unwrap_or((
        StatusCode::NOT_FOUND,
        json!({"error": {"code": 404, "message": "unknown model", "status": "NOT_FOUND"}}),
    ));
    (status, Json(body))
}

async fn spawn_fake(fake: FakeGemini) -> String {
    let app = Router::new()
        .route("/v1/models/:call", post(generate))
        .with_state(fake);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{}/v1/models", addr)
}

fn dispatcher(base_url: &str) -> Dispatcher<Gemini> {
    let gemini = Gemini::new("test-key").with_base_url(base_url);
    Dispatcher::new(gemini, vec![FIRST.to_string(), SECOND.to_string()]).expect("dispatcher")
}

fn text_response(text: &str) -> Value {
    json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}, "finishReason": "STOP"}]
    })
}

#[tokio::test]
async fn quota_error_falls_back_to_second_model() {
    let fake = FakeGemini::new(vec![
        (
            FIRST,
            StatusCode::TOO_MANY_REQUESTS,
            json!({"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}),
        ),
        (SECOND, StatusCode::OK, text_response("Bonjour")),
    ]);
    let base_url = spawn_fake(fake.clone()).await;

    let request = TranslationRequest::text("Hello", "English", "French");
    let result = dispatcher(&base_url).dispatch(&request).await;

    assert_eq!(
        result,
        TranslationResult::Translated {
            text: "Bonjour".to_string(),
            model: SECOND.to_string(),
        }
    );
    let calls = fake.calls();
    assert_eq!(
        calls.iter().map(|call| call.model.as_str()).collect::<Vec<_>>(),
        vec![FIRST, SECOND]
    );
    assert_eq!(calls[0].key.as_deref(), Some("test-key"));
    let parts = &calls[1].body["contents"][0]["parts"];
    assert!(
        parts[0]["text"]
            .as_str()
            .unwrap_or_default()
            .contains("from English to French")
    );
    assert_eq!(parts[1]["text"], "Hello");
}

#[tokio::test]
async fn attachment_is_sent_inline() {
    let fake = FakeGemini::new(vec![(FIRST, StatusCode::OK, text_response("Exit"))]);
    let base_url = spawn_fake(fake.clone()).await;

    let request =
        TranslationRequest::binary(b"jpeg".to_vec(), Some("image/jpeg"), "German", "English")
            .expect("request");
    let result = dispatcher(&base_url).dispatch(&request).await;

    assert_eq!(result.text(), "Exit");
    let calls = fake.calls();
    assert_eq!(calls.len(), 1);
    let parts = &calls[0].body["contents"][0]["parts"];
    assert_eq!(parts[0]["inline_data"]["mime_type"], "image/jpeg");
    assert_eq!(parts[0]["inline_data"]["data"], "anBlZw==");
    assert!(parts[1]["text"].is_string());
}

#[tokio::test]
async fn server_error_stops_without_fallback() {
    let fake = FakeGemini::new(vec![
        (
            FIRST,
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": {"code": 500, "message": "internal error", "status": "INTERNAL"}}),
        ),
        (SECOND, StatusCode::OK, text_response("unused")),
    ]);
    let base_url = spawn_fake(fake.clone()).await;

    let request = TranslationRequest::text("Hello", "English", "Hindi");
    let result = dispatcher(&base_url).dispatch(&request).await;

    assert_eq!(
        result.text(),
        "Technical Error (gemini-3-flash-preview): 500 Internal Server Error. internal error | status: INTERNAL"
    );
    assert_eq!(fake.calls().len(), 1);
}

#[tokio::test]
async fn retired_models_report_overload() {
    let fake = FakeGemini::new(Vec::new());
    let base_url = spawn_fake(fake.clone()).await;

    let request = TranslationRequest::text("Hello", "English", "Hindi");
    let result = dispatcher(&base_url).dispatch(&request).await;

    assert!(!result.is_translated());
    assert!(result.text().starts_with("⚠️ Service Overloaded."));
    assert!(
        result
            .text()
            .ends_with("(Error: 404 Not Found. unknown model | status: NOT_FOUND)")
    );
    assert_eq!(fake.calls().len(), 2);
}

#[tokio::test]
async fn unreachable_endpoint_is_a_technical_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let request = TranslationRequest::text("Hello", "English", "Hindi");
    let result = dispatcher(&format!("http://{}/v1/models", addr))
        .dispatch(&request)
        .await;

    assert!(
        result
            .text()
            .starts_with("Technical Error (gemini-3-flash-preview): request failed:")
    );
    assert!(result.text().contains("os error"), "{}", result.text());
}
