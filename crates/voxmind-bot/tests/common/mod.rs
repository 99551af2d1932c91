//! Shared setup for webhook integration tests.
//!
//! Telegram and Gemini both point at one `MockServer`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use voxmind_bot::{BotContext, router};
use voxmind_core::config::Config;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-token";
pub const CHAT_ID: i64 = 42;
pub const GEMINI_PATH: &str = "/models/gemini-test:generateContent";

pub fn bot_path(method: &str) -> String {
    format!("/bot{TOKEN}/{method}")
}

pub fn test_config(server: &MockServer, gemini_key: Option<&str>) -> Config {
    let mut config = Config::default();
    config.telegram.bot_token = Some(TOKEN.to_string());
    config.telegram.api_base_url = server.uri();
    config.gemini.api_key = gemini_key.map(str::to_string);
    config.gemini.base_url = server.uri();
    config.gemini.model = "gemini-test".to_string();
    config
}

pub struct Harness {
    pub app: Router,
    pub context: Arc<BotContext>,
}

impl Harness {
    pub fn new(config: &Config) -> Self {
        let context = Arc::new(BotContext::from_config(config));
        let app = router(Arc::clone(&context), &config.server.webhook_path);
        Self { app, context }
    }

    pub async fn post(&self, body: impl Into<Body>) -> (StatusCode, String) {
        self.post_with_headers(body, &[]).await
    }

    pub async fn post_with_headers(
        &self,
        body: impl Into<Body>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, String) {
        let mut request = Request::post("/webhook").header("content-type", "application/json");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = self
            .app
            .clone()
            .oneshot(request.body(body.into()).unwrap())
            .await
            .unwrap();
        read_response(response).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        let response = self
            .app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        read_response(response).await
    }

    /// Waits for every background task spawned so far.
    pub async fn settle(&self) {
        self.context.tasks().drain().await;
    }
}

async fn read_response(response: axum::response::Response) -> (StatusCode, String) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Fails verification if any request reaches the server that no other mock claims.
pub async fn forbid_unexpected_calls(server: &MockServer) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .with_priority(u8::MAX)
        .expect(0)
        .named("unexpected outbound call")
        .mount(server)
        .await;
}

pub fn telegram_ok(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": result }))
}

pub fn telegram_error(description: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({
        "ok": false,
        "error_code": 400,
        "description": description
    }))
}

pub fn sent_message(message_id: i64, text: &str) -> Value {
    json!({
        "message_id": message_id,
        "date": 1_700_000_000,
        "chat": { "id": CHAT_ID, "type": "private" },
        "text": text
    })
}

pub fn gemini_text(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    }))
}

pub fn text_update(text: &str) -> String {
    json!({
        "update_id": 1,
        "message": {
            "message_id": 10,
            "date": 1_700_000_000,
            "chat": { "id": CHAT_ID, "type": "private" },
            "from": { "id": 7, "is_bot": false, "first_name": "Sara" },
            "text": text
        }
    })
    .to_string()
}

pub fn voice_update(file_id: &str, file_size: u64) -> String {
    json!({
        "update_id": 2,
        "message": {
            "message_id": 11,
            "date": 1_700_000_000,
            "chat": { "id": CHAT_ID, "type": "private" },
            "from": { "id": 7, "is_bot": false, "first_name": "Sara" },
            "voice": {
                "file_id": file_id,
                "file_unique_id": "uniq",
                "duration": 4,
                "mime_type": "audio/ogg",
                "file_size": file_size
            }
        }
    })
    .to_string()
}

pub fn callback_update(data: &str, message_id: i64, message_text: Option<&str>) -> String {
    let mut message = json!({
        "message_id": message_id,
        "date": 1_700_000_000,
        "chat": { "id": CHAT_ID, "type": "private" }
    });
    if let Some(text) = message_text {
        message["text"] = json!(text);
    }
    json!({
        "update_id": 3,
        "callback_query": {
            "id": "cbq-1",
            "from": { "id": 7, "is_bot": false, "first_name": "Sara" },
            "chat_instance": "ci",
            "data": data,
            "message": message
        }
    })
    .to_string()
}
