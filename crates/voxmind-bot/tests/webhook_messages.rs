mod common;

use axum::http::StatusCode;
use common::*;
use voxmind_bot::render::{FILE_NOT_FOUND, GREETING, LIVENESS_TEXT, PLACEHOLDER_TEXT};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_liveness_returns_status_text() {
    let server = MockServer::start().await;
    forbid_unexpected_calls(&server).await;
    let harness = Harness::new(&test_config(&server, Some("key")));

    let (status, body) = harness.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, LIVENESS_TEXT);
}

#[tokio::test]
async fn test_malformed_bodies_are_acknowledged_without_side_effects() {
    let server = MockServer::start().await;
    forbid_unexpected_calls(&server).await;
    let harness = Harness::new(&test_config(&server, Some("key")));

    for _ in 0..3 {
        for body in ["", "not json", "null", "[1,2,3]", "{\"message\": 5}", "{}"] {
            let (status, text) = harness.post(body).await;
            assert_eq!(status, StatusCode::OK, "body {body:?}");
            assert_eq!(text, "ok", "body {body:?}");
        }
    }

    harness.settle().await;
    assert_eq!(harness.context.tasks().in_flight(), 0);
    server.verify().await;
}

#[tokio::test]
async fn test_start_sends_one_greeting() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(bot_path("sendMessage")))
        .and(body_string_contains(GREETING.replace('\n', "\\n")))
        .and(body_string_contains("\"parse_mode\":\"HTML\""))
        .respond_with(telegram_ok(sent_message(20, GREETING)))
        .expect(1)
        .mount(&server)
        .await;
    forbid_unexpected_calls(&server).await;
    let harness = Harness::new(&test_config(&server, Some("key")));

    let (status, body) = harness.post(text_update("/start")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
    harness.settle().await;
    assert!(harness.context.transcripts().is_empty());
    server.verify().await;
}

#[tokio::test]
async fn test_plain_text_is_ignored() {
    let server = MockServer::start().await;
    forbid_unexpected_calls(&server).await;
    let harness = Harness::new(&test_config(&server, Some("key")));

    let (_, body) = harness.post(text_update("hello there")).await;

    assert_eq!(body, "ok");
    harness.settle().await;
    server.verify().await;
}

#[tokio::test]
async fn test_voice_without_gemini_key_sends_single_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(bot_path("sendMessage")))
        .and(body_string_contains("GEMINI_API_KEY"))
        .respond_with(telegram_ok(sent_message(21, "error")))
        .expect(1)
        .mount(&server)
        .await;
    forbid_unexpected_calls(&server).await;
    let harness = Harness::new(&test_config(&server, None));

    let (_, body) = harness.post(voice_update("voice-1", 2_048)).await;

    assert_eq!(body, "ok");
    harness.settle().await;
    server.verify().await;
}

#[tokio::test]
async fn test_voice_is_transcribed_into_placeholder_with_keyboard() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(bot_path("sendMessage")))
        .and(body_string_contains(PLACEHOLDER_TEXT))
        .respond_with(telegram_ok(sent_message(99, PLACEHOLDER_TEXT)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(bot_path("getFile")))
        .and(body_string_contains("\"file_id\":\"voice-1\""))
        .respond_with(telegram_ok(serde_json::json!({
            "file_id": "voice-1",
            "file_unique_id": "uniq",
            "file_size": 4,
            "file_path": "voice/file_1.oga"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/file/bot{TOKEN}/voice/file_1.oga")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"OggS".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(body_string_contains("\"mime_type\":\"audio/ogg\""))
        .and(body_string_contains("\"data\":\"T2dnUw==\""))
        .respond_with(gemini_text("salam, hello world"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(bot_path("editMessageText")))
        .and(body_string_contains("\"message_id\":99"))
        .and(body_string_contains("📝 <b>متن خام:</b>\\n\\nsalam, hello world"))
        .and(body_string_contains("\"callback_data\":\"do_correct\""))
        .respond_with(telegram_ok(sent_message(99, "edited")))
        .expect(1)
        .mount(&server)
        .await;
    forbid_unexpected_calls(&server).await;
    let harness = Harness::new(&test_config(&server, Some("key")));

    let (_, body) = harness.post(voice_update("voice-1", 4)).await;

    assert_eq!(body, "ok");
    harness.settle().await;
    assert_eq!(
        harness.context.transcripts().get((CHAT_ID, 99)).as_deref(),
        Some("salam, hello world")
    );
    server.verify().await;
}

#[tokio::test]
async fn test_unresolvable_file_edits_placeholder_with_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(bot_path("sendMessage")))
        .respond_with(telegram_ok(sent_message(50, PLACEHOLDER_TEXT)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(bot_path("getFile")))
        .respond_with(telegram_error("Bad Request: invalid file_id"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(bot_path("editMessageText")))
        .and(body_string_contains("\"message_id\":50"))
        .and(body_string_contains(FILE_NOT_FOUND))
        .and(body_string_contains("Bad Request: invalid file_id"))
        .respond_with(telegram_ok(sent_message(50, "edited")))
        .expect(1)
        .mount(&server)
        .await;
    forbid_unexpected_calls(&server).await;
    let harness = Harness::new(&test_config(&server, Some("key")));

    harness.post(voice_update("missing", 4)).await;

    harness.settle().await;
    assert!(harness.context.transcripts().is_empty());
    server.verify().await;
}

#[tokio::test]
async fn test_gemini_failure_edits_placeholder_with_error_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(bot_path("sendMessage")))
        .respond_with(telegram_ok(sent_message(51, PLACEHOLDER_TEXT)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(bot_path("getFile")))
        .respond_with(telegram_ok(serde_json::json!({ "file_path": "voice/a.oga" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/file/bot{TOKEN}/voice/a.oga")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"OggS".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": { "code": 500, "message": "Internal error encountered." }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(bot_path("editMessageText")))
        .and(body_string_contains("❌"))
        .and(body_string_contains("HTTP 500: Internal error encountered."))
        .respond_with(telegram_ok(sent_message(51, "edited")))
        .expect(1)
        .mount(&server)
        .await;
    forbid_unexpected_calls(&server).await;
    let harness = Harness::new(&test_config(&server, Some("key")));

    harness.post(voice_update("voice-2", 4)).await;

    harness.settle().await;
    server.verify().await;
}

#[tokio::test]
async fn test_oversized_voice_is_rejected_before_download() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(bot_path("sendMessage")))
        .respond_with(telegram_ok(sent_message(52, PLACEHOLDER_TEXT)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(bot_path("editMessageText")))
        .and(body_string_contains("❌"))
        .and(body_string_contains("max 20 MB"))
        .respond_with(telegram_ok(sent_message(52, "edited")))
        .expect(1)
        .mount(&server)
        .await;
    forbid_unexpected_calls(&server).await;
    let harness = Harness::new(&test_config(&server, Some("key")));

    harness.post(voice_update("huge", 30 * 1024 * 1024)).await;

    harness.settle().await;
    server.verify().await;
}

#[tokio::test]
async fn test_missing_bot_token_drops_updates() {
    let server = MockServer::start().await;
    forbid_unexpected_calls(&server).await;
    let mut config = test_config(&server, Some("key"));
    config.telegram.bot_token = None;
    let harness = Harness::new(&config);

    let (status, body) = harness.post(voice_update("voice-1", 4)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
    harness.settle().await;
    server.verify().await;
}

#[tokio::test]
async fn test_wrong_secret_token_is_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(bot_path("sendMessage")))
        .respond_with(telegram_ok(sent_message(20, GREETING)))
        .expect(1)
        .mount(&server)
        .await;
    forbid_unexpected_calls(&server).await;
    let mut config = test_config(&server, Some("key"));
    config.telegram.webhook_secret = Some("s3cret".to_string());
    let harness = Harness::new(&config);

    let (_, body) = harness.post(text_update("/start")).await;
    assert_eq!(body, "ok");
    let (_, body) = harness
        .post_with_headers(
            text_update("/start"),
            &[("x-telegram-bot-api-secret-token", "wrong")],
        )
        .await;
    assert_eq!(body, "ok");
    let (_, body) = harness
        .post_with_headers(
            text_update("/start"),
            &[("x-telegram-bot-api-secret-token", "s3cret")],
        )
        .await;
    assert_eq!(body, "ok");

    harness.settle().await;
    server.verify().await;
}

#[tokio::test]
async fn test_file_lookup_gateway_error_reaches_user_with_details() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(bot_path("sendMessage")))
        .respond_with(telegram_ok(sent_message(53, PLACEHOLDER_TEXT)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(bot_path("getFile")))
        .respond_with(
            ResponseTemplate::new(502)
                .insert_header("content-type", "text/html")
                .set_body_string("<html>Bad Gateway</html>"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(bot_path("editMessageText")))
        .and(body_string_contains("\"message_id\":53"))
        .and(body_string_contains("❌"))
        .and(body_string_contains("HTTP 502 Bad Gateway"))
        .and(body_string_contains("&lt;html&gt;Bad Gateway&lt;/html&gt;"))
        .respond_with(telegram_ok(sent_message(53, "edited")))
        .expect(1)
        .mount(&server)
        .await;
    forbid_unexpected_calls(&server).await;
    let harness = Harness::new(&test_config(&server, Some("key")));

    harness.post(voice_update("voice-3", 4)).await;

    harness.settle().await;
    server.verify().await;
}

#[tokio::test]
async fn test_rejected_transcript_edit_falls_back_to_error_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(bot_path("sendMessage")))
        .respond_with(telegram_ok(sent_message(54, PLACEHOLDER_TEXT)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(bot_path("getFile")))
        .respond_with(telegram_ok(serde_json::json!({ "file_path": "voice/b.oga" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/file/bot{TOKEN}/voice/b.oga")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"OggS".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(gemini_text("hello"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(bot_path("editMessageText")))
        .and(body_string_contains("do_correct"))
        .respond_with(telegram_error("Bad Request: message is too long"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(bot_path("editMessageText")))
        .and(body_string_contains("❌"))
        .and(body_string_contains("Bad Request: message is too long"))
        .respond_with(telegram_ok(sent_message(54, "edited")))
        .expect(1)
        .mount(&server)
        .await;
    forbid_unexpected_calls(&server).await;
    let harness = Harness::new(&test_config(&server, Some("key")));

    harness.post(voice_update("voice-4", 4)).await;

    harness.settle().await;
    server.verify().await;
}

#[tokio::test]
async fn test_start_addressed_to_another_bot_is_ignored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(bot_path("sendMessage")))
        .respond_with(telegram_ok(sent_message(20, GREETING)))
        .expect(1)
        .mount(&server)
        .await;
    forbid_unexpected_calls(&server).await;
    let mut config = test_config(&server, Some("key"));
    config.telegram.bot_username = Some("voxmind_bot".to_string());
    let harness = Harness::new(&config);

    harness.post(text_update("/start@other_bot")).await;
    harness.post(text_update("/start@voxmind_bot")).await;

    harness.settle().await;
    server.verify().await;
}
