//! Webhook HTTP surface.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use futures_util::FutureExt;
use tracing::{debug, error, warn};

use crate::bot::BotContext;
use crate::handlers::handle_update;
use crate::render::LIVENESS_TEXT;
use crate::telegram::Update;

/// Body returned to Telegram for every webhook call.
pub const WEBHOOK_ACK: &str = "ok";
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

pub fn router(context: Arc<BotContext>, webhook_path: &str) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route(webhook_path, post(webhook))
        .with_state(context)
}

async fn liveness() -> &'static str {
    LIVENESS_TEXT
}

/// Answers `200 ok` no matter what happens while handling the update.
async fn webhook(
    State(context): State<Arc<BotContext>>,
    headers: HeaderMap,
    body: Bytes,
) -> &'static str {
    if let Some(secret) = context.webhook_secret() {
        let provided = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());
        if provided != Some(secret) {
            warn!("Dropping webhook call with missing or wrong secret token");
            return WEBHOOK_ACK;
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(err) => {
            debug!(error = %err, bytes = body.len(), "Ignoring unparseable webhook body");
            return WEBHOOK_ACK;
        }
    };
    let update_id = update.update_id;

    match AssertUnwindSafe(handle_update(&context, update))
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            error!(update_id, error = %format!("{err:#}"), "Webhook handling error");
        }
        Err(_) => error!(update_id, "Webhook handler panicked"),
    }

    WEBHOOK_ACK
}
