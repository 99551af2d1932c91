use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};
use voxmind_core::config::Config;

use crate::telegram::TelegramClient;

pub mod bot;
mod correct;
mod handlers;
pub mod render;
pub mod server;
pub mod telegram;
mod transcribe;

pub use bot::BotContext;
pub use server::router;

pub async fn run() -> Result<()> {
    let config = Config::load().context("Failed to load voxmind config")?;
    run_with_config(config).await
}

pub async fn run_with_config(mut config: Config) -> Result<()> {
    let addr = config.server.socket_addr()?;

    if config.bot_token().is_none() {
        warn!("BOT_TOKEN is not set; updates will be acknowledged but not answered");
    }
    if config.gemini_api_key().is_none() {
        warn!("GEMINI_API_KEY is not set; voice messages will be rejected");
    }
    info!(
        model = %config.gemini.model,
        max_concurrent = config.tasks.max_concurrent,
        "Configuration loaded"
    );

    resolve_bot_username(&mut config).await;
    let context = Arc::new(BotContext::from_config(&config));
    register_webhook(&context, &config).await;

    let app = router(Arc::clone(&context), &config.server.webhook_path);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, webhook_path = %config.server.webhook_path, "voxmind-bot listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!(
        in_flight = context.tasks().in_flight(),
        "Server stopped; waiting for background tasks"
    );
    context.tasks().shutdown().await;
    Ok(())
}

/// Fills in the bot username from `getMe` when it isn't configured.
async fn resolve_bot_username(config: &mut Config) {
    if config.bot_username().is_some() {
        return;
    }
    let Some(token) = config.bot_token() else {
        return;
    };
    let client = TelegramClient::new(token.to_string(), &config.telegram.api_base_url);
    match client.get_me().await {
        Ok(me) => {
            info!(username = ?me.username, "Resolved bot identity");
            config.telegram.bot_username = me.username;
        }
        Err(err) => warn!(
            error = %format!("{err:#}"),
            "getMe failed; commands addressed as /start@username will be ignored"
        ),
    }
}

async fn register_webhook(context: &BotContext, config: &Config) {
    let (Some(client), Some(url)) = (context.telegram(), config.webhook_url()) else {
        return;
    };
    match client.set_webhook(url, config.webhook_secret()).await {
        Ok(()) => info!(%url, "Webhook registered"),
        Err(err) => warn!(%url, error = %err, "Failed to register webhook"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("Shutdown signal received");
}
