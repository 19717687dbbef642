use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::platform::telegram::{ReplyPayload, TelegramApi};
use crate::platform::Update;
use crate::welcome::compose::{compose_reply, greeted_users};
use crate::welcome::Detector;

/// Shared application state. Built once at startup and never mutated.
pub struct AppState {
    config: Config,
    detector: Detector,
    api: TelegramApi,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let api = TelegramApi::new(
            &config.telegram.bot_token,
            &config.telegram.api_base_url,
            Duration::from_secs(config.telegram.request_timeout_secs),
        )?;
        let detector = Detector::new(config.telegram.chat_id, &config.welcome);
        Ok(Self {
            config,
            detector,
            api,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let path = state.config.server.webhook_path.clone();
    Router::new()
        .route(&path, post(handle_webhook))
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

/// Serve the webhook until Ctrl-C.
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind webhook server to {}", addr))?;

    info!(
        "Webhook server listening on {}{}",
        listener.local_addr()?,
        state.config.server.webhook_path
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Webhook server error")?;

    info!("Webhook server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// 400 when the body is unreadable or not an Update, 200 otherwise.
async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> StatusCode {
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            warn!("Failed to read webhook body: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!("Failed to parse webhook update: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    handle_update(&state, &update).await;

    StatusCode::OK
}

pub async fn handle_update(state: &AppState, update: &Update) {
    let Some(message) = update.message.as_ref() else {
        debug!("Update without message, skipping");
        return;
    };

    let Some(trigger) = state.detector.detect(Some(message)) else {
        debug!(chat_id = message.chat.id, "Message did not trigger a reply");
        return;
    };

    info!(
        %trigger,
        chat_id = message.chat.id,
        thread_id = ?message.message_thread_id,
        from = message.from.id,
        "Greeting {} user(s)",
        greeted_users(message, trigger).len()
    );

    let payload = compose_reply(
        message,
        trigger,
        &state.config.welcome,
        &state.config.links,
        state.config.telegram.thread_id,
    );
    dispatch(&state.api, &payload).await;
}

/// Delivery is best effort: failures are logged and never reach the webhook caller.
async fn dispatch(api: &TelegramApi, payload: &ReplyPayload) {
    match api.send_message(payload).await {
        Ok(status) => info!("Sent welcome message: {}", status),
        Err(e) => error!("Failed to send welcome message: {:#}", e),
    }
}
