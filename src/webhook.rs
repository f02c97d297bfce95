//! Webhook transport: an HTTP endpoint feeding a bounded update queue that a
//! single dispatcher task drains.
//!
//! Startup: register webhook, start dispatcher, then serve HTTP.
//! Shutdown: stop HTTP, close the queue, let the dispatcher drain it.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use teloxide::prelude::*;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::WebhookConfig;
use crate::dispatch::{self, BotHandlers, UpdateLimit};
use crate::handlers::Handlers;
use crate::telegram::Messenger;

pub const HEALTH_MESSAGE: &str = "The bot is still running fine :)";

#[derive(Clone)]
struct IngestState {
    queue: mpsc::Sender<Update>,
}

/// `POST /telegram` and `GET /healthcheck`.
pub fn router(queue: mpsc::Sender<Update>) -> Router {
    Router::new()
        .route("/telegram", post(ingest))
        .route("/healthcheck", get(health))
        .with_state(IngestState { queue })
}

/// Always acknowledges: Telegram would otherwise keep redelivering.
async fn ingest(State(state): State<IngestState>, body: Bytes) -> StatusCode {
    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => {
            debug!("Queueing update");
            // Waits for room when the queue is full
            if state.queue.send(update).await.is_err() {
                warn!("Update queue closed, dropping update");
            }
        }
        Err(e) => warn!("Discarding malformed update ({} bytes): {}", body.len(), e),
    }
    StatusCode::OK
}

async fn health() -> &'static str {
    HEALTH_MESSAGE
}

/// Drain `queue`, running at most `concurrency` updates at once.
///
/// A permit is taken before each update is spawned, so with one permit
/// updates run one after another in queue order. Returns once the queue is
/// closed and every in-flight update has finished.
pub fn spawn_dispatcher<M>(
    handlers: Arc<Handlers<M>>,
    mut queue: mpsc::Receiver<Update>,
    bot_username: String,
    concurrency: usize,
) -> JoinHandle<()>
where
    M: Messenger + 'static,
{
    let bot_username: Arc<str> = bot_username.into();
    tokio::spawn(async move {
        let limit = UpdateLimit::new(concurrency);
        let mut in_flight = JoinSet::new();

        while let Some(update) = queue.recv().await {
            let Some(permit) = limit.acquire().await else {
                break;
            };
            let handlers = handlers.clone();
            let bot_username = bot_username.clone();
            in_flight.spawn(async move {
                dispatch::route_update(&handlers, update, &bot_username).await;
                drop(permit);
            });

            while let Some(done) = in_flight.try_join_next() {
                if let Err(e) = done {
                    error!("Update handler panicked: {e}");
                }
            }
        }

        while let Some(done) = in_flight.join_next().await {
            if let Err(e) = done {
                error!("Update handler panicked: {e}");
            }
        }
        info!("Update queue drained");
    })
}

/// Register the webhook and serve until a shutdown signal arrives.
pub async fn run(
    bot: Bot,
    handlers: Arc<BotHandlers>,
    config: &WebhookConfig,
    concurrent_updates: usize,
) -> Result<(), String> {
    let me = bot
        .get_me()
        .await
        .map_err(|e| format!("Failed to get bot info: {e}"))?;
    info!("Bot user ID: {}, username: @{}", me.id, me.username());

    let webhook_url = format!("{}/telegram", config.public_url);
    let url = reqwest::Url::parse(&webhook_url).map_err(|e| format!("Invalid webhook URL '{webhook_url}': {e}"))?;
    bot.set_webhook(url)
        .await
        .map_err(|e| format!("Failed to set webhook: {e}"))?;
    info!("🔗 Webhook set to {}", webhook_url);

    let (tx, rx) = mpsc::channel(config.queue_size);
    let dispatcher = spawn_dispatcher(handlers, rx, me.username().to_string(), concurrent_updates);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .map_err(|e| format!("Failed to bind {}: {e}", config.listen))?;
    info!("🌐 Listening on {}", config.listen);

    let served = axum::serve(listener, router(tx))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // The router owned the only sender; the dispatcher finishes what's queued
    if let Err(e) = dispatcher.await {
        error!("Dispatcher task failed: {e}");
    }

    served.map_err(|e| format!("Server error: {e}"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("🛑 Shutdown signal received");
}
