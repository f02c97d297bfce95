use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::prelude::*;

use pitara::api::QueryClient;
use pitara::config::{Config, Mode};
use pitara::handlers::Handlers;
use pitara::telegram::{self, TelegramClient};
use pitara::{polling, webhook};

#[tokio::main]
async fn main() {
    let mode_arg = std::env::args().nth(1).unwrap_or_else(|| "polling".to_string());
    let Some(mode) = Mode::parse(&mode_arg) else {
        eprintln!("Unknown mode '{mode_arg}' (expected polling, accelerator or webhook)");
        std::process::exit(2);
    };

    if mode == Mode::Accelerator {
        dotenvy::dotenv().ok();
    }

    let config = match Config::from_env(mode) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    std::fs::create_dir_all(&config.log_dir).ok();
    let log_file = tracing_appender::rolling::daily(&config.log_dir, "pitara.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("################################################");
    info!("# Telegram bot name {}", config.bot_name);
    info!("################################################");
    info!("🚀 Starting in {} mode", mode.as_str());
    if mode == Mode::Accelerator {
        info!(concurrent_updates = config.concurrent_updates);
        info!(pool_time_out = config.api.connect_timeout.as_secs());
        info!(connection_pool_size = config.api.pool_size);
    }

    let bot = match telegram::build_bot(&config.telegram_bot_token, &config.api) {
        Ok(bot) => bot,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    let api = match QueryClient::new(&config.api) {
        Ok(api) => api,
        Err(e) => {
            error!("Failed to build API client: {e}");
            std::process::exit(1);
        }
    };
    let handlers = Arc::new(Handlers::new(TelegramClient::new(bot.clone()), api, mode));

    // Only webhook mode carries webhook settings
    match config.webhook.as_ref() {
        Some(webhook_config) => {
            if let Err(e) = webhook::run(bot, handlers, webhook_config, config.concurrent_updates).await {
                error!("{e}");
                std::process::exit(1);
            }
        }
        None => polling::run(bot, handlers, config.concurrent_updates).await,
    }

    info!("👋 Bye");
}
