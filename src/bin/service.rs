//! Service variant: HTTP liveness endpoint plus the Telegram bot.
//!
//! The bot's receive loop runs on its own thread with a current-thread
//! runtime; the HTTP server runs on the main runtime. Ctrl-C stops both.

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use gemini_relay_bot::bot::{self, AppState};
use gemini_relay_bot::config::Config;
use gemini_relay_bot::server;
use gemini_relay_bot::shutdown::Shutdown;

#[tokio::main]
async fn main() -> Result<()> {
    gemini_relay_bot::init_logging();

    let config = Config::load(gemini_relay_bot::config_path_arg().as_deref())?;

    info!("Configuration loaded successfully");
    info!("  Model: {}", config.gemini.model);
    info!("  Bind address: {}", config.server.bind_address);

    let bind_address = config.server.bind_address.clone();
    let state = Arc::new(AppState::new(config)?);
    let shutdown = Shutdown::new();

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                return;
            }
            info!("Ctrl-C received, shutting down");
            shutdown.trigger();
        }
    });

    let bot_thread = bot::spawn_background(state, shutdown.clone())?;

    let served = server::serve(&bind_address, shutdown.clone()).await;

    // Stop the bot too if the server exited on its own.
    shutdown.trigger();
    let joined = tokio::task::spawn_blocking(move || bot_thread.join()).await?;
    if joined.is_err() {
        error!("Bot thread panicked");
    }

    served
}
