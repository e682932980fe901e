//! Telegram ↔ Gemini relay.
//!
//! Each text message sent to the bot is forwarded to Gemini and the generated
//! text is sent back to the same chat. Two binaries share this library: the
//! plain long-polling bot, and a service that also answers an HTTP liveness
//! route while the bot runs on a background thread.

pub mod bot;
pub mod config;
pub mod llm;
pub mod platform;
pub mod relay;
pub mod server;
pub mod shutdown;

use std::path::PathBuf;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gemini_relay_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Config file named by the first CLI argument, if any.
pub fn config_path_arg() -> Option<PathBuf> {
    std::env::args().nth(1).map(PathBuf::from)
}
