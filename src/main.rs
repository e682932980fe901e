use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use gemini_relay_bot::bot::{self, AppState};
use gemini_relay_bot::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    gemini_relay_bot::init_logging();

    let config = Config::load(gemini_relay_bot::config_path_arg().as_deref())?;

    info!("Configuration loaded successfully");
    info!("  Model: {}", config.gemini.model);

    let state = Arc::new(AppState::new(config)?);

    info!("🤖 Bot is running...");
    bot::run(state).await?;

    Ok(())
}
