use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use teloxide::dispatching::{DefaultKey, DispatcherBuilder, HandlerExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::RequestError;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::llm::{GeminiClient, TextGenerator};
use crate::platform::telegram::{self, Command};
use crate::shutdown::Shutdown;

/// Shared application state, built once at startup
pub struct AppState {
    pub config: Config,
    pub model: Box<dyn TextGenerator>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let model = GeminiClient::new(config.gemini.clone())?;
        Ok(Self::with_model(config, Box::new(model)))
    }

    pub fn with_model(config: Config, model: Box<dyn TextGenerator>) -> Self {
        Self { config, model }
    }
}

/// `/start` gets the greeting, plain text goes to the relay; anything else
/// falls through to the default handler.
pub fn schema() -> UpdateHandler<RequestError> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(telegram::handle_command),
        )
        .branch(
            dptree::filter(|msg: Message| telegram::is_plain_text(&msg))
                .endpoint(telegram::handle_text),
        )
}

fn dispatcher(state: Arc<AppState>) -> DispatcherBuilder<Bot, RequestError, DefaultKey> {
    let bot = Bot::new(&state.config.telegram.bot_token);

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
}

/// Long-poll until Ctrl-C.
pub async fn run(state: Arc<AppState>) -> Result<()> {
    info!("Starting Telegram bot...");

    dispatcher(state)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Telegram bot stopped");
    Ok(())
}

/// Long-poll until `shutdown` is triggered.
pub async fn run_until(state: Arc<AppState>, shutdown: Shutdown) {
    info!("Starting Telegram bot...");

    let mut dispatcher = dispatcher(state).build();
    let token = dispatcher.shutdown_token();

    let stop = async {
        shutdown.wait().await;
        info!("Stopping Telegram bot...");
        // Fails while the dispatcher is still starting up
        while token.shutdown().is_err() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        std::future::pending::<()>().await
    };

    tokio::select! {
        _ = dispatcher.dispatch() => {}
        _ = stop => {}
    }

    info!("Telegram bot stopped");
}

/// Run the receive loop on its own OS thread with a current-thread runtime.
pub fn spawn_background(state: Arc<AppState>, shutdown: Shutdown) -> Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("telegram-bot".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!("Failed to build bot runtime: {}", e);
                    return;
                }
            };
            info!("🤖 Bot is running...");
            runtime.block_on(run_until(state, shutdown));
        })
        .context("Failed to spawn bot thread")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Silent;

    #[async_trait]
    impl TextGenerator for Silent {
        async fn generate_content(&self, _prompt: &str) -> Result<Option<String>> {
            Ok(None)
        }
    }

    #[test]
    fn test_state_keeps_config() {
        let mut config = Config::default();
        config.telegram.bot_token = "123:abc".to_string();
        let state = AppState::with_model(config, Box::new(Silent));
        assert_eq!(state.config.telegram.bot_token, "123:abc");
    }
}
