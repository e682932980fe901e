use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{ChatAction, ChatId, MessageEntityKind};
use teloxide::utils::command::BotCommands;
use tracing::info;

use crate::bot::AppState;
use crate::platform::IncomingMessage;
use crate::relay::{self, GREETING, MAX_REPLY_UTF16};

/// Commands addressed to this bot. `/start@other_bot` does not parse.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "say hello")]
    Start,
}

fn incoming_from(msg: &Message) -> Option<IncomingMessage> {
    let text = msg.text()?;
    let user = msg.from.as_ref();
    Some(IncomingMessage {
        chat_id: msg.chat.id.0,
        user_id: user.map(|u| u.id.0),
        user_name: user.map(|u| u.first_name.clone()).unwrap_or_default(),
        text: text.to_string(),
    })
}

/// Non-blank text that Telegram did not mark as a bot command.
pub fn is_plain_text(msg: &Message) -> bool {
    let Some(text) = msg.text() else {
        return false;
    };
    if text.trim().is_empty() {
        return false;
    }

    let starts_with_command = msg
        .entities()
        .unwrap_or_default()
        .iter()
        .any(|e| e.offset == 0 && matches!(e.kind, MessageEntityKind::BotCommand));

    !starts_with_command
}

pub async fn handle_command(bot: Bot, msg: Message, cmd: Command) -> ResponseResult<()> {
    match cmd {
        Command::Start => {
            info!("/start in chat {}", msg.chat.id.0);
            bot.send_message(msg.chat.id, GREETING).await?;
        }
    }
    Ok(())
}

/// Relay one text message to the model and send back exactly one reply.
pub async fn handle_text(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let incoming = match incoming_from(&msg) {
        Some(incoming) => incoming,
        None => return Ok(()),
    };
    let chat_id = ChatId(incoming.chat_id);

    info!(
        "Telegram message from {} ({:?}): {}",
        incoming.user_name, incoming.user_id, incoming.text
    );

    bot.send_chat_action(chat_id, ChatAction::Typing).await.ok();

    let reply = relay::generate_reply(state.model.as_ref(), &incoming.text).await;
    bot.send_message(chat_id, relay::truncate_reply(&reply, MAX_REPLY_UTF16))
        .await?;

    Ok(())
}
