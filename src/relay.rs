//! Platform-agnostic relay logic: what to reply to each inbound message.

use tracing::error;

use crate::llm::TextGenerator;

pub const GREETING: &str = "Hello! Ask me anything, and I'll reply using 🤖";
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't generate a response.";

/// Telegram's limit, counted in UTF-16 code units.
pub const MAX_REPLY_UTF16: usize = 4096;

/// Ask the model for a reply. Never fails: errors become `"Error: <message>"`.
pub async fn generate_reply(model: &dyn TextGenerator, prompt: &str) -> String {
    match model.generate_content(prompt).await {
        Ok(Some(text)) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => FALLBACK_REPLY.to_string(),
        Err(e) => {
            error!("Error generating reply: {:#}", e);
            format!("Error: {:#}", e)
        }
    }
}

/// Cut `text` so it fits in `max_units` UTF-16 code units, on a char boundary.
pub fn truncate_reply(text: &str, max_units: usize) -> &str {
    let mut units = 0;
    for (idx, ch) in text.char_indices() {
        units += ch.len_utf16();
        if units > max_units {
            return &text[..idx];
        }
    }
    text
}
