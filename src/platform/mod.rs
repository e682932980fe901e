pub mod telegram;

/// A text message received from the chat platform, alive for one request.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Platform-specific chat ID
    pub chat_id: i64,
    /// Platform-specific user ID, if the message has a sender
    pub user_id: Option<u64>,
    /// Display name of the sender
    pub user_name: String,
    /// The message text
    pub text: String,
}
