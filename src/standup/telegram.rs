//! Outbound Telegram client using teloxide.

use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode, ReplyParameters};
use tracing::warn;

/// Thin wrapper over the teloxide `Bot` for sending text.
///
/// Sends are best-effort: failures are logged and surfaced as `Err`, and
/// callers are free to drop them.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Send an HTML-formatted message, optionally as a reply.
    /// Returns the sent message id.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to_message_id: Option<i64>,
    ) -> Result<i64, String> {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html);

        if let Some(msg_id) = reply_to_message_id {
            let reply_params = ReplyParameters::new(MessageId(msg_id as i32));
            request = request.reply_parameters(reply_params);
        }

        request.await.map(|msg| msg.id.0 as i64).map_err(|e| {
            let msg = format!("Failed to send to chat {chat_id}: {e}");
            warn!("{}", msg);
            msg
        })
    }

    /// Reply to a message in its chat.
    pub async fn reply(&self, msg: &Message, text: &str) -> Result<i64, String> {
        self.send_message(msg.chat.id.0, text, Some(msg.id.0 as i64))
            .await
    }
}
