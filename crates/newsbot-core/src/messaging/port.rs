use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{MessagingCapabilities, ReplyKeyboard},
    Result,
};

/// Outbound side of the chat transport.
///
/// Telegram is the first implementation; command handlers and the digest publisher only see
/// this trait, which keeps them testable with a recording fake.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    /// Send text together with a reply keyboard presenting a list of choices.
    async fn send_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: ReplyKeyboard,
    ) -> Result<MessageRef>;
}
