use crate::domain::{ChatId, UserId};

/// An inbound text message from the chat transport.
///
/// Telegram-specific fields stay in the Telegram adapter.
#[derive(Clone, Debug)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub text: String,
}

/// Reply keyboard: each button sends its label back as a message when tapped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
}

impl ReplyKeyboard {
    /// One button per row, each labelled `{prefix}{option}`.
    pub fn one_per_row(prefix: &str, options: &[String]) -> Self {
        Self {
            rows: options
                .iter()
                .map(|opt| vec![format!("{prefix}{opt}")])
                .collect(),
        }
    }
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_reply_keyboards: bool,
    pub max_message_len: usize,
}
