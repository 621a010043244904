//! Telegram update handlers.
//!
//! Each inbound text message is converted to a transport-neutral `TextMessage` and handed to
//! the core command router, which replies through the messaging port.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use newsbot_core::{
    domain::{ChatId, UserId},
    messaging::types::TextMessage,
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(inbound) = to_text_message(&msg) else {
        tracing::debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
        return Ok(());
    };

    state.commands.dispatch(&inbound).await;
    Ok(())
}

fn to_text_message(msg: &Message) -> Option<TextMessage> {
    let user = msg.from()?;
    let text = msg.text()?;
    Some(TextMessage {
        chat_id: ChatId(msg.chat.id.0),
        user_id: UserId(user.id.0 as i64),
        username: user.username.clone(),
        text: text.to_string(),
    })
}
