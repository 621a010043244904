use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*, types::BotCommand};

use newsbot_core::commands::{menu, CommandRouter};

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub commands: CommandRouter,
}

/// Telegram command menu built from the core command table.
pub fn bot_commands() -> Vec<BotCommand> {
    menu()
        .into_iter()
        .map(|(name, description)| BotCommand::new(name, description))
        .collect()
}

/// Log the bot identity and register the command menu once. Returns the bot's username.
pub async fn announce(bot: &Bot) -> anyhow::Result<String> {
    let me = bot.get_me().await?;
    tracing::info!(id = me.id.0, username = %me.username(), "logged in to telegram");

    bot.set_my_commands(bot_commands()).await?;
    tracing::info!(commands = bot_commands().len(), "command menu registered");
    Ok(me.username().to_string())
}

/// Long-poll for updates until Ctrl-C.
pub async fn run_polling(bot: Bot, commands: CommandRouter) -> anyhow::Result<()> {
    let state = Arc::new(AppState { commands });

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("telegram dispatcher stopped");
    Ok(())
}
