use std::sync::Arc;

use anyhow::Context;
use teloxide::Bot;
use tokio_util::sync::CancellationToken;

use newsbot_core::{
    aggregator::{AggregatorConfig, NewsAggregator},
    audit::Auditor,
    commands::CommandRouter,
    config::Config,
    digest::{DigestConfig, DigestPublisher},
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    preferences::Preferences,
    scheduler::{DigestScheduler, SchedulerConfig},
    subscription::Subscriptions,
};
use newsbot_newsapi::NewsApiClient;
use newsbot_store::SqliteStore;
use newsbot_telegram::TelegramMessenger;

mod health;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    newsbot_core::logging::init("newsbot")?;

    let cfg = Config::load().context("configuration")?;

    let health_cancel = CancellationToken::new();
    let listener = health::bind(cfg.port)
        .await
        .with_context(|| format!("binding health endpoint on port {}", cfg.port))?;
    let health_task = tokio::spawn(health::serve(listener, health_cancel.clone()));

    let store = Arc::new(
        SqliteStore::connect(&cfg.database_url)
            .await
            .context("connecting to database")?,
    );
    let auditor = Auditor::new(store.clone());
    let subscriptions = Subscriptions::new(store.clone(), auditor.clone());
    let preferences = Preferences::new(store.clone(), auditor.clone(), cfg.default_page_size);

    let bot = Bot::new(cfg.telegram_token.clone());
    let bot_username = newsbot_telegram::router::announce(&bot)
        .await
        .context("connecting to telegram")?;

    // Raw Telegram calls retry once on RetryAfter; the throttle keeps digest bursts under limits.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig::from(&cfg),
    ));

    let provider = Arc::new(NewsApiClient::from_config(&cfg)?);
    let aggregator = NewsAggregator::new(provider, AggregatorConfig::from(&cfg));
    let publisher = DigestPublisher::new(
        subscriptions.clone(),
        preferences.clone(),
        aggregator,
        messenger.clone(),
        auditor,
        DigestConfig::from(&cfg),
    );
    let scheduler = DigestScheduler::new(publisher, SchedulerConfig::from(&cfg));
    scheduler.start().await;

    let commands =
        CommandRouter::new(subscriptions, preferences, messenger).with_bot_username(bot_username);
    let polled = newsbot_telegram::router::run_polling(bot, commands).await;

    scheduler.stop().await;
    health_cancel.cancel();
    let _ = health_task.await;
    tracing::info!("newsbot stopped");

    polled
}
