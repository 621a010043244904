//! Digest delivery: fetch, format and send news to every active user.

use std::sync::Arc;

use crate::{
    aggregator::NewsAggregator,
    audit::{AuditOutcome, Auditor},
    config::Config,
    domain::{ChatId, UserId},
    errors::Error,
    formatting::format_digest,
    messaging::port::MessagingPort,
    news::ArticleSet,
    preferences::Preferences,
    store::{PreferenceKind, User},
    subscription::Subscriptions,
    Result,
};

const INITIATOR: &str = "NewsAggregator";

#[derive(Clone, Copy, Debug)]
pub struct DigestConfig {
    /// Articles per outbound message.
    pub group_size: usize,
    /// Hard cap on a single outbound message.
    pub max_message_len: usize,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            group_size: 3,
            max_message_len: 4000,
        }
    }
}

impl From<&Config> for DigestConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            group_size: cfg.digest_group_size,
            max_message_len: cfg.telegram_safe_limit,
        }
    }
}

/// Summary of one publish run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub users: usize,
    pub users_with_news: usize,
    pub messages_sent: usize,
    pub send_failures: usize,
}

#[derive(Clone)]
pub struct DigestPublisher {
    subscriptions: Subscriptions,
    preferences: Preferences,
    aggregator: NewsAggregator,
    messenger: Arc<dyn MessagingPort>,
    auditor: Auditor,
    cfg: DigestConfig,
}

impl DigestPublisher {
    pub fn new(
        subscriptions: Subscriptions,
        preferences: Preferences,
        aggregator: NewsAggregator,
        messenger: Arc<dyn MessagingPort>,
        auditor: Auditor,
        cfg: DigestConfig,
    ) -> Self {
        Self {
            subscriptions,
            preferences,
            aggregator,
            messenger,
            auditor,
            cfg,
        }
    }

    /// Send a digest to every active user.
    ///
    /// Only the active-user listing can fail the run; per-user fetch and send failures are
    /// logged and counted.
    pub async fn publish_news(&self) -> Result<PublishReport> {
        let users = self.subscriptions.active_users().await?;
        let mut report = PublishReport {
            users: users.len(),
            ..PublishReport::default()
        };

        for user in &users {
            let (sent, failed) = self.deliver(user).await;
            if sent + failed > 0 {
                report.users_with_news += 1;
            }
            report.messages_sent += sent;
            report.send_failures += failed;
        }

        tracing::info!(
            users = report.users,
            users_with_news = report.users_with_news,
            messages_sent = report.messages_sent,
            send_failures = report.send_failures,
            "news published"
        );
        Ok(report)
    }

    /// Articles from the user's preferred sources.
    pub async fn source_news(&self, user_id: UserId) -> Result<ArticleSet> {
        let res = async {
            let prefs = self.preferences.get(PreferenceKind::Source, user_id).await?;
            self.aggregator
                .fetch_by_sources(&prefs.items, prefs.page_size)
                .await
        }
        .await;
        self.auditor
            .record(
                INITIATOR,
                "getSourceNews",
                user_id,
                AuditOutcome::from_ok(res.is_ok()),
            )
            .await;
        res
    }

    /// Articles from the user's preferred categories.
    pub async fn category_news(&self, user_id: UserId) -> Result<ArticleSet> {
        let res = async {
            let prefs = self
                .preferences
                .get(PreferenceKind::Category, user_id)
                .await?;
            Ok::<_, Error>(
                self.aggregator
                    .fetch_by_categories(&prefs.items, prefs.page_size)
                    .await,
            )
        }
        .await;
        let ok = matches!(&res, Ok(set) if set.failed_requests == 0);
        self.auditor
            .record(
                INITIATOR,
                "getCategoryNews",
                user_id,
                AuditOutcome::from_ok(ok),
            )
            .await;
        res
    }

    /// Returns `(sent, failed)` message counts for one user.
    async fn deliver(&self, user: &User) -> (usize, usize) {
        let (sources, categories) = tokio::join!(
            self.source_news(user.user_id),
            self.category_news(user.user_id)
        );
        let sources = self.or_empty(user.user_id, "source", sources);
        let categories = self.or_empty(user.user_id, "category", categories);

        if sources.is_empty() && categories.is_empty() {
            tracing::debug!(user_id = user.user_id.0, "no news for user, skipping");
            return (0, 0);
        }

        let mut sent = 0;
        let mut failed = 0;
        for set in [&sources, &categories] {
            let (s, f) = self.send_letter(user.chat_id, set).await;
            sent += s;
            failed += f;
        }
        (sent, failed)
    }

    async fn send_letter(&self, chat_id: ChatId, news: &ArticleSet) -> (usize, usize) {
        if news.is_empty() {
            return (0, 0);
        }
        let max_len = self
            .cfg
            .max_message_len
            .min(self.messenger.capabilities().max_message_len);
        let mut sent = 0;
        let mut failed = 0;
        for block in format_digest(&news.articles, self.cfg.group_size, max_len) {
            match self.messenger.send_text(chat_id, &block).await {
                Ok(_) => sent += 1,
                Err(e) => {
                    tracing::warn!(chat_id = chat_id.0, "failed to send digest message: {e}");
                    failed += 1;
                }
            }
        }
        (sent, failed)
    }

    fn or_empty(&self, user_id: UserId, what: &str, res: Result<ArticleSet>) -> ArticleSet {
        res.unwrap_or_else(|e| {
            tracing::warn!(user_id = user_id.0, "{what} news unavailable: {e}");
            ArticleSet::default()
        })
    }
}
