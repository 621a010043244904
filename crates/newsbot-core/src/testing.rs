//! Fakes shared by the unit tests of this crate.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    aggregator::{AggregatorConfig, NewsAggregator},
    audit::Auditor,
    digest::{DigestConfig, DigestPublisher},
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{MessagingCapabilities, ReplyKeyboard},
    },
    news::{Article, NewsFetchResponse, NewsProvider, NewsQuery, NewsSelector},
    preferences::Preferences,
    store::MemoryStore,
    subscription::Subscriptions,
    Result,
};

pub(crate) fn article(title: &str) -> Article {
    Article {
        title: Some(title.to_string()),
        description: Some(format!("about {title}")),
        url: Some(format!("https://news.example/{title}")),
        ..Article::default()
    }
}

/// Provider answering from a fixed table keyed by category or comma-joined sources.
#[derive(Default)]
pub(crate) struct ScriptedProvider {
    pub responses: HashMap<String, Vec<Article>>,
    pub delays: HashMap<String, Duration>,
    pub failing: Vec<String>,
    queries: Mutex<Vec<NewsQuery>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProvider {
    pub fn with(mut self, key: &str, titles: &[&str]) -> Self {
        self.responses
            .insert(key.to_string(), titles.iter().map(|t| article(t)).collect());
        self
    }

    pub fn queries(&self) -> Vec<NewsQuery> {
        self.queries.lock().unwrap().clone()
    }

    /// Highest number of `top_headlines` calls observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NewsProvider for ScriptedProvider {
    async fn top_headlines(&self, query: &NewsQuery) -> Result<NewsFetchResponse> {
        self.queries.lock().unwrap().push(query.clone());
        let key = match &query.selector {
            NewsSelector::Category(c) => c.clone(),
            NewsSelector::Sources(s) => s.join(","),
        };
        if let Some(delay) = self.delays.get(&key) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(*delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        if self.failing.contains(&key) {
            return Err(Error::Provider(format!("scripted failure for {key}")));
        }
        let articles: Vec<Article> = self
            .responses
            .get(&key)
            .map(|a| a.iter().take(query.page_size as usize).cloned().collect())
            .unwrap_or_default();
        Ok(NewsFetchResponse {
            status: "ok".to_string(),
            total_results: articles.len() as u64,
            articles,
            ..NewsFetchResponse::default()
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Sent {
    pub chat_id: ChatId,
    pub text: String,
    pub keyboard: Option<ReplyKeyboard>,
}

/// Messenger that records every outbound message.
#[derive(Default)]
pub(crate) struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    failing: AtomicBool,
    // 0 means Telegram's 4096.
    max_message_len: AtomicUsize,
}

impl RecordingMessenger {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|s| s.text).collect()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_max_message_len(&self, len: usize) {
        self.max_message_len.store(len, Ordering::SeqCst);
    }

    fn push(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<ReplyKeyboard>,
    ) -> Result<MessageRef> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Messaging("scripted send failure".to_string()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(Sent {
            chat_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(sent.len() as i32),
        })
    }
}

#[async_trait]
impl MessagingPort for RecordingMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_reply_keyboards: true,
            max_message_len: match self.max_message_len.load(Ordering::SeqCst) {
                0 => 4096,
                n => n,
            },
        }
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        self.push(chat_id, text, None)
    }

    async fn send_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: ReplyKeyboard,
    ) -> Result<MessageRef> {
        self.push(chat_id, text, Some(keyboard))
    }
}

/// Every service wired over one in-memory store, a scripted provider and a recorder.
pub(crate) struct Harness {
    pub store: Arc<MemoryStore>,
    pub provider: Arc<ScriptedProvider>,
    pub messenger: Arc<RecordingMessenger>,
    pub subscriptions: Subscriptions,
    pub preferences: Preferences,
    pub publisher: DigestPublisher,
}

impl Harness {
    pub fn new(provider: ScriptedProvider) -> Self {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(provider);
        let messenger = Arc::new(RecordingMessenger::default());
        let auditor = Auditor::new(store.clone());
        let subscriptions = Subscriptions::new(store.clone(), auditor.clone());
        let preferences = Preferences::new(store.clone(), auditor.clone(), 5);
        let aggregator = NewsAggregator::new(provider.clone(), AggregatorConfig::default());
        let publisher = DigestPublisher::new(
            subscriptions.clone(),
            preferences.clone(),
            aggregator,
            messenger.clone(),
            auditor,
            DigestConfig::default(),
        );
        Self {
            store,
            provider,
            messenger,
            subscriptions,
            preferences,
            publisher,
        }
    }
}
