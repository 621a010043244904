//! News provider adapter (top-headlines endpoint).
//!
//! Implements `newsbot_core::news::NewsProvider` over HTTP with reqwest.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};

use newsbot_core::{
    config::Config,
    errors::Error,
    news::{top_headlines_url, NewsFetchResponse, NewsProvider, NewsQuery},
    Result,
};

#[derive(Clone, Debug)]
pub struct NewsApiClient {
    api_key: String,
    base_url: String,
    language: String,
    http: reqwest::Client,
}

impl NewsApiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        language: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("news api http client: {e}")))?;
        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            language: language.into(),
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            cfg.news_api_token.clone(),
            cfg.news_api_base_url.clone(),
            cfg.news_language.clone(),
            cfg.fetch_timeout,
        )
    }

    /// Fetch top headlines published since `from`.
    pub async fn top_headlines_since(
        &self,
        query: &NewsQuery,
        from: NaiveDate,
    ) -> Result<NewsFetchResponse> {
        let url = top_headlines_url(&self.base_url, query, &self.api_key, &self.language, from)?;

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("news api request error: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Provider(format!("news api read error: {e}")))?;

        // Error bodies carry {status:"error", code, message}; prefer those over the HTTP status.
        let parsed = serde_json::from_str::<NewsFetchResponse>(&body);
        if !status.is_success() {
            return match parsed {
                Ok(r) if !r.status.eq_ignore_ascii_case("ok") => r.into_result(),
                _ => Err(Error::Provider(format!(
                    "news api returned {status}: {}",
                    body.chars().take(200).collect::<String>()
                ))),
            };
        }

        let parsed = parsed.map_err(|e| Error::Provider(format!("news api json error: {e}")))?;
        let parsed = parsed.into_result()?;
        tracing::debug!(
            selector = ?query.selector,
            articles = parsed.articles.len(),
            total_results = parsed.total_results,
            "top headlines fetched"
        );
        Ok(parsed)
    }
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    async fn top_headlines(&self, query: &NewsQuery) -> Result<NewsFetchResponse> {
        self.top_headlines_since(query, Local::now().date_naive())
            .await
    }
}
