use std::{sync::Arc, time::Duration};

use futures::{stream, StreamExt};

use crate::{
    config::Config,
    errors::Error,
    news::{ArticleSet, NewsFetchResponse, NewsProvider, NewsQuery},
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct AggregatorConfig {
    /// Maximum provider requests in flight for one category fan-out.
    pub concurrency: usize,
    /// Per-request timeout; a timed-out request counts as a failed request.
    pub request_timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&Config> for AggregatorConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            concurrency: cfg.fetch_concurrency,
            request_timeout: cfg.fetch_timeout,
        }
    }
}

/// Fetches articles matching a user's preferences from the news provider.
#[derive(Clone)]
pub struct NewsAggregator {
    provider: Arc<dyn NewsProvider>,
    cfg: AggregatorConfig,
}

impl NewsAggregator {
    pub fn new(provider: Arc<dyn NewsProvider>, cfg: AggregatorConfig) -> Self {
        Self { provider, cfg }
    }

    /// One request per category, all awaited before merging.
    ///
    /// Results are merged in category order regardless of completion order. A failed
    /// category contributes zero articles and is counted in `failed_requests`.
    pub async fn fetch_by_categories(&self, categories: &[String], page_size: u32) -> ArticleSet {
        let results: Vec<(String, Result<NewsFetchResponse>)> =
            stream::iter(categories.iter().cloned())
                .map(|category| async move {
                    let query = NewsQuery::category(category.clone(), page_size);
                    let res = self.fetch(&query).await;
                    (category, res)
                })
                .buffered(self.cfg.concurrency.max(1))
                .collect()
                .await;

        let mut set = ArticleSet::default();
        for (category, res) in results {
            match res {
                Ok(resp) => {
                    tracing::debug!(
                        %category,
                        articles = resp.articles.len(),
                        "category news fetched"
                    );
                    set.articles.extend(resp.articles);
                }
                Err(e) => {
                    tracing::warn!(%category, "category news fetch failed: {e}");
                    set.failed_requests += 1;
                }
            }
        }
        set.total_results = set.articles.len();
        set
    }

    /// Single request for all `sources`, capped at `page_size` articles.
    pub async fn fetch_by_sources(
        &self,
        sources: &[String],
        page_size: u32,
    ) -> Result<ArticleSet> {
        if sources.is_empty() {
            return Ok(ArticleSet::default());
        }
        let resp = self.fetch(&NewsQuery::sources(sources, page_size)).await?;
        let total_results = resp.articles.len();
        Ok(ArticleSet {
            articles: resp.articles,
            total_results,
            failed_requests: 0,
        })
    }

    async fn fetch(&self, query: &NewsQuery) -> Result<NewsFetchResponse> {
        let resp = tokio::time::timeout(
            self.cfg.request_timeout,
            self.provider.top_headlines(query),
        )
        .await
        .map_err(|_| {
            Error::Provider(format!(
                "request timed out after {}ms",
                self.cfg.request_timeout.as_millis()
            ))
        })??;
        resp.into_result()
    }
}
