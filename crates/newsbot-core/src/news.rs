//! News provider model: articles, queries and top-headlines URL construction.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::{errors::Error, Result};

/// Categories the provider's top-headlines endpoint understands.
pub const CATEGORIES: [&str; 7] = [
    "business",
    "entertainment",
    "general",
    "health",
    "science",
    "sports",
    "technology",
];

/// Normalize a user-supplied category; `None` if it is not a known category.
pub fn normalize_category(raw: &str) -> Option<String> {
    let c = raw.trim().to_lowercase();
    CATEGORIES.contains(&c.as_str()).then_some(c)
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// One fetched news item. Never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub source: ArticleSource,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "urlToImage")]
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub content: Option<String>,
}

/// Provider response body for a top-headlines request.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsFetchResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub articles: Vec<Article>,
    pub code: Option<String>,
    pub message: Option<String>,
}

impl NewsFetchResponse {
    /// Turn a `status: "error"` body into an error.
    pub fn into_result(self) -> Result<Self> {
        if self.status.eq_ignore_ascii_case("ok") {
            return Ok(self);
        }
        Err(Error::Provider(format!(
            "{}: {}",
            self.code.as_deref().unwrap_or("unknown"),
            self.message.as_deref().unwrap_or("no message")
        )))
    }
}

/// Merged result of one or more provider requests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArticleSet {
    pub articles: Vec<Article>,
    pub total_results: usize,
    /// Requests that failed and contributed zero articles.
    pub failed_requests: usize,
}

impl ArticleSet {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// What a single top-headlines request selects on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NewsSelector {
    Category(String),
    Sources(Vec<String>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewsQuery {
    pub selector: NewsSelector,
    pub page_size: u32,
}

impl NewsQuery {
    pub fn category(category: impl Into<String>, page_size: u32) -> Self {
        Self {
            selector: NewsSelector::Category(category.into()),
            page_size,
        }
    }

    pub fn sources(sources: &[String], page_size: u32) -> Self {
        Self {
            selector: NewsSelector::Sources(sources.to_vec()),
            page_size,
        }
    }
}

/// Port for the external news provider.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn top_headlines(&self, query: &NewsQuery) -> Result<NewsFetchResponse>;
}

/// Build the top-headlines URL for `query`.
///
/// `from` is always rendered as a zero-padded `YYYY-MM-DD` date.
pub fn top_headlines_url(
    base_url: &str,
    query: &NewsQuery,
    api_key: &str,
    language: &str,
    from: NaiveDate,
) -> Result<Url> {
    let endpoint = format!("{}/top-headlines", base_url.trim_end_matches('/'));
    let mut url = Url::parse(&endpoint)
        .map_err(|e| Error::Config(format!("invalid news api base url {base_url}: {e}")))?;

    {
        let mut pairs = url.query_pairs_mut();
        match &query.selector {
            NewsSelector::Category(c) => pairs.append_pair("category", c),
            NewsSelector::Sources(s) => pairs.append_pair("sources", &s.join(",")),
        };
        pairs
            .append_pair("pageSize", &query.page_size.to_string())
            .append_pair("apiKey", api_key)
            .append_pair("language", language)
            .append_pair("from", &from.format("%Y-%m-%d").to_string());
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(url: &Url, key: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn category_url_has_all_parameters() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let url = top_headlines_url(
            "https://newsapi.org/v2/",
            &NewsQuery::category("sports", 5),
            "secret",
            "en",
            date,
        )
        .unwrap();

        assert_eq!(url.path(), "/v2/top-headlines");
        assert_eq!(param(&url, "category").as_deref(), Some("sports"));
        assert_eq!(param(&url, "pageSize").as_deref(), Some("5"));
        assert_eq!(param(&url, "apiKey").as_deref(), Some("secret"));
        assert_eq!(param(&url, "language").as_deref(), Some("en"));
        assert_eq!(param(&url, "from").as_deref(), Some("2024-03-07"));
        assert_eq!(param(&url, "sources"), None);
    }

    #[test]
    fn sources_are_comma_joined() {
        let date = NaiveDate::from_ymd_opt(2024, 11, 23).unwrap();
        let sources = vec!["bbc-news".to_string(), "cnn".to_string()];
        let url = top_headlines_url(
            "https://newsapi.org/v2",
            &NewsQuery::sources(&sources, 12),
            "k",
            "en",
            date,
        )
        .unwrap();
        assert_eq!(param(&url, "sources").as_deref(), Some("bbc-news,cnn"));
        assert_eq!(param(&url, "pageSize").as_deref(), Some("12"));
        assert_eq!(param(&url, "from").as_deref(), Some("2024-11-23"));
    }

    #[test]
    fn parses_provider_article_shape() {
        let body = serde_json::json!({
            "status": "ok",
            "totalResults": 1,
            "articles": [{
                "source": {"id": null, "name": "Example"},
                "author": null,
                "title": "Title",
                "description": "Desc",
                "url": "https://example.com/a",
                "urlToImage": "https://example.com/a.png",
                "publishedAt": "2024-03-07T10:00:00Z",
                "content": null
            }]
        });
        let resp: NewsFetchResponse = serde_json::from_value(body).unwrap();
        let resp = resp.into_result().unwrap();
        assert_eq!(resp.total_results, 1);
        let a = &resp.articles[0];
        assert_eq!(a.source.name.as_deref(), Some("Example"));
        assert_eq!(a.image_url.as_deref(), Some("https://example.com/a.png"));
        assert_eq!(a.published_at.as_deref(), Some("2024-03-07T10:00:00Z"));
    }

    #[test]
    fn error_status_becomes_provider_error() {
        let body = serde_json::json!({
            "status": "error",
            "code": "apiKeyInvalid",
            "message": "Your API key is invalid"
        });
        let resp: NewsFetchResponse = serde_json::from_value(body).unwrap();
        let err = resp.into_result().unwrap_err();
        assert!(matches!(err, Error::Provider(ref m) if m.contains("apiKeyInvalid")));
    }

    #[test]
    fn normalizes_known_categories_only() {
        assert_eq!(normalize_category(" Sports ").as_deref(), Some("sports"));
        assert_eq!(normalize_category("weather"), None);
    }
}
