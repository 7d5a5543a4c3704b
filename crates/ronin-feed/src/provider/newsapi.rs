//! NewsAPI (newsapi.org) 뉴스 프로바이더.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{Article, NewsProvider};
use crate::error::{FeedError, FeedResult};

const NAME: &str = "newsapi";

/// NewsAPI가 한 번에 돌려주는 최대 기사 수.
const MAX_PAGE_SIZE: usize = 100;

const AUTH_ERROR_CODES: [&str; 5] = [
    "apiKeyInvalid",
    "apiKeyMissing",
    "apiKeyDisabled",
    "apiKeyExhausted",
    "unauthorized",
];

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    status: String,
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    source: Option<RawSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

impl RawArticle {
    /// 제목/게시 시각이 없거나 삭제된 기사는 제외합니다.
    fn into_article(self) -> Option<Article> {
        let headline = self.title?.trim().to_string();
        if headline.is_empty() || headline == "[Removed]" {
            return None;
        }
        Some(Article {
            headline,
            source: self
                .source
                .and_then(|s| s.name)
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            published: self.published_at?,
            url: self.url,
            summary: self.description,
        })
    }
}

/// NewsAPI `/everything` 클라이언트.
pub struct NewsApiProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
    query: String,
    timeout: Duration,
}

impl NewsApiProvider {
    /// 새 프로바이더를 생성합니다.
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: SecretString,
        query: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            query: query.into(),
            timeout,
        }
    }

    fn classify_api_error(code: Option<String>, message: Option<String>) -> FeedError {
        let code = code.unwrap_or_default();
        let message = format!("{}: {}", code, message.unwrap_or_default());
        if AUTH_ERROR_CODES.contains(&code.as_str()) {
            FeedError::auth(NAME, message)
        } else if code == "rateLimited" || code == "unexpectedError" {
            FeedError::transient(NAME, message)
        } else {
            FeedError::format(NAME, message)
        }
    }
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch_articles(&self, page_size: usize) -> FeedResult<Vec<Article>> {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE).to_string();
        let url = format!("{}/everything", self.base_url);

        debug!(provider = NAME, page_size = %page_size, "뉴스 조회");

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", self.api_key.expose_secret())
            .query(&[
                ("q", self.query.as_str()),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FeedError::from_reqwest(NAME, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FeedError::from_reqwest(NAME, &e))?;

        let parsed: EverythingResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                return Err(FeedError::format(NAME, format!("JSON 파싱 실패: {}", e)));
            }
            Err(_) => return Err(FeedError::from_status(NAME, status, &body)),
        };

        if parsed.status != "ok" {
            return Err(Self::classify_api_error(parsed.code, parsed.message));
        }
        if !status.is_success() {
            return Err(FeedError::from_status(NAME, status, &body));
        }

        Ok(parsed
            .articles
            .into_iter()
            .filter_map(RawArticle::into_article)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removed_articles_are_skipped() {
        let raw: RawArticle = serde_json::from_str(
            r#"{"source":{"id":null,"name":"[Removed]"},"title":"[Removed]","publishedAt":"2024-06-03T13:00:00Z"}"#,
        )
        .unwrap();
        assert!(raw.into_article().is_none());
    }

    #[test]
    fn test_article_without_source_name() {
        let raw: RawArticle = serde_json::from_str(
            r#"{"source":{"id":null,"name":null},"title":"Gold edges higher","description":null,"url":"https://example.com/a","publishedAt":"2024-06-03T13:00:00Z"}"#,
        )
        .unwrap();
        let article = raw.into_article().unwrap();
        assert_eq!(article.source, "Unknown");
        assert_eq!(article.url.as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn test_api_error_classification() {
        assert!(
            NewsApiProvider::classify_api_error(Some("apiKeyInvalid".into()), None).is_auth_error()
        );
        assert!(
            NewsApiProvider::classify_api_error(Some("rateLimited".into()), None).is_retryable()
        );
        let other = NewsApiProvider::classify_api_error(Some("parametersMissing".into()), None);
        assert!(!other.is_retryable() && !other.is_auth_error());
    }
}
