//! 뉴스 조회기.
//!
//! 관련성/기간 필터와 중복 제거를 거친 최신 헤드라인을 반환하며,
//! 조회에 실패하면 마지막으로 성공한 목록을 대신 반환합니다.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::time::Duration as StdDuration;

use ronin_core::NewsItem;
use tracing::{debug, warn};

use crate::cache::{FreshnessPolicy, LastKnownGood};
use crate::error::FeedError;
use crate::provider::{Article, NewsProvider};
use crate::retry::{with_retry, RetryConfig};

/// 한 번에 반환할 수 있는 최대 헤드라인 수.
pub const MAX_NEWS_ITEMS: usize = 50;

/// 귀금속 시장 관련 키워드 (소문자, 부분 일치).
const RELEVANCE_KEYWORDS: [&str; 18] = [
    "gold",
    "silver",
    "platinum",
    "palladium",
    "precious metal",
    "bullion",
    "mining",
    "commodit",
    "inflation",
    "fed",
    "interest rate",
    "central bank",
    "xau",
    "xag",
    "xpt",
    "xpd",
    "comex",
    "lbma",
];

/// 조회 결과의 신선도.
#[derive(Debug, Clone)]
pub enum FetchStatus {
    /// 이번 조회에서 새로 받은 목록
    Fresh,
    /// 조회 실패, 이전 목록 반환
    Stale(FeedError),
}

/// 뉴스 조회 결과.
#[derive(Debug, Clone)]
pub struct NewsFetch {
    /// 최신순 헤드라인
    pub items: Vec<NewsItem>,
    /// 신선도
    pub status: FetchStatus,
}

impl NewsFetch {
    /// 새로 받은 목록인지 확인.
    pub fn is_fresh(&self) -> bool {
        matches!(self.status, FetchStatus::Fresh)
    }

    /// 실패 원인 (새로 받은 목록이면 None).
    pub fn error(&self) -> Option<&FeedError> {
        match &self.status {
            FetchStatus::Fresh => None,
            FetchStatus::Stale(e) => Some(e),
        }
    }
}

/// 시장 뉴스 조회기.
pub struct NewsFetcher {
    provider: Box<dyn NewsProvider>,
    retry: RetryConfig,
    max_age: Duration,
    cache: LastKnownGood<Vec<NewsItem>>,
}

impl NewsFetcher {
    /// 새 조회기를 생성합니다.
    ///
    /// `max_age_hours`보다 오래된 기사는 제외되며, 캐시된 목록은
    /// `stale_after`가 지나면 오래된 것으로 간주됩니다.
    pub fn new(
        provider: Box<dyn NewsProvider>,
        retry: RetryConfig,
        max_age_hours: i64,
        stale_after: StdDuration,
    ) -> Self {
        Self {
            provider,
            retry,
            max_age: Duration::hours(max_age_hours.max(1)),
            cache: LastKnownGood::new(FreshnessPolicy::new(stale_after)),
        }
    }

    /// 마지막으로 성공한 목록.
    pub fn cached(&self) -> &LastKnownGood<Vec<NewsItem>> {
        &self.cache
    }

    /// 최대 `max_items`개의 최신 헤드라인을 조회합니다 (1..=50으로 제한).
    ///
    /// `max_items`가 0이면 네트워크 요청 없이 빈 목록을 반환합니다.
    pub async fn fetch_news(&mut self, max_items: usize) -> NewsFetch {
        if max_items == 0 {
            return NewsFetch {
                items: Vec::new(),
                status: FetchStatus::Fresh,
            };
        }
        let limit = max_items.min(MAX_NEWS_ITEMS);
        // 필터링으로 빠지는 기사를 감안해 넉넉히 요청
        let page_size = (limit * 3).max(20);
        let provider = self.provider.as_ref();

        let result = with_retry(&self.retry, provider.name(), || {
            provider.fetch_articles(page_size)
        })
        .await;

        match result {
            Ok(articles) => {
                let now = Utc::now();
                let total = articles.len();
                let items = process_articles(articles, limit, now, self.max_age);
                debug!(
                    source = "news",
                    provider = provider.name(),
                    received = total,
                    kept = items.len(),
                    "뉴스 필터링 완료"
                );
                self.cache.update(items.clone(), now);
                NewsFetch {
                    items,
                    status: FetchStatus::Fresh,
                }
            }
            Err(e) => {
                let items: Vec<NewsItem> = self
                    .cache
                    .value()
                    .map(|cached| cached.iter().take(limit).cloned().collect())
                    .unwrap_or_default();
                warn!(
                    source = "news",
                    provider = provider.name(),
                    kind = %e.kind(),
                    error = %e,
                    cached_items = items.len(),
                    "뉴스 조회 실패, 이전 목록 사용"
                );
                NewsFetch {
                    items,
                    status: FetchStatus::Stale(e),
                }
            }
        }
    }
}

/// 귀금속 시장과 관련된 기사인지 확인합니다.
pub fn is_relevant(headline: &str, summary: Option<&str>) -> bool {
    let text = match summary {
        Some(summary) => format!("{} {}", headline, summary),
        None => headline.to_string(),
    }
    .to_lowercase();
    RELEVANCE_KEYWORDS.iter().any(|kw| text.contains(kw))
}

/// 관련성/기간 필터, 최신순 정렬, 중복 제거 후 최대 `limit`개를 반환합니다.
pub fn process_articles(
    articles: Vec<Article>,
    limit: usize,
    now: DateTime<Utc>,
    max_age: Duration,
) -> Vec<NewsItem> {
    let cutoff = now - max_age;

    let mut relevant: Vec<Article> = articles
        .into_iter()
        .filter(|a| a.published >= cutoff)
        .filter(|a| is_relevant(&a.headline, a.summary.as_deref()))
        .collect();
    // 안정 정렬: 같은 시각이면 프로바이더 순서 유지
    relevant.sort_by(|a, b| b.published.cmp(&a.published));

    let mut seen = HashSet::new();
    relevant
        .into_iter()
        .map(Article::into_item)
        .filter(|item| seen.insert(item.dedup_key()))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap()
    }

    fn article(headline: &str, source: &str, minutes_ago: i64) -> Article {
        Article {
            headline: headline.to_string(),
            source: source.to_string(),
            published: now() - Duration::minutes(minutes_ago),
            url: None,
            summary: None,
        }
    }

    #[test]
    fn test_relevance_filter() {
        assert!(is_relevant("Gold hits record high", None));
        assert!(is_relevant("Markets wrap", Some("Central bank buying continues")));
        assert!(is_relevant("COMEX inventories fall", None));
        assert!(!is_relevant("Tech stocks rally", Some("Chipmakers lead gains")));
    }

    #[test]
    fn test_process_sorts_dedups_and_limits() {
        let articles = vec![
            article("Silver climbs", "Kitco", 30),
            article("Gold hits record", "Reuters", 10),
            article("Gold  hits record", "reuters", 5),
            article("Tech stocks rally", "Bloomberg", 1),
            article("Platinum supply tightens", "Mining.com", 60),
        ];

        let items = process_articles(articles, 10, now(), Duration::days(7));
        let headlines: Vec<&str> = items.iter().map(|i| i.headline.as_str()).collect();
        assert_eq!(
            headlines,
            vec!["Gold  hits record", "Silver climbs", "Platinum supply tightens"]
        );

        let limited = process_articles(
            vec![article("Gold a", "A", 1), article("Gold b", "B", 2)],
            1,
            now(),
            Duration::days(7),
        );
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].headline, "Gold a");
    }

    #[test]
    fn test_process_drops_old_articles() {
        let articles = vec![
            article("Gold old news", "Reuters", 8 * 24 * 60),
            article("Gold new news", "Reuters", 60),
        ];
        let items = process_articles(articles, 10, now(), Duration::days(7));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].headline, "Gold new news");
    }
}
