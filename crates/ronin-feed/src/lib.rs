//! 귀금속 시세 및 시장 뉴스 수집.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - `PriceProvider` / `NewsProvider` trait: 외부 API 추상화
//! - MetalPriceAPI, GoldAPI, NewsAPI 클라이언트
//! - 1차/2차 프로바이더 대체(fallback)를 포함한 시세 조회기와 24시간 기준 시세 캐시
//! - 관련성 필터와 중복 제거를 포함한 뉴스 조회기
//! - 지수 백오프 재시도 및 마지막 정상 값 캐시

pub mod cache;
pub mod error;
pub mod news;
pub mod price;
pub mod provider;
pub mod retry;

pub use cache::{FreshnessPolicy, LastKnownGood, Stamped};
pub use error::{FeedError, FeedResult};
pub use news::{is_relevant, process_articles, FetchStatus, NewsFetch, NewsFetcher, MAX_NEWS_ITEMS};
pub use price::{PriceFetcher, ReferenceCache};
pub use provider::{
    Article, GoldApiProvider, MetalPriceApiProvider, NewsApiProvider, NewsProvider, PriceProvider,
};
pub use retry::{with_retry, with_retry_if, RetryConfig};
