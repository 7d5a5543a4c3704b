//! 시세/뉴스 데이터 프로바이더.
//!
//! 모든 프로바이더는 공유 `reqwest::Client`를 받아 요청마다 타임아웃을 적용합니다.
//!
//! - [`MetalPriceApiProvider`]: metalpriceapi.com (1차 시세)
//! - [`GoldApiProvider`]: goldapi.io (2차 시세)
//! - [`NewsApiProvider`]: newsapi.org (뉴스)

mod goldapi;
mod metalpriceapi;
mod newsapi;

pub use goldapi::GoldApiProvider;
pub use metalpriceapi::MetalPriceApiProvider;
pub use newsapi::NewsApiProvider;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use ronin_core::{Currency, Metal, NewsItem, Price, PriceQuote};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::FeedResult;

/// 귀금속 시세 프로바이더.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// 로그/스냅샷에 표시되는 프로바이더 이름.
    fn name(&self) -> &'static str;

    /// 요청한 귀금속의 현재 시세를 조회합니다.
    ///
    /// 일부 심볼만 형식 오류가 있으면 해당 심볼만 빠진 결과를 반환합니다.
    async fn fetch_quotes(
        &self,
        metals: &BTreeSet<Metal>,
        currency: Currency,
    ) -> FeedResult<Vec<PriceQuote>>;

    /// `date` 기준 시세(일별 종가)를 조회합니다. 24시간 변동률의 기준이 됩니다.
    ///
    /// 과거 시세를 제공하지 않는 프로바이더는 빈 결과를 반환합니다.
    async fn fetch_reference(
        &self,
        _metals: &BTreeSet<Metal>,
        _currency: Currency,
        _date: NaiveDate,
    ) -> FeedResult<BTreeMap<Metal, Price>> {
        Ok(BTreeMap::new())
    }
}

/// 뉴스 프로바이더가 반환하는 원본 기사.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// 제목
    pub headline: String,
    /// 출처
    pub source: String,
    /// 게시 시각
    pub published: DateTime<Utc>,
    /// 기사 URL
    pub url: Option<String>,
    /// 요약 (관련성 필터에만 사용)
    pub summary: Option<String>,
}

impl Article {
    /// 티커용 뉴스 항목으로 변환합니다.
    pub fn into_item(self) -> NewsItem {
        let item = NewsItem::new(self.headline, self.source, self.published);
        match self.url {
            Some(url) => item.with_url(url),
            None => item,
        }
    }
}

/// 시장 뉴스 프로바이더.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// 로그에 표시되는 프로바이더 이름.
    fn name(&self) -> &'static str;

    /// 최신순으로 최대 `page_size`개의 기사를 조회합니다.
    async fn fetch_articles(&self, page_size: usize) -> FeedResult<Vec<Article>>;
}
