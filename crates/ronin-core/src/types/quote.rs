//! 시세 및 뉴스 데이터 구조체.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{format_price, Currency, Metal, Price, PriceChange};

/// 귀금속 현물 시세.
///
/// 한번 조회된 시세는 변경되지 않으며, 다음 조회 결과로 대체될 뿐입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// 귀금속
    pub metal: Metal,
    /// 트로이 온스당 가격
    pub price: Price,
    /// 표시 통화
    pub currency: Currency,
    /// 조회 시각
    pub timestamp: DateTime<Utc>,
    /// 시세를 제공한 프로바이더 이름
    pub source: String,
}

impl PriceQuote {
    /// 새 시세를 생성합니다.
    pub fn new(
        metal: Metal,
        price: Price,
        currency: Currency,
        timestamp: DateTime<Utc>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            metal,
            price,
            currency,
            timestamp,
            source: source.into(),
        }
    }

    /// 통화 기호가 포함된 표시용 가격.
    pub fn display_price(&self) -> String {
        format_price(self.price, self.currency)
    }

    /// 이전 시세 대비 변동을 계산합니다.
    ///
    /// 통화가 다르면 비교할 수 없으므로 `NoPriorData`로 취급합니다.
    pub fn change_since(&self, previous: Option<&PriceQuote>) -> PriceChange {
        let prev_price: Option<Decimal> = previous
            .filter(|p| p.metal == self.metal && p.currency == self.currency)
            .map(|p| p.price);
        PriceChange::between(self.price, prev_price)
    }

    /// 기준 시세(예: 24시간 전) 대비 변동을 계산합니다.
    pub fn change_from(&self, reference: Option<Price>) -> PriceChange {
        PriceChange::between(self.price, reference)
    }
}

/// 뉴스 헤드라인.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// 헤드라인
    pub headline: String,
    /// 출처 (예: "Reuters")
    pub source: String,
    /// 게시 시각
    pub published: DateTime<Utc>,
    /// 기사 URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl NewsItem {
    /// 새 뉴스 항목을 생성합니다.
    pub fn new(
        headline: impl Into<String>,
        source: impl Into<String>,
        published: DateTime<Utc>,
    ) -> Self {
        Self {
            headline: headline.into(),
            source: source.into(),
            published,
            url: None,
        }
    }

    /// 기사 URL을 설정합니다.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// 중복 제거용 키 (헤드라인 + 출처, 공백 정규화 및 소문자화).
    pub fn dedup_key(&self) -> (String, String) {
        (normalize(&self.headline), normalize(&self.source))
    }
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
