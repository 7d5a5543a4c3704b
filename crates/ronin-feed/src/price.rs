//! 시세 조회기.
//!
//! 1차 프로바이더를 재시도와 함께 호출하고, 인증 외의 이유로 실패하거나
//! 일부 심볼이 빠졌을 때만 2차 프로바이더를 사용합니다.
//!
//! 24시간 변동률 기준 시세는 [`ReferenceCache`]에 하루 한 번 저장됩니다.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use ronin_core::{Currency, Metal, Price, PriceQuote};
use tracing::{debug, info, warn};

use crate::error::FeedResult;
use crate::provider::PriceProvider;
use crate::retry::{with_retry, RetryConfig};

/// 귀금속 시세 조회기.
pub struct PriceFetcher {
    primary: Box<dyn PriceProvider>,
    secondary: Option<Box<dyn PriceProvider>>,
    currency: Currency,
    retry: RetryConfig,
}

impl PriceFetcher {
    /// 1차 프로바이더만으로 생성합니다.
    pub fn new(primary: Box<dyn PriceProvider>, currency: Currency, retry: RetryConfig) -> Self {
        Self {
            primary,
            secondary: None,
            currency,
            retry,
        }
    }

    /// 2차(대체) 프로바이더를 설정합니다.
    pub fn with_secondary(mut self, secondary: Box<dyn PriceProvider>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// 표시 통화.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// 요청한 귀금속의 시세를 조회합니다.
    ///
    /// 빈 집합은 네트워크 요청 없이 빈 결과를 반환합니다. 결과에 없는 심볼은
    /// 호출자가 이전 시세를 재사용해야 합니다.
    pub async fn fetch_prices(
        &self,
        metals: &BTreeSet<Metal>,
    ) -> FeedResult<BTreeMap<Metal, PriceQuote>> {
        if metals.is_empty() {
            return Ok(BTreeMap::new());
        }

        let mut quotes = match self.fetch_from(self.primary.as_ref(), metals).await {
            Ok(quotes) => quotes,
            Err(e) if e.is_auth_error() => return Err(e),
            Err(e) => {
                let Some(secondary) = self.secondary.as_deref() else {
                    return Err(e);
                };
                warn!(
                    source = "price",
                    provider = self.primary.name(),
                    fallback = secondary.name(),
                    kind = %e.kind(),
                    error = %e,
                    "1차 프로바이더 실패, 2차 프로바이더로 전환"
                );
                return self.fetch_from(secondary, metals).await;
            }
        };

        let missing: BTreeSet<Metal> = metals
            .iter()
            .filter(|m| !quotes.contains_key(m))
            .copied()
            .collect();

        if !missing.is_empty() {
            if let Some(secondary) = self.secondary.as_deref() {
                info!(
                    source = "price",
                    provider = secondary.name(),
                    missing = ?missing,
                    "누락된 심볼을 2차 프로바이더에서 조회"
                );
                match self.fetch_from(secondary, &missing).await {
                    Ok(extra) => quotes.extend(extra),
                    Err(e) => warn!(
                        source = "price",
                        provider = secondary.name(),
                        kind = %e.kind(),
                        error = %e,
                        "2차 프로바이더 조회 실패, 부분 결과 반환"
                    ),
                }
            }
        }

        Ok(quotes)
    }

    /// 전날(`date`) 기준 시세를 1차 프로바이더에서 조회합니다.
    ///
    /// 빈 집합은 네트워크 요청 없이 빈 결과를 반환합니다.
    pub async fn fetch_reference(
        &self,
        metals: &BTreeSet<Metal>,
        date: NaiveDate,
    ) -> FeedResult<BTreeMap<Metal, Price>> {
        if metals.is_empty() {
            return Ok(BTreeMap::new());
        }

        let provider = self.primary.as_ref();
        let currency = self.currency;
        let prices = with_retry(&self.retry, provider.name(), || {
            provider.fetch_reference(metals, currency, date)
        })
        .await?;

        Ok(prices
            .into_iter()
            .filter(|(metal, _)| metals.contains(metal))
            .collect())
    }

    async fn fetch_from(
        &self,
        provider: &dyn PriceProvider,
        metals: &BTreeSet<Metal>,
    ) -> FeedResult<BTreeMap<Metal, PriceQuote>> {
        let currency = self.currency;
        let quotes = with_retry(&self.retry, provider.name(), || {
            provider.fetch_quotes(metals, currency)
        })
        .await?;

        // 요청하지 않은 심볼이나 다른 통화는 버림
        Ok(quotes
            .into_iter()
            .filter(|q| metals.contains(&q.metal) && q.currency == currency)
            .map(|q| (q.metal, q))
            .collect())
    }
}

/// 실패한 기준 시세 조회를 다시 시도하기까지의 간격 (분).
const REFERENCE_RETRY_MINUTES: i64 = 30;

/// 24시간 변동률 기준 시세 캐시.
///
/// 기준일(UTC 기준 전날)이 바뀔 때만 다시 조회합니다. 조회에 실패하면 이전
/// 기준을 유지하고 일정 시간 뒤에 다시 시도합니다.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCache {
    date: Option<NaiveDate>,
    prices: BTreeMap<Metal, Price>,
    retry_after: Option<DateTime<Utc>>,
}

impl ReferenceCache {
    /// `now` 시점의 기준일.
    pub fn reference_date(now: DateTime<Utc>) -> NaiveDate {
        (now - Duration::days(1)).date_naive()
    }

    /// 새로 조회해야 하는 기준일. 캐시가 최신이거나 재시도 대기 중이면 None.
    pub fn due(&self, now: DateTime<Utc>) -> Option<NaiveDate> {
        let date = Self::reference_date(now);
        if self.date == Some(date) {
            return None;
        }
        if self.retry_after.is_some_and(|at| now < at) {
            return None;
        }
        Some(date)
    }

    /// 조회 결과를 반영합니다.
    pub fn update(
        &mut self,
        date: NaiveDate,
        result: FeedResult<BTreeMap<Metal, Price>>,
        now: DateTime<Utc>,
    ) {
        match result {
            Ok(prices) => {
                debug!(source = "price", %date, count = prices.len(), "기준 시세 갱신");
                self.date = Some(date);
                self.prices = prices;
                self.retry_after = None;
            }
            Err(e) => {
                warn!(
                    source = "price",
                    provider = e.provider(),
                    kind = %e.kind(),
                    error = %e,
                    %date,
                    "기준 시세 조회 실패, 이전 기준 유지"
                );
                self.retry_after = Some(now + Duration::minutes(REFERENCE_RETRY_MINUTES));
            }
        }
    }

    /// 기준일.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// 귀금속별 기준 시세.
    pub fn prices(&self) -> &BTreeMap<Metal, Price> {
        &self.prices
    }
}
