//! 차트용 귀금속별 가격 이력.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use ronin_core::{Metal, Price, PriceQuote};

/// 가격 이력의 한 점.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricePoint {
    /// 조회 시각
    pub at: DateTime<Utc>,
    /// 가격
    pub price: Price,
}

/// 귀금속별 고정 크기 가격 이력 (가장 오래된 점부터 버림).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceHistory {
    capacity: usize,
    series: BTreeMap<Metal, VecDeque<PricePoint>>,
}

impl PriceHistory {
    /// 귀금속당 최대 `capacity`개의 점을 보관하는 이력을 생성합니다.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            series: BTreeMap::new(),
        }
    }

    /// 시세를 이력에 추가합니다.
    ///
    /// 마지막 점과 조회 시각이 같으면 (재사용된 이전 시세) 추가하지 않습니다.
    pub fn record(&mut self, quote: &PriceQuote) -> bool {
        let series = self.series.entry(quote.metal).or_default();
        if series.back().is_some_and(|last| last.at >= quote.timestamp) {
            return false;
        }
        if series.len() == self.capacity {
            series.pop_front();
        }
        series.push_back(PricePoint {
            at: quote.timestamp,
            price: quote.price,
        });
        true
    }

    /// 귀금속의 이력 (오래된 순).
    pub fn series(&self, metal: Metal) -> impl Iterator<Item = &PricePoint> {
        self.series.get(&metal).into_iter().flatten()
    }

    /// 귀금속의 이력 점 개수.
    pub fn len(&self, metal: Metal) -> usize {
        self.series.get(&metal).map_or(0, VecDeque::len)
    }

    /// 이력이 비어 있는지 확인.
    pub fn is_empty(&self) -> bool {
        self.series.values().all(VecDeque::is_empty)
    }

    /// 귀금속당 최대 보관 개수.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use ronin_core::Currency;
    use rust_decimal_macros::dec;

    fn quote(minute: i64, price: Price) -> PriceQuote {
        let t0 = Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap();
        PriceQuote::new(
            Metal::Gold,
            price,
            Currency::Usd,
            t0 + Duration::minutes(minute),
            "test",
        )
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = PriceHistory::new(3);
        for i in 0..5 {
            assert!(history.record(&quote(i, dec!(2400) + Price::from(i))));
        }
        assert_eq!(history.len(Metal::Gold), 3);
        let prices: Vec<Price> = history.series(Metal::Gold).map(|p| p.price).collect();
        assert_eq!(prices, vec![dec!(2402), dec!(2403), dec!(2404)]);
        assert_eq!(history.len(Metal::Silver), 0);
    }

    #[test]
    fn test_reused_quote_not_recorded_twice() {
        let mut history = PriceHistory::new(10);
        let q = quote(0, dec!(2400));
        assert!(history.record(&q));
        assert!(!history.record(&q));
        assert_eq!(history.len(Metal::Gold), 1);
    }
}
