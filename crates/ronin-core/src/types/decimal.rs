//! 가격 표시를 위한 Decimal 유틸리티.
//!
//! 화면에 노출되는 모든 숫자는 이 모듈을 거쳐 형식화됩니다.
//! 반올림 규칙은 항상 MidpointAwayFromZero(사사오입)입니다.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::Currency;

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 퍼센트 타입 (1 = 1%).
pub type Percentage = Decimal;

/// 변동률 표시 소수점 자릿수.
pub const PERCENT_DECIMAL_PLACES: u32 = 2;

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 지정된 소수점 자릿수로 반올림합니다 (사사오입).
    fn round_half_up(&self, dp: u32) -> Decimal;

    /// 통화별 표시 자릿수로 반올림합니다.
    fn round_for(&self, currency: Currency) -> Decimal;
}

impl DecimalExt for Decimal {
    fn round_half_up(&self, dp: u32) -> Decimal {
        self.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
    }

    fn round_for(&self, currency: Currency) -> Decimal {
        self.round_half_up(currency.decimal_places())
    }
}

/// 반올림 후 고정 자릿수 문자열로 변환합니다 (천 단위 구분자 없음).
pub fn format_fixed(value: Decimal, dp: u32) -> String {
    let rounded = value.round_half_up(dp);
    format!("{:.*}", dp as usize, rounded)
}

/// 천 단위 구분자(`,`)를 포함한 고정 자릿수 문자열.
pub fn format_grouped(value: Decimal, dp: u32) -> String {
    let fixed = format_fixed(value.abs(), dp);
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (fixed.clone(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value.is_sign_negative() && !value.round_half_up(dp).is_zero() {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// 통화 기호와 함께 가격을 형식화합니다 (예: "$2,415.50").
pub fn format_price(value: Decimal, currency: Currency) -> String {
    let body = format_grouped(value.abs(), currency.decimal_places());
    if value.is_sign_negative() && !value.round_for(currency).is_zero() {
        format!("-{}{}", currency.symbol(), body)
    } else {
        format!("{}{}", currency.symbol(), body)
    }
}

/// 부호가 포함된 변동률 문자열 (예: "+0.64%", "-1.20%").
///
/// 0 이상은 항상 `+`로 시작합니다.
pub fn format_signed_percent(pct: Decimal) -> String {
    let rounded = pct.round_half_up(PERCENT_DECIMAL_PLACES);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("{}%", format_fixed(rounded, PERCENT_DECIMAL_PLACES))
    } else {
        format!("+{}%", format_fixed(rounded.abs(), PERCENT_DECIMAL_PLACES))
    }
}

/// 직전 시세 대비 가격 변동.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PriceChange {
    /// 비교할 이전 시세 없음 (첫 사이클)
    NoPriorData,
    /// 변동 (절대값, 퍼센트)
    Change {
        /// 가격 차이 (현재 - 이전)
        absolute: Decimal,
        /// 변동률 (%)
        percent: Percentage,
    },
}

impl PriceChange {
    /// 현재가와 이전 가격으로 변동을 계산합니다.
    ///
    /// 이전 가격이 없거나 0이면 `NoPriorData`를 반환합니다.
    pub fn between(current: Decimal, previous: Option<Decimal>) -> Self {
        match previous {
            Some(prev) if !prev.is_zero() => {
                let absolute = current - prev;
                let percent = absolute / prev * Decimal::ONE_HUNDRED;
                PriceChange::Change { absolute, percent }
            }
            _ => PriceChange::NoPriorData,
        }
    }

    /// 변동률 (%), 이전 데이터가 없으면 None.
    pub fn percent(&self) -> Option<Percentage> {
        match self {
            PriceChange::NoPriorData => None,
            PriceChange::Change { percent, .. } => Some(*percent),
        }
    }

    /// 화면 표시용 변동률 문자열. 이전 데이터가 없으면 "n/a".
    pub fn percent_display(&self) -> String {
        match self.percent() {
            Some(pct) => format_signed_percent(pct),
            None => "n/a".to_string(),
        }
    }
}
