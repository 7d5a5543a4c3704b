//! MetalPriceAPI (metalpriceapi.com) 시세 프로바이더.
//!
//! `GET /latest?api_key=&base=USD&currencies=XAU,XAG` 한 번으로 모든 귀금속을 조회합니다.
//! 응답의 `rates`에는 기준 통화 1단위당 금속 수량(`XAU`)과, 플랜에 따라
//! 온스당 가격(`USDXAU`)이 함께 들어 있습니다. 24시간 변동률 기준 시세는 같은
//! 형식의 `GET /YYYY-MM-DD`로 조회합니다.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;
use tracing::{debug, warn};

use ronin_core::{Currency, Metal, Price, PriceQuote};

use super::PriceProvider;
use crate::error::{FeedError, FeedResult};

const NAME: &str = "metalpriceapi";

/// 인증 관련 API 에러 코드.
const AUTH_ERROR_CODES: [u16; 5] = [101, 102, 103, 401, 403];

/// 가격 정밀도 (소수점 자릿수).
const PRICE_SCALE: u32 = 6;

#[derive(Debug, Deserialize)]
struct RatesResponse {
    success: Option<bool>,
    #[serde(default)]
    rates: Option<HashMap<String, Decimal>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "statusCode")]
    status_code: Option<u16>,
    message: Option<String>,
}

/// MetalPriceAPI 클라이언트.
pub struct MetalPriceApiProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
    timeout: Duration,
}

impl MetalPriceApiProvider {
    /// 새 프로바이더를 생성합니다.
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            timeout,
        }
    }

    /// `/{endpoint}`를 호출해 `rates`를 반환합니다 (`latest` 또는 `YYYY-MM-DD`).
    async fn fetch_rates(
        &self,
        endpoint: &str,
        metals: &BTreeSet<Metal>,
        currency: Currency,
    ) -> FeedResult<HashMap<String, Decimal>> {
        let codes = metals
            .iter()
            .map(|m| m.code())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/{}", self.base_url, endpoint);

        debug!(
            provider = NAME,
            endpoint,
            currencies = %codes,
            base = currency.code(),
            "시세 조회"
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.expose_secret()),
                ("base", currency.code()),
                ("currencies", codes.as_str()),
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

        let parsed: RatesResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                return Err(FeedError::format(NAME, format!("JSON 파싱 실패: {}", e)));
            }
            Err(_) => return Err(FeedError::from_status(NAME, status, &body)),
        };

        if parsed.success == Some(false) {
            return Err(Self::classify_api_error(parsed.error));
        }
        if !status.is_success() {
            return Err(FeedError::from_status(NAME, status, &body));
        }

        parsed
            .rates
            .ok_or_else(|| FeedError::format(NAME, "응답에 rates 필드가 없습니다"))
    }

    fn classify_api_error(error: Option<ApiError>) -> FeedError {
        let (code, message) = match error {
            Some(e) => (
                e.status_code,
                e.message.unwrap_or_else(|| "unknown error".to_string()),
            ),
            None => (None, "success=false".to_string()),
        };
        let message = format!("API error {}: {}", code.unwrap_or_default(), message);
        match code {
            Some(c) if AUTH_ERROR_CODES.contains(&c) => FeedError::auth(NAME, message),
            Some(429) => FeedError::transient(NAME, message),
            Some(c) if c >= 500 => FeedError::transient(NAME, message),
            _ => FeedError::format(NAME, message),
        }
    }

    /// `rates`에서 온스당 가격을 추출합니다.
    ///
    /// `<CUR><CODE>` 값이 있으면 그대로 쓰고, 없으면 `1 / rates[<CODE>]`로 계산합니다.
    fn price_from_rates(
        rates: &HashMap<String, Decimal>,
        metal: Metal,
        currency: Currency,
    ) -> Option<Decimal> {
        let direct_key = format!("{}{}", currency.code(), metal.code());
        if let Some(price) = rates.get(&direct_key).filter(|p| p.is_sign_positive() && !p.is_zero()) {
            return Some(*price);
        }

        rates
            .get(metal.code())
            .filter(|r| r.is_sign_positive() && !r.is_zero())
            .and_then(|r| Decimal::ONE.checked_div(*r))
            .map(|p| p.round_dp(PRICE_SCALE).normalize())
    }
}

#[async_trait]
impl PriceProvider for MetalPriceApiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch_quotes(
        &self,
        metals: &BTreeSet<Metal>,
        currency: Currency,
    ) -> FeedResult<Vec<PriceQuote>> {
        let rates = self.fetch_rates("latest", metals, currency).await?;
        let received_at = Utc::now();

        let mut quotes = Vec::with_capacity(metals.len());
        for &metal in metals {
            match Self::price_from_rates(&rates, metal, currency) {
                Some(price) => {
                    quotes.push(PriceQuote::new(metal, price, currency, received_at, NAME));
                }
                None => {
                    warn!(
                        provider = NAME,
                        metal = metal.code(),
                        kind = "provider_format",
                        "응답에 유효한 시세 없음, 해당 심볼 건너뜀"
                    );
                }
            }
        }

        if quotes.is_empty() && !metals.is_empty() {
            return Err(FeedError::format(NAME, "요청한 심볼의 시세가 하나도 없습니다"));
        }

        Ok(quotes)
    }

    async fn fetch_reference(
        &self,
        metals: &BTreeSet<Metal>,
        currency: Currency,
        date: NaiveDate,
    ) -> FeedResult<BTreeMap<Metal, Price>> {
        let endpoint = date.format("%Y-%m-%d").to_string();
        let rates = self.fetch_rates(&endpoint, metals, currency).await?;

        Ok(metals
            .iter()
            .filter_map(|&metal| {
                Self::price_from_rates(&rates, metal, currency).map(|price| (metal, price))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_prefers_direct_rate() {
        let rates = HashMap::from([
            ("XAU".to_string(), dec!(0.0004)),
            ("USDXAU".to_string(), dec!(2415.50)),
        ]);
        assert_eq!(
            MetalPriceApiProvider::price_from_rates(&rates, Metal::Gold, Currency::Usd),
            Some(dec!(2415.50))
        );
    }

    #[test]
    fn test_price_inverts_metal_rate() {
        let rates = HashMap::from([("XAG".to_string(), dec!(0.04))]);
        assert_eq!(
            MetalPriceApiProvider::price_from_rates(&rates, Metal::Silver, Currency::Usd),
            Some(dec!(25))
        );
        assert_eq!(
            MetalPriceApiProvider::price_from_rates(&rates, Metal::Gold, Currency::Usd),
            None
        );
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let rates = HashMap::from([("XPT".to_string(), Decimal::ZERO)]);
        assert_eq!(
            MetalPriceApiProvider::price_from_rates(&rates, Metal::Platinum, Currency::Usd),
            None
        );
    }

    #[test]
    fn test_api_error_classification() {
        let auth = MetalPriceApiProvider::classify_api_error(Some(ApiError {
            status_code: Some(101),
            message: Some("invalid api key".to_string()),
        }));
        assert!(auth.is_auth_error());

        let limited = MetalPriceApiProvider::classify_api_error(Some(ApiError {
            status_code: Some(429),
            message: None,
        }));
        assert!(limited.is_retryable());

        let other = MetalPriceApiProvider::classify_api_error(None);
        assert!(!other.is_retryable());
        assert!(!other.is_auth_error());
    }
}
