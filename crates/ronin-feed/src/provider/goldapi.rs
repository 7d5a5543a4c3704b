//! GoldAPI (goldapi.io) 시세 프로바이더.
//!
//! 심볼마다 `GET /<CODE>/<CUR>` 요청을 보내며, 키는 `x-access-token` 헤더로 전달합니다.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::warn;

use ronin_core::{Currency, Metal, PriceQuote};

use super::PriceProvider;
use crate::error::{FeedError, FeedResult};

const NAME: &str = "goldapi";

#[derive(Debug, Deserialize)]
struct SpotResponse {
    price: Option<Decimal>,
    error: Option<String>,
}

/// GoldAPI 클라이언트.
pub struct GoldApiProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
    timeout: Duration,
}

impl GoldApiProvider {
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

    async fn fetch_one(&self, metal: Metal, currency: Currency) -> FeedResult<PriceQuote> {
        let url = format!("{}/{}/{}", self.base_url, metal.code(), currency.code());

        let response = self
            .client
            .get(&url)
            .header("x-access-token", self.api_key.expose_secret())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FeedError::from_reqwest(NAME, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FeedError::from_reqwest(NAME, &e))?;
        let received_at = Utc::now();

        if !status.is_success() {
            return Err(FeedError::from_status(NAME, status, &body));
        }

        let parsed: SpotResponse = serde_json::from_str(&body)
            .map_err(|e| FeedError::format(NAME, format!("JSON 파싱 실패: {}", e)))?;

        if let Some(error) = parsed.error {
            return Err(FeedError::format(NAME, error));
        }

        match parsed.price {
            Some(price) if price.is_sign_positive() && !price.is_zero() => {
                Ok(PriceQuote::new(metal, price, currency, received_at, NAME))
            }
            _ => Err(FeedError::format(
                NAME,
                format!("{} 응답에 유효한 price 필드가 없습니다", metal.code()),
            )),
        }
    }
}

#[async_trait]
impl PriceProvider for GoldApiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    /// 인증 에러는 즉시 반환하고, 나머지 에러는 해당 심볼만 건너뜁니다.
    /// 모든 심볼이 실패하면 마지막 에러를 반환합니다.
    async fn fetch_quotes(
        &self,
        metals: &BTreeSet<Metal>,
        currency: Currency,
    ) -> FeedResult<Vec<PriceQuote>> {
        let mut quotes = Vec::with_capacity(metals.len());
        let mut last_error = None;

        for &metal in metals {
            match self.fetch_one(metal, currency).await {
                Ok(quote) => quotes.push(quote),
                Err(e) if e.is_auth_error() => return Err(e),
                Err(e) => {
                    warn!(
                        provider = NAME,
                        metal = metal.code(),
                        kind = %e.kind(),
                        error = %e,
                        "심볼 시세 조회 실패"
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if quotes.is_empty() => Err(e),
            _ => Ok(quotes),
        }
    }
}
