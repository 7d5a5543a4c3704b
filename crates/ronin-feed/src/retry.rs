//! 지수 백오프 재시도.
//!
//! 일시적 네트워크 오류만 재시도하며, 인증/형식 에러는 즉시 반환합니다.

use std::future::Future;
use std::time::Duration;

use ronin_core::RetrySettings;
use tracing::{debug, warn};

use crate::error::FeedError;

/// 재시도 설정.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// 첫 재시도 전 대기
    pub initial_backoff: Duration,
    /// 최대 대기
    pub max_backoff: Duration,
    /// 대기 시간 배수
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
            multiplier: settings.multiplier,
        }
    }
}

impl RetryConfig {
    /// 재시도 없이 한 번만 시도.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// `attempt`번째 실패 후 대기 시간 (1부터 시작).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(30) as i32;
        let millis = self.initial_backoff.as_millis() as f64 * self.multiplier.powi(exp);
        let capped = millis.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// 재시도 가능한 `FeedError`만 재시도합니다.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: &str, f: F) -> Result<T, FeedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FeedError>>,
{
    with_retry_if(config, operation, f, FeedError::is_retryable).await
}

/// `should_retry`가 true를 반환하는 에러에 대해서만 재시도합니다.
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation: &str,
    mut f: F,
    should_retry: P,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_attempts && should_retry(&e) => {
                let delay = config.backoff_for(attempt);
                debug!(
                    operation,
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "재시도 예정"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if attempt > 1 {
                    warn!(operation, attempts = attempt, error = %e, "재시도 후 최종 실패");
                }
                return Err(e);
            }
        }
    }
}
