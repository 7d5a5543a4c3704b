//! 마지막 정상 값(last-known-good) 보관.
//!
//! 조회 실패 시 이전에 성공한 값을 재사용하기 위한 소스별 상태 보관소입니다.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// 신선도 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    /// 이 시간이 지나면 오래된(stale) 값으로 간주
    pub max_age: Duration,
}

impl FreshnessPolicy {
    /// 새 정책을 생성합니다.
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }
}

/// 조회 시각이 기록된 값.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamped<T> {
    /// 값
    pub value: T,
    /// 조회 시각
    pub fetched_at: DateTime<Utc>,
}

impl<T> Stamped<T> {
    /// 새 값을 생성합니다.
    pub fn new(value: T, fetched_at: DateTime<Utc>) -> Self {
        Self { value, fetched_at }
    }

    /// 조회 후 경과 시간. 시계가 역행하면 0.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }
}

/// 소스별 마지막 정상 값.
#[derive(Debug, Clone)]
pub struct LastKnownGood<T> {
    current: Option<Stamped<T>>,
    policy: FreshnessPolicy,
}

impl<T> LastKnownGood<T> {
    /// 빈 보관소를 생성합니다.
    pub fn new(policy: FreshnessPolicy) -> Self {
        Self {
            current: None,
            policy,
        }
    }

    /// 새로 조회한 값으로 교체하고 이전 값을 반환합니다.
    pub fn update(&mut self, value: T, fetched_at: DateTime<Utc>) -> Option<Stamped<T>> {
        self.current.replace(Stamped::new(value, fetched_at))
    }

    /// 보관 중인 값.
    pub fn get(&self) -> Option<&Stamped<T>> {
        self.current.as_ref()
    }

    /// 보관 중인 값 (조회 시각 제외).
    pub fn value(&self) -> Option<&T> {
        self.current.as_ref().map(|s| &s.value)
    }

    /// 보관 중인 값의 경과 시간.
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.current.as_ref().map(|s| s.age(now))
    }

    /// 값이 없거나 정책의 최대 경과 시간을 넘었는지 확인합니다.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.age(now) {
            Some(age) => age > self.policy.max_age,
            None => true,
        }
    }

    /// 신선도 정책.
    pub fn policy(&self) -> FreshnessPolicy {
        self.policy
    }
}
