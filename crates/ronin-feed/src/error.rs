//! 데이터 피드 에러 타입.

use reqwest::StatusCode;
use ronin_core::ErrorKind;
use thiserror::Error;

/// 시세/뉴스 프로바이더 에러.
#[derive(Debug, Clone, Error)]
pub enum FeedError {
    /// API 키 거부. 재시도하지 않으며 해당 소스는 비활성화됩니다.
    #[error("Unauthorized ({provider}): {message}")]
    Auth { provider: String, message: String },

    /// 타임아웃, 연결 실패, 429, 5xx
    #[error("Network error ({provider}): {message}")]
    Transient { provider: String, message: String },

    /// 예상치 못한 응답 형식
    #[error("Unexpected response ({provider}): {message}")]
    Format { provider: String, message: String },
}

impl FeedError {
    /// 인증 에러 생성.
    pub fn auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Auth {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// 일시적 네트워크 에러 생성.
    pub fn transient(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transient {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// 응답 형식 에러 생성.
    pub fn format(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// HTTP 상태 코드를 에러로 분류합니다.
    ///
    /// 401/403 → 인증, 408/429/5xx → 일시적, 그 외 4xx → 형식.
    pub fn from_status(provider: &str, status: StatusCode, body: &str) -> Self {
        let message = format!("HTTP {}: {}", status.as_u16(), truncate(body, 200));
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::auth(provider, message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
                Self::transient(provider, message)
            }
            s if s.is_server_error() => Self::transient(provider, message),
            _ => Self::format(provider, message),
        }
    }

    /// reqwest 에러를 분류합니다.
    pub fn from_reqwest(provider: &str, err: &reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::format(provider, err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::from_status(provider, status, "");
        }
        // 타임아웃, 연결 실패, 요청 전송 실패 모두 일시적 오류로 취급
        Self::transient(provider, err.to_string())
    }

    /// 에러 종류.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FeedError::Auth { .. } => ErrorKind::Auth,
            FeedError::Transient { .. } => ErrorKind::TransientNetwork,
            FeedError::Format { .. } => ErrorKind::ProviderFormat,
        }
    }

    /// 에러를 발생시킨 프로바이더 이름.
    pub fn provider(&self) -> &str {
        match self {
            FeedError::Auth { provider, .. }
            | FeedError::Transient { provider, .. }
            | FeedError::Format { provider, .. } => provider,
        }
    }

    /// 재시도 가능한 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// 인증 에러인지 확인.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, FeedError::Auth { .. })
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// 피드 작업을 위한 Result 타입.
pub type FeedResult<T> = Result<T, FeedError>;
