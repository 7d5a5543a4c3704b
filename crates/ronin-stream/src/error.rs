//! 서비스 에러 타입.
//!
//! 각 컴포넌트 에러를 하나로 묶어 로깅과 종료 정책을 `ErrorKind` 기준으로
//! 결정합니다.

use ronin_core::{ConfigError, ErrorKind};
use ronin_feed::FeedError;
use ronin_narrator::NarrationError;
use ronin_render::RenderError;
use thiserror::Error;

/// Silver Ronin 에러 타입.
#[derive(Debug, Error)]
pub enum RoninError {
    /// 설정 에러 (시작 시 종료)
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 시세/뉴스 조회 에러
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// 렌더링/게시 에러
    #[error(transparent)]
    Render(#[from] RenderError),

    /// 음성 해설 에러
    #[error(transparent)]
    Narration(#[from] NarrationError),

    /// HTTP 클라이언트 초기화 실패
    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl RoninError {
    /// 에러 종류.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RoninError::Config(e) => e.kind(),
            RoninError::Feed(e) => e.kind(),
            RoninError::Render(e) => e.kind(),
            RoninError::Narration(e) => e.kind(),
            RoninError::HttpClient(_) => ErrorKind::FatalConfig,
        }
    }

    /// 재시도 가능한 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// 프로세스를 종료해야 하는 에러인지 확인.
    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, RoninError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_config_errors_are_fatal() {
        let config: RoninError = ConfigError::Missing("METALPRICE_API_KEY".into()).into();
        assert!(config.is_fatal());

        let auth: RoninError = FeedError::auth("newsapi", "apiKeyInvalid").into();
        assert!(!auth.is_fatal());
        assert_eq!(auth.kind(), ErrorKind::Auth);

        let transient: RoninError = FeedError::transient("metalpriceapi", "timeout").into();
        assert!(transient.is_retryable());

        let render: RoninError =
            RenderError::Timeout(std::time::Duration::from_secs(5)).into();
        assert_eq!(render.kind(), ErrorKind::RenderTimeout);
        assert!(!render.is_fatal());
    }
}
