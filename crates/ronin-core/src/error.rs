//! 라이브스트림 파이프라인의 에러 분류 체계.
//!
//! 각 크레이트는 자체 에러 타입(`FeedError`, `RenderError` 등)을 정의하지만,
//! 로깅과 처리 정책은 모두 여기 정의된 `ErrorKind`를 기준으로 합니다.
//! 프로세스를 종료시키는 에러는 `FatalConfig` 하나뿐입니다.

use std::fmt;
use thiserror::Error;

/// 에러 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 설정 누락/오류 (시작 시 즉시 종료)
    FatalConfig,
    /// API 키 거부 (해당 소스 비활성화)
    Auth,
    /// 타임아웃, 5xx 등 일시적 네트워크 오류 (재시도 후 이전 데이터 사용)
    TransientNetwork,
    /// 예상치 못한 응답 형식 (로그 후 건너뜀)
    ProviderFormat,
    /// 렌더링 시간 초과 (이전 프레임 유지)
    RenderTimeout,
    /// 음성 합성 실패 (이전 클립 유지 또는 무음)
    SynthesisFailure,
    /// 파일 입출력 오류
    Io,
}

impl ErrorKind {
    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::TransientNetwork)
    }

    /// 프로세스를 종료해야 하는 에러인지 확인합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::FatalConfig)
    }

    /// 로그 필드용 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::FatalConfig => "fatal_config",
            ErrorKind::Auth => "auth",
            ErrorKind::TransientNetwork => "transient_network",
            ErrorKind::ProviderFormat => "provider_format",
            ErrorKind::RenderTimeout => "render_timeout",
            ErrorKind::SynthesisFailure => "synthesis_failure",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 설정 에러. 항상 `ErrorKind::FatalConfig`로 분류됩니다.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 필수 값 누락
    #[error("필수 설정 누락: {0}")]
    Missing(String),

    /// 잘못된 값
    #[error("잘못된 설정: {0}")]
    Invalid(String),

    /// 설정 소스 로드 실패
    #[error("설정 로드 실패: {0}")]
    Load(#[from] config::ConfigError),
}

impl ConfigError {
    /// 에러 종류.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::FatalConfig
    }
}

/// 설정 작업을 위한 Result 타입.
pub type ConfigResult<T> = Result<T, ConfigError>;
