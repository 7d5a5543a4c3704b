//! 음성 해설 에러 타입.

use std::time::Duration;

use ronin_core::ErrorKind;
use ronin_render::RenderError;
use thiserror::Error;

/// 음성 합성/게시 에러.
#[derive(Debug, Error)]
pub enum NarrationError {
    /// 사용 가능한 음성 엔진 없음
    #[error("No speech engine available")]
    NoEngine,

    /// 합성 시간 초과
    #[error("{engine} timed out after {timeout:?}")]
    Timeout {
        engine: &'static str,
        timeout: Duration,
    },

    /// 엔진 프로세스 실행 실패
    #[error("Failed to spawn {engine}: {source}")]
    Spawn {
        engine: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// 엔진이 0이 아닌 코드로 종료
    #[error("{engine} exited with {status}: {stderr}")]
    Failed {
        engine: &'static str,
        status: String,
        stderr: String,
    },

    /// 엔진이 빈 오디오를 생성
    #[error("{engine} produced no audio")]
    EmptyOutput { engine: &'static str },

    /// 합성 결과 게시 실패
    #[error("Publish failed: {0}")]
    Publish(#[from] RenderError),
}

impl NarrationError {
    /// 에러 종류.
    pub fn kind(&self) -> ErrorKind {
        match self {
            NarrationError::Publish(e) => e.kind(),
            _ => ErrorKind::SynthesisFailure,
        }
    }
}

/// 음성 해설 작업을 위한 Result 타입.
pub type NarrationResult<T> = Result<T, NarrationError>;
