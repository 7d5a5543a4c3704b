//! 렌더링 에러 타입.

use std::path::PathBuf;
use std::time::Duration;

use ronin_core::ErrorKind;
use thiserror::Error;

/// 렌더링/게시 에러.
#[derive(Debug, Error)]
pub enum RenderError {
    /// 렌더링 시간 예산 초과 (이전 프레임 유지)
    #[error("Render exceeded time budget of {0:?}")]
    Timeout(Duration),

    /// 파일 입출력 실패
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 스냅샷 직렬화 실패
    #[error("Snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// 렌더링 작업 패닉/취소
    #[error("Render task failed: {0}")]
    Task(String),
}

impl RenderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// 에러 종류.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RenderError::Timeout(_) | RenderError::Task(_) => ErrorKind::RenderTimeout,
            RenderError::Io { .. } | RenderError::Serialize(_) => ErrorKind::Io,
        }
    }
}

/// 렌더링 작업을 위한 Result 타입.
pub type RenderResult<T> = Result<T, RenderError>;
