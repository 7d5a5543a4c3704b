//! Silver Ronin 라이브스트림 서비스.
//!
//! 시세/뉴스 조회, 오버레이 렌더링, 음성 해설을 주기적으로 실행하는
//! 24시간 서비스입니다.
//!
//! # 실행
//!
//! ```bash
//! # 기본 실행 (Ctrl+C 또는 SIGTERM으로 종료)
//! silver-ronin --config ronin.toml
//!
//! # 한 번만 갱신하고 종료
//! silver-ronin --once
//! ```

pub mod error;
pub mod narration;
pub mod refresh;
pub mod service;
pub mod stats;

pub use error::{Result, RoninError};
pub use narration::{narrate_once, run_narration};
pub use refresh::{Cadences, Due, LoopState, RefreshLoop, SourceHealth};
pub use service::Service;
pub use stats::{CycleStats, RenderOutcome, SourceStats};
