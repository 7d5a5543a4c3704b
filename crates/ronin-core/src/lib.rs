//! # Ronin Core
//!
//! Silver Ronin 라이브스트림의 핵심 도메인 모델 및 공통 인프라를 제공합니다.
//!
//! 이 크레이트는 워크스페이스 전반에서 사용되는 기본 타입을 제공합니다:
//! - 귀금속 심볼 및 통화 정의
//! - 시세(`PriceQuote`) 및 뉴스(`NewsItem`) 데이터 구조체
//! - 가격 변동률 계산 및 표시 형식
//! - 주요 귀금속 시장 세션 (뉴욕, 런던, 상하이, 도쿄)
//! - 설정 관리
//! - 에러 분류 체계
//! - 로깅 인프라

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;
