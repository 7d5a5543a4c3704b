//! OBS 오버레이 렌더링.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 시세 보드(`prices.txt`)와 뉴스 티커(`news_ticker.txt`)
//! - 가격 이력 차트(`price_chart.svg`)
//! - 기계 판독용 스냅샷(`snapshot.json`)
//! - 임시 파일 + rename 방식의 원자적 게시
//! - 시간 예산이 있는 렌더러

pub mod chart;
pub mod error;
pub mod frame;
pub mod history;
pub mod publish;
pub mod renderer;
pub mod text;

pub use chart::metal_color;
pub use error::{RenderError, RenderResult};
pub use frame::{
    render, RenderFrame, RenderInput, RenderOptions, CHART_FILE, PRICES_FILE, SNAPSHOT_FILE,
    TICKER_FILE,
};
pub use history::{PriceHistory, PricePoint};
pub use publish::Publisher;
pub use renderer::{RenderFn, Renderer};
pub use text::{news_ticker, price_board, price_line, WELCOME_TICKER};
