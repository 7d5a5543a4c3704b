//! 갱신 사이클 통계.

use std::time::Duration;

/// 데이터 소스별 통계.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    /// 요청한 항목 수
    pub attempted: usize,
    /// 새로 받은 항목 수
    pub succeeded: usize,
    /// 값이 없는 항목 수
    pub failed: usize,
    /// 이전 값을 재사용한 항목 수
    pub stale: usize,
}

/// 렌더링 결과.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderOutcome {
    /// 렌더링하지 않음 (종료 중)
    #[default]
    Skipped,
    /// 새 프레임 게시
    Published,
    /// 시간 초과, 이전 프레임 유지
    TimedOut,
    /// 실패, 이전 프레임 유지
    Failed,
}

/// 한 사이클의 통계.
#[derive(Debug, Clone, Default)]
pub struct CycleStats {
    /// 사이클 번호
    pub cycle: u64,
    /// 시세 통계 (이번 사이클에 조회하지 않았으면 None)
    pub price: Option<SourceStats>,
    /// 뉴스 통계 (이번 사이클에 조회하지 않았으면 None)
    pub news: Option<SourceStats>,
    /// 렌더링 결과
    pub render: RenderOutcome,
    /// 소요 시간
    pub elapsed: Duration,
}

impl CycleStats {
    /// 새 통계 객체 생성
    pub fn new(cycle: u64) -> Self {
        Self {
            cycle,
            ..Default::default()
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self) {
        let price = self.price.unwrap_or_default();
        let news = self.news.unwrap_or_default();
        tracing::info!(
            cycle = self.cycle,
            price_fetched = self.price.is_some(),
            price_attempted = price.attempted,
            price_succeeded = price.succeeded,
            price_failed = price.failed,
            price_stale = price.stale,
            news_fetched = self.news.is_some(),
            news_items = news.succeeded,
            news_failed = news.failed,
            news_stale = news.stale,
            render = ?self.render,
            elapsed = format!("{:.2}s", self.elapsed.as_secs_f64()),
            "갱신 사이클 완료"
        );
    }
}
