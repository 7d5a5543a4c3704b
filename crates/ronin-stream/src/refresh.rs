//! 갱신 루프.
//!
//! 시세/뉴스 주기가 돌아온 소스만 조회한 뒤, 조회 시점의 상태로 프레임을
//! 렌더링하고 게시합니다. 한 사이클은 항상 `Idle → Fetching → Rendering →
//! Publishing → Idle` 순서로 진행되며, 종료 신호가 오면 진행 중인 조회는
//! 버리고 이미 시작한 게시는 끝까지 완료합니다.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use ronin_core::{
    open_sessions, source_span, CadenceSettings, Metal, NewsItem, Price, PriceQuote,
};
use ronin_feed::{FeedResult, NewsFetch, NewsFetcher, PriceFetcher, ReferenceCache};
use ronin_narrator::NarrationContext;
use ronin_render::{PriceHistory, RenderError, RenderInput, Renderer};
use tokio::sync::watch;
use tokio::time::{interval_at, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

use crate::error::Result;
use crate::stats::{CycleStats, RenderOutcome, SourceStats};

/// 갱신 루프 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// 다음 틱 대기
    Idle,
    /// 외부 API 조회 중
    Fetching,
    /// 프레임 생성 중
    Rendering,
    /// 파일 게시 중
    Publishing,
}

/// 데이터 소스 상태.
///
/// 인증 실패로 비활성화된 소스는 프로세스가 재시작될 때까지 다시 조회하지
/// 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceHealth {
    /// 정상
    Active,
    /// 인증 실패로 비활성화
    Disabled,
}

/// 이번 틱에 조회할 소스.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Due {
    /// 시세 조회 여부
    pub prices: bool,
    /// 뉴스 조회 여부
    pub news: bool,
}

impl Due {
    /// 모든 소스.
    pub fn all() -> Self {
        Self {
            prices: true,
            news: true,
        }
    }

    /// 시세만.
    pub fn prices() -> Self {
        Self {
            prices: true,
            news: false,
        }
    }

    /// 뉴스만.
    pub fn news() -> Self {
        Self {
            prices: false,
            news: true,
        }
    }
}

/// 소스별 갱신 주기.
#[derive(Debug, Clone, Copy)]
pub struct Cadences {
    /// 시세 주기
    pub price: Duration,
    /// 뉴스 주기
    pub news: Duration,
}

impl From<&CadenceSettings> for Cadences {
    fn from(settings: &CadenceSettings) -> Self {
        Self {
            price: settings.price(),
            news: settings.news(),
        }
    }
}

/// 화면에 표시 중인 데이터.
#[derive(Debug, Clone)]
struct StreamState {
    quotes: BTreeMap<Metal, PriceQuote>,
    previous: BTreeMap<Metal, PriceQuote>,
    reference: ReferenceCache,
    history: PriceHistory,
    news: Vec<NewsItem>,
}

impl StreamState {
    fn new(history_points: usize) -> Self {
        Self {
            quotes: BTreeMap::new(),
            previous: BTreeMap::new(),
            reference: ReferenceCache::default(),
            history: PriceHistory::new(history_points),
            news: Vec::new(),
        }
    }

    /// 새 시세를 반영합니다. 기존 시세는 변동률 기준으로 밀려납니다.
    fn apply_quote(&mut self, quote: PriceQuote) {
        self.history.record(&quote);
        if let Some(old) = self.quotes.insert(quote.metal, quote) {
            self.previous.insert(old.metal, old);
        }
    }
}

/// 라이브스트림 갱신 루프.
pub struct RefreshLoop {
    prices: PriceFetcher,
    news: Option<NewsFetcher>,
    renderer: Renderer,
    metals: Vec<Metal>,
    max_news_items: usize,
    cadences: Cadences,
    state: StreamState,
    loop_state: LoopState,
    price_health: SourceHealth,
    news_health: SourceHealth,
    cycle: u64,
    narration_tx: watch::Sender<Option<NarrationContext>>,
}

impl RefreshLoop {
    /// 새 갱신 루프를 생성합니다.
    ///
    /// `news`가 None이면 뉴스 티커는 환영 문구로 고정됩니다.
    pub fn new(
        prices: PriceFetcher,
        news: Option<NewsFetcher>,
        renderer: Renderer,
        metals: Vec<Metal>,
        cadences: Cadences,
    ) -> Self {
        let (narration_tx, _) = watch::channel(None);
        let mut unique = BTreeSet::new();
        let metals = metals.into_iter().filter(|m| unique.insert(*m)).collect();

        Self {
            prices,
            news,
            renderer,
            metals,
            max_news_items: 10,
            cadences,
            state: StreamState::new(100),
            loop_state: LoopState::Idle,
            price_health: SourceHealth::Active,
            news_health: SourceHealth::Active,
            cycle: 0,
            narration_tx,
        }
    }

    /// 티커 헤드라인 수를 설정합니다.
    pub fn with_max_news_items(mut self, max_items: usize) -> Self {
        self.max_news_items = max_items;
        self
    }

    /// 차트 이력 길이를 설정합니다.
    pub fn with_history_points(mut self, points: usize) -> Self {
        self.state.history = PriceHistory::new(points);
        self
    }

    /// 해설 입력 구독.
    ///
    /// 매 사이클이 끝날 때 최신 상태가 전달됩니다.
    pub fn subscribe(&self) -> watch::Receiver<Option<NarrationContext>> {
        self.narration_tx.subscribe()
    }

    /// 현재 상태.
    pub fn state(&self) -> LoopState {
        self.loop_state
    }

    /// 시세 소스 상태.
    pub fn price_health(&self) -> SourceHealth {
        self.price_health
    }

    /// 뉴스 소스 상태.
    pub fn news_health(&self) -> SourceHealth {
        if self.news.is_none() {
            return SourceHealth::Disabled;
        }
        self.news_health
    }

    /// 완료된 사이클 수.
    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    /// 현재 표시 중인 시세.
    pub fn quotes(&self) -> &BTreeMap<Metal, PriceQuote> {
        &self.state.quotes
    }

    /// 24시간 변동률 기준 시세.
    pub fn reference_prices(&self) -> &BTreeMap<Metal, Price> {
        self.state.reference.prices()
    }

    /// 현재 표시 중인 헤드라인.
    pub fn headlines(&self) -> &[NewsItem] {
        &self.state.news
    }

    /// 출력 디렉토리를 만들고 데이터가 없는 초기 프레임을 게시합니다.
    ///
    /// OBS가 첫 조회 전에도 읽을 파일이 있도록 시작 시 한 번 호출합니다.
    pub async fn startup(&mut self) -> Result<()> {
        self.renderer.publisher().ensure_dir()?;

        let now = Utc::now();
        let input =
            RenderInput::initial(self.metals.clone(), self.state.history.capacity(), now);
        let frame = self.renderer.render(input).await?;
        self.renderer.publish(&frame).await?;

        info!(
            source = "render",
            dir = %self.renderer.publisher().dir().display(),
            "초기 프레임 게시"
        );
        Ok(())
    }

    /// 한 사이클을 실행합니다.
    pub async fn run_cycle(&mut self, due: Due) -> CycleStats {
        self.run_cycle_until(due, &CancellationToken::new()).await
    }

    /// 한 사이클을 실행합니다. `shutdown`이 취소되면 조회를 중단하고
    /// 렌더링 없이 돌아갑니다.
    pub async fn run_cycle_until(&mut self, due: Due, shutdown: &CancellationToken) -> CycleStats {
        let started = Instant::now();
        self.cycle += 1;
        let mut stats = CycleStats::new(self.cycle);

        self.transition(LoopState::Fetching);
        let reference_due = self.state.reference.due(Utc::now());
        let fetched = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            fetched = fetch_sources(
                &self.prices,
                self.news.as_mut(),
                &self.metals,
                self.max_news_items,
                self.price_health,
                self.news_health,
                reference_due,
                due,
                self.cycle,
            ) => Some(fetched),
        };

        let Some(fetched) = fetched else {
            info!(cycle = self.cycle, "종료 요청, 진행 중인 조회 취소");
            self.transition(LoopState::Idle);
            stats.elapsed = started.elapsed();
            return stats;
        };

        if let Some(result) = fetched.prices {
            stats.price = Some(self.apply_prices(result));
        }
        if let Some((date, result)) = fetched.reference {
            self.state.reference.update(date, result, Utc::now());
        }
        if let Some(fetch) = fetched.news {
            stats.news = Some(self.apply_news(fetch));
        }

        let now = Utc::now();
        self.transition(LoopState::Rendering);
        let input = RenderInput {
            metals: self.metals.clone(),
            quotes: self.state.quotes.clone(),
            previous: self.state.previous.clone(),
            reference: self.state.reference.prices().clone(),
            history: self.state.history.clone(),
            news: self.state.news.clone(),
            sessions_at: now,
            generated_at: now,
        };
        stats.render = match self.renderer.render(input).await {
            Ok(frame) => {
                self.transition(LoopState::Publishing);
                match self.renderer.publish(&frame).await {
                    Ok(()) => RenderOutcome::Published,
                    Err(e) => {
                        error!(
                            source = "render",
                            kind = %e.kind(),
                            error = %e,
                            "프레임 게시 실패, 이전 프레임 유지"
                        );
                        RenderOutcome::Failed
                    }
                }
            }
            Err(RenderError::Timeout(_)) => RenderOutcome::TimedOut,
            Err(e) => {
                error!(
                    source = "render",
                    kind = %e.kind(),
                    error = %e,
                    "렌더링 실패, 이전 프레임 유지"
                );
                RenderOutcome::Failed
            }
        };

        self.narration_tx
            .send_replace(Some(self.narration_context(now)));
        self.transition(LoopState::Idle);

        stats.elapsed = started.elapsed();
        stats
    }

    /// 종료 신호가 올 때까지 주기적으로 갱신합니다.
    ///
    /// 시작 시 초기 프레임을 게시하고 모든 소스를 한 번 조회한 뒤,
    /// 각 소스는 자신의 주기마다 조회됩니다.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        self.startup().await?;

        if shutdown.is_cancelled() {
            return Ok(());
        }
        self.run_cycle_until(Due::all(), &shutdown)
            .await
            .log_summary();

        let start = tokio::time::Instant::now();
        let mut price_ticker = interval_at(start + self.cadences.price, self.cadences.price);
        price_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut news_ticker = interval_at(start + self.cadences.news, self.cadences.news);
        news_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            price_secs = self.cadences.price.as_secs(),
            news_secs = self.cadences.news.as_secs(),
            "갱신 루프 시작"
        );

        loop {
            let due = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("종료 신호 수신, 갱신 루프 종료");
                    break;
                }
                _ = price_ticker.tick() => Due::prices(),
                _ = news_ticker.tick() => Due::news(),
            };

            self.run_cycle_until(due, &shutdown).await.log_summary();
        }

        Ok(())
    }

    fn transition(&mut self, next: LoopState) {
        debug!(cycle = self.cycle, from = ?self.loop_state, to = ?next, "상태 전환");
        self.loop_state = next;
    }

    fn apply_prices(&mut self, result: FeedResult<BTreeMap<Metal, PriceQuote>>) -> SourceStats {
        let mut stats = SourceStats {
            attempted: self.metals.len(),
            ..Default::default()
        };

        match result {
            Ok(quotes) => {
                stats.succeeded = quotes.len();
                for quote in quotes.into_values() {
                    self.state.apply_quote(quote);
                }
            }
            Err(e) if e.is_auth_error() => {
                self.price_health = SourceHealth::Disabled;
                error!(
                    source = "price",
                    provider = e.provider(),
                    kind = %e.kind(),
                    error = %e,
                    "API 키 거부, 시세 소스 비활성화"
                );
            }
            Err(e) => {
                warn!(
                    source = "price",
                    provider = e.provider(),
                    kind = %e.kind(),
                    error = %e,
                    "시세 조회 실패, 이전 시세 유지"
                );
            }
        }

        let missing = self
            .metals
            .iter()
            .filter(|m| !self.state.quotes.contains_key(m))
            .count();
        stats.failed = missing;
        stats.stale = stats
            .attempted
            .saturating_sub(missing)
            .saturating_sub(stats.succeeded);
        stats
    }

    fn apply_news(&mut self, fetch: NewsFetch) -> SourceStats {
        let mut stats = SourceStats {
            attempted: 1,
            ..Default::default()
        };

        let Some(e) = fetch.error() else {
            stats.succeeded = fetch.items.len();
            self.state.news = fetch.items;
            return stats;
        };

        if e.is_auth_error() {
            self.news_health = SourceHealth::Disabled;
            error!(
                source = "news",
                provider = e.provider(),
                kind = %e.kind(),
                error = %e,
                "API 키 거부, 뉴스 소스 비활성화"
            );
        }

        if !fetch.items.is_empty() {
            self.state.news = fetch.items;
        }
        stats.stale = self.state.news.len();
        stats.failed = usize::from(self.state.news.is_empty());
        stats
    }

    fn narration_context(&self, now: DateTime<Utc>) -> NarrationContext {
        NarrationContext {
            metals: self.metals.clone(),
            quotes: self.state.quotes.clone(),
            previous: self.state.previous.clone(),
            reference: self.state.reference.prices().clone(),
            news: self.state.news.clone(),
            open_sessions: open_sessions(now),
        }
    }
}

struct Fetched {
    prices: Option<FeedResult<BTreeMap<Metal, PriceQuote>>>,
    reference: Option<(NaiveDate, FeedResult<BTreeMap<Metal, Price>>)>,
    news: Option<NewsFetch>,
}

/// 주기가 돌아온 활성 소스를 동시에 조회합니다.
///
/// 기준 시세는 시세 조회와 함께, 기준일이 바뀌었을 때만 조회합니다.
#[allow(clippy::too_many_arguments)]
async fn fetch_sources(
    prices: &PriceFetcher,
    news: Option<&mut NewsFetcher>,
    metals: &[Metal],
    max_news_items: usize,
    price_health: SourceHealth,
    news_health: SourceHealth,
    reference_due: Option<NaiveDate>,
    due: Due,
    cycle: u64,
) -> Fetched {
    let price_task = async move {
        if !due.prices || price_health == SourceHealth::Disabled {
            return (None, None);
        }
        let wanted: BTreeSet<Metal> = metals.iter().copied().collect();
        let reference_task = async {
            match reference_due {
                Some(date) => Some((date, prices.fetch_reference(&wanted, date).await)),
                None => None,
            }
        };
        let (quotes, reference) = tokio::join!(prices.fetch_prices(&wanted), reference_task);
        (Some(quotes), reference)
    }
    .instrument(source_span!("fetch", "price", cycle));

    let news_task = async move {
        match news {
            Some(fetcher) if due.news && news_health == SourceHealth::Active => {
                Some(fetcher.fetch_news(max_news_items).await)
            }
            _ => None,
        }
    }
    .instrument(source_span!("fetch", "news", cycle));

    let ((prices, reference), news) = tokio::join!(price_task, news_task);
    Fetched {
        prices,
        reference,
        news,
    }
}

impl std::fmt::Debug for RefreshLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshLoop")
            .field("metals", &self.metals)
            .field("cycle", &self.cycle)
            .field("state", &self.loop_state)
            .field("price_health", &self.price_health)
            .field("news_health", &self.news_health)
            .finish_non_exhaustive()
    }
}
