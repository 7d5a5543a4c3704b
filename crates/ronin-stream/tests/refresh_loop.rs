//! 가짜 프로바이더를 사용한 갱신 루프 테스트.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use ronin_core::{Currency, Metal, PriceQuote};
use ronin_feed::{
    Article, FeedError, FeedResult, NewsFetcher, NewsProvider, PriceFetcher, PriceProvider,
    RetryConfig,
};
use ronin_render::{
    render, Publisher, RenderOptions, Renderer, CHART_FILE, PRICES_FILE, SNAPSHOT_FILE,
    TICKER_FILE, WELCOME_TICKER,
};
use ronin_stream::{Cadences, Due, LoopState, RefreshLoop, RenderOutcome, SourceHealth};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

type PriceStep = FeedResult<Vec<(Metal, Decimal)>>;

/// 호출마다 준비된 응답을 순서대로 반환하는 시세 프로바이더.
struct ScriptedPrices {
    steps: Mutex<VecDeque<PriceStep>>,
    calls: Arc<AtomicU32>,
    reference: Vec<(Metal, Decimal)>,
    reference_calls: Arc<AtomicU32>,
}

#[async_trait]
impl PriceProvider for ScriptedPrices {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_quotes(
        &self,
        metals: &BTreeSet<Metal>,
        currency: Currency,
    ) -> FeedResult<Vec<PriceQuote>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FeedError::transient("scripted", "no more responses")));

        step.map(|rows| {
            rows.into_iter()
                .filter(|(metal, _)| metals.contains(metal))
                .map(|(metal, price)| {
                    PriceQuote::new(metal, price, currency, Utc::now(), "scripted")
                })
                .collect()
        })
    }

    async fn fetch_reference(
        &self,
        metals: &BTreeSet<Metal>,
        _currency: Currency,
        _date: NaiveDate,
    ) -> FeedResult<BTreeMap<Metal, Decimal>> {
        self.reference_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .reference
            .iter()
            .filter(|(metal, _)| metals.contains(metal))
            .copied()
            .collect())
    }
}

/// 호출마다 준비된 응답을 순서대로 반환하는 뉴스 프로바이더.
struct ScriptedNews {
    steps: Mutex<VecDeque<FeedResult<Vec<Article>>>>,
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl NewsProvider for ScriptedNews {
    fn name(&self) -> &'static str {
        "scripted-news"
    }

    async fn fetch_articles(&self, _page_size: usize) -> FeedResult<Vec<Article>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FeedError::transient("scripted-news", "no more responses")))
    }
}

/// 응답하지 않는 시세 프로바이더.
struct HangingPrices;

#[async_trait]
impl PriceProvider for HangingPrices {
    fn name(&self) -> &'static str {
        "hanging"
    }

    async fn fetch_quotes(
        &self,
        _metals: &BTreeSet<Metal>,
        _currency: Currency,
    ) -> FeedResult<Vec<PriceQuote>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }
}

fn article(headline: &str, source: &str) -> Article {
    Article {
        headline: headline.to_string(),
        source: source.to_string(),
        published: Utc::now() - chrono::Duration::hours(1),
        url: None,
        summary: None,
    }
}

fn price_fetcher(steps: Vec<PriceStep>) -> (PriceFetcher, Arc<AtomicU32>) {
    let (fetcher, calls, _) = price_fetcher_with_reference(steps, Vec::new());
    (fetcher, calls)
}

fn price_fetcher_with_reference(
    steps: Vec<PriceStep>,
    reference: Vec<(Metal, Decimal)>,
) -> (PriceFetcher, Arc<AtomicU32>, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let reference_calls = Arc::new(AtomicU32::new(0));
    let provider = ScriptedPrices {
        steps: Mutex::new(steps.into()),
        calls: calls.clone(),
        reference,
        reference_calls: reference_calls.clone(),
    };
    let fetcher = PriceFetcher::new(Box::new(provider), Currency::Usd, RetryConfig::no_retry());
    (fetcher, calls, reference_calls)
}

fn news_fetcher(steps: Vec<FeedResult<Vec<Article>>>) -> (NewsFetcher, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let provider = ScriptedNews {
        steps: Mutex::new(steps.into()),
        calls: calls.clone(),
    };
    let fetcher = NewsFetcher::new(
        Box::new(provider),
        RetryConfig::no_retry(),
        168,
        Duration::from_secs(600),
    );
    (fetcher, calls)
}

fn refresh_loop(
    dir: &std::path::Path,
    prices: PriceFetcher,
    news: Option<NewsFetcher>,
) -> RefreshLoop {
    let renderer = Renderer::new(
        RenderOptions::default(),
        Publisher::new(dir),
        Duration::from_secs(5),
    );
    refresh_loop_with_renderer(renderer, prices, news)
}

fn refresh_loop_with_renderer(
    renderer: Renderer,
    prices: PriceFetcher,
    news: Option<NewsFetcher>,
) -> RefreshLoop {
    let cadences = Cadences {
        price: Duration::from_secs(60),
        news: Duration::from_secs(300),
    };
    RefreshLoop::new(
        prices,
        news,
        renderer,
        vec![Metal::Gold, Metal::Silver],
        cadences,
    )
}

fn read(dir: &std::path::Path, name: &str) -> String {
    std::fs::read_to_string(dir.join(name)).unwrap()
}

#[tokio::test]
async fn test_news_failure_keeps_previous_headlines_while_prices_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let (prices, _) = price_fetcher(vec![
        Ok(vec![(Metal::Gold, dec!(2400)), (Metal::Silver, dec!(30))]),
        Ok(vec![(Metal::Gold, dec!(2415.36)), (Metal::Silver, dec!(30))]),
    ]);
    let (news, _) = news_fetcher(vec![
        Ok(vec![article("Gold rallies on Fed outlook", "Reuters")]),
        Err(FeedError::transient("scripted-news", "503 Service Unavailable")),
    ]);
    let mut refresh = refresh_loop(dir.path(), prices, Some(news));
    refresh.startup().await.unwrap();

    let first = refresh.run_cycle(Due::all()).await;
    assert_eq!(first.render, RenderOutcome::Published);
    assert!(read(dir.path(), TICKER_FILE).contains("Gold rallies on Fed outlook"));

    let second = refresh.run_cycle(Due::all()).await;
    assert_eq!(second.render, RenderOutcome::Published);
    let news_stats = second.news.unwrap();
    assert_eq!(news_stats.succeeded, 0);
    assert_eq!(news_stats.stale, 1);

    let board = read(dir.path(), PRICES_FILE);
    assert!(board.contains("$2,415.36"), "{board}");
    assert!(board.contains("+0.64%"), "{board}");
    assert!(read(dir.path(), TICKER_FILE).contains("Gold rallies on Fed outlook"));
    assert_eq!(refresh.news_health(), SourceHealth::Active);
    assert_eq!(refresh.state(), LoopState::Idle);
}

#[tokio::test]
async fn test_price_failure_reuses_last_quotes() {
    let dir = tempfile::tempdir().unwrap();
    let (prices, calls) = price_fetcher(vec![
        Ok(vec![(Metal::Gold, dec!(2400)), (Metal::Silver, dec!(30))]),
        Err(FeedError::transient("scripted", "request timed out")),
    ]);
    let mut refresh = refresh_loop(dir.path(), prices, None);
    refresh.startup().await.unwrap();

    refresh.run_cycle(Due::prices()).await;
    let stats = refresh.run_cycle(Due::prices()).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let price_stats = stats.price.unwrap();
    assert_eq!(price_stats.attempted, 2);
    assert_eq!(price_stats.succeeded, 0);
    assert_eq!(price_stats.stale, 2);
    assert_eq!(price_stats.failed, 0);

    assert_eq!(refresh.quotes()[&Metal::Gold].price, dec!(2400));
    assert!(read(dir.path(), PRICES_FILE).contains("$2,400.00"));
    assert_eq!(refresh.price_health(), SourceHealth::Active);
}

#[tokio::test]
async fn test_partial_price_response_marks_missing_metal_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let (prices, _) = price_fetcher(vec![Ok(vec![(Metal::Gold, dec!(2400))])]);
    let mut refresh = refresh_loop(dir.path(), prices, None);
    refresh.startup().await.unwrap();

    let stats = refresh.run_cycle(Due::prices()).await;
    let price_stats = stats.price.unwrap();
    assert_eq!(price_stats.succeeded, 1);
    assert_eq!(price_stats.failed, 1);

    let board = read(dir.path(), PRICES_FILE);
    assert!(board.contains("$2,400.00"));
    assert!(board.contains("n/a"));
}

#[tokio::test]
async fn test_auth_failure_disables_source_until_restart() {
    let dir = tempfile::tempdir().unwrap();
    let (prices, price_calls) = price_fetcher(vec![
        Ok(vec![(Metal::Gold, dec!(2400)), (Metal::Silver, dec!(30))]),
        Ok(vec![(Metal::Gold, dec!(2401)), (Metal::Silver, dec!(30))]),
    ]);
    let (news, news_calls) = news_fetcher(vec![Err(FeedError::auth(
        "scripted-news",
        "apiKeyInvalid",
    ))]);
    let mut refresh = refresh_loop(dir.path(), prices, Some(news));
    refresh.startup().await.unwrap();

    refresh.run_cycle(Due::all()).await;
    assert_eq!(refresh.news_health(), SourceHealth::Disabled);
    assert_eq!(refresh.price_health(), SourceHealth::Active);

    let stats = refresh.run_cycle(Due::all()).await;
    assert!(stats.news.is_none());
    assert_eq!(news_calls.load(Ordering::SeqCst), 1);
    assert_eq!(price_calls.load(Ordering::SeqCst), 2);
    assert_eq!(read(dir.path(), TICKER_FILE), WELCOME_TICKER);
}

#[tokio::test]
async fn test_price_auth_failure_stops_price_requests() {
    let dir = tempfile::tempdir().unwrap();
    let (prices, calls) = price_fetcher(vec![Err(FeedError::auth("scripted", "invalid api key"))]);
    let mut refresh = refresh_loop(dir.path(), prices, None);
    refresh.startup().await.unwrap();

    refresh.run_cycle(Due::prices()).await;
    assert_eq!(refresh.price_health(), SourceHealth::Disabled);

    let stats = refresh.run_cycle(Due::prices()).await;
    assert!(stats.price.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(stats.render, RenderOutcome::Published);
}

#[tokio::test]
async fn test_cycle_publishes_narration_context() {
    let dir = tempfile::tempdir().unwrap();
    let (prices, _) = price_fetcher(vec![Ok(vec![
        (Metal::Gold, dec!(2400)),
        (Metal::Silver, dec!(30)),
    ])]);
    let mut refresh = refresh_loop(dir.path(), prices, None);
    let updates = refresh.subscribe();
    assert!(updates.borrow().is_none());

    refresh.startup().await.unwrap();
    refresh.run_cycle(Due::prices()).await;

    let context = updates.borrow().clone().unwrap();
    assert_eq!(context.metals, vec![Metal::Gold, Metal::Silver]);
    assert_eq!(context.quotes[&Metal::Silver].price, dec!(30));
    assert!(context.news.is_empty());
}

#[tokio::test]
async fn test_daily_reference_is_fetched_once_and_feeds_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let (prices, calls, reference_calls) = price_fetcher_with_reference(
        vec![
            Ok(vec![(Metal::Gold, dec!(2400)), (Metal::Silver, dec!(30))]),
            Ok(vec![(Metal::Gold, dec!(2415.36)), (Metal::Silver, dec!(30))]),
        ],
        vec![(Metal::Gold, dec!(2380))],
    );
    let mut refresh = refresh_loop(dir.path(), prices, None);
    let updates = refresh.subscribe();

    refresh.startup().await.unwrap();
    refresh.run_cycle(Due::prices()).await;
    refresh.run_cycle(Due::prices()).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(reference_calls.load(Ordering::SeqCst), 1);
    assert_eq!(refresh.reference_prices()[&Metal::Gold], dec!(2380));

    let context = updates.borrow().clone().unwrap();
    assert_eq!(context.reference[&Metal::Gold], dec!(2380));

    // 보드는 직전 시세 대비, 스냅샷에는 24시간 변동이 함께 표시됨
    assert!(read(dir.path(), PRICES_FILE).contains("+0.64%"));
    let snapshot: serde_json::Value =
        serde_json::from_str(&read(dir.path(), SNAPSHOT_FILE)).unwrap();
    assert_eq!(snapshot["prices"][0]["change_24h"]["state"], "change");
    assert!(snapshot["prices"][1]["change_24h"].is_null());
}

#[tokio::test]
async fn test_render_timeout_keeps_previous_frame() {
    let dir = tempfile::tempdir().unwrap();
    let slow = Arc::new(AtomicBool::new(false));
    let renderer = {
        let slow = slow.clone();
        Renderer::new(
            RenderOptions::default(),
            Publisher::new(dir.path()),
            Duration::from_millis(200),
        )
        .with_render_fn(move |input, options| {
            if slow.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(1000));
            }
            render(input, options)
        })
    };
    let (prices, _) = price_fetcher(vec![Ok(vec![
        (Metal::Gold, dec!(2400)),
        (Metal::Silver, dec!(30)),
    ])]);
    let mut refresh = refresh_loop_with_renderer(renderer, prices, None);
    let updates = refresh.subscribe();

    refresh.startup().await.unwrap();
    let artifacts = [PRICES_FILE, TICKER_FILE, CHART_FILE, SNAPSHOT_FILE];
    let before: Vec<Vec<u8>> = artifacts
        .iter()
        .map(|name| std::fs::read(dir.path().join(name)).unwrap())
        .collect();

    slow.store(true, Ordering::SeqCst);
    let stats = refresh.run_cycle(Due::prices()).await;

    assert_eq!(stats.render, RenderOutcome::TimedOut);
    assert_eq!(refresh.state(), LoopState::Idle);
    for (name, previous) in artifacts.iter().zip(&before) {
        assert_eq!(&std::fs::read(dir.path().join(name)).unwrap(), previous, "{name}");
    }
    // 렌더링이 실패해도 새 시세는 상태와 해설 입력에 반영됨
    assert_eq!(refresh.quotes()[&Metal::Gold].price, dec!(2400));
    assert!(updates.borrow().is_some());
}

#[tokio::test]
async fn test_startup_publishes_initial_frame() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("assets");
    let (prices, calls) = price_fetcher(Vec::new());
    let mut refresh = refresh_loop(&out, prices, None);

    refresh.startup().await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(read(&out, PRICES_FILE).contains("n/a"));
    assert_eq!(read(&out, TICKER_FILE), WELCOME_TICKER);
    assert!(out.join(SNAPSHOT_FILE).exists());
}

#[tokio::test]
async fn test_shutdown_during_fetch_keeps_previous_frame() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Renderer::new(
        RenderOptions::default(),
        Publisher::new(dir.path()),
        Duration::from_secs(5),
    );
    let prices = PriceFetcher::new(
        Box::new(HangingPrices),
        Currency::Usd,
        RetryConfig::no_retry(),
    );
    let mut refresh = RefreshLoop::new(
        prices,
        None,
        renderer,
        vec![Metal::Gold],
        Cadences {
            price: Duration::from_secs(60),
            news: Duration::from_secs(300),
        },
    );
    refresh.startup().await.unwrap();
    let before = read(dir.path(), PRICES_FILE);

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let stats = tokio::time::timeout(
        Duration::from_secs(5),
        refresh.run_cycle_until(Due::prices(), &shutdown),
    )
    .await
    .unwrap();

    assert_eq!(stats.render, RenderOutcome::Skipped);
    assert_eq!(refresh.state(), LoopState::Idle);
    assert_eq!(read(dir.path(), PRICES_FILE), before);
}

#[tokio::test]
async fn test_run_returns_after_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let (prices, calls) = price_fetcher(Vec::new());
    let refresh = refresh_loop(dir.path(), prices, None);

    let shutdown = CancellationToken::new();
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(5), refresh.run(shutdown))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(read(dir.path(), PRICES_FILE).contains("n/a"));
}
