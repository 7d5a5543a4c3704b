//! 렌더링 입력과 프레임.
//!
//! `render`는 입력만으로 결정되는 순수 함수입니다. 현재 시각도 입력
//! (`generated_at`)으로 받으므로 같은 입력은 항상 같은 바이트를 만듭니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use ronin_core::{
    open_sessions, Metal, NewsItem, Price, PriceChange, PriceQuote, RenderSettings,
};

use crate::chart::{render_chart, ChartInput};
use crate::error::RenderResult;
use crate::history::PriceHistory;
use crate::text::{is_stale, news_ticker, price_board};

/// 시세 보드 파일.
pub const PRICES_FILE: &str = "prices.txt";
/// 뉴스 티커 파일.
pub const TICKER_FILE: &str = "news_ticker.txt";
/// 가격 차트 파일.
pub const CHART_FILE: &str = "price_chart.svg";
/// 스냅샷 파일.
pub const SNAPSHOT_FILE: &str = "snapshot.json";

/// 한 프레임을 그리는 데 필요한 모든 입력.
#[derive(Debug, Clone)]
pub struct RenderInput {
    /// 표시할 귀금속 (표시 순서)
    pub metals: Vec<Metal>,
    /// 최신 시세 (조회 실패 시 이전 시세 재사용)
    pub quotes: BTreeMap<Metal, PriceQuote>,
    /// 변동률 계산 기준이 되는 직전 시세
    pub previous: BTreeMap<Metal, PriceQuote>,
    /// 24시간 변동률 기준 시세 (스냅샷에만 표시)
    pub reference: BTreeMap<Metal, Price>,
    /// 가격 이력
    pub history: PriceHistory,
    /// 티커 헤드라인 (최신순)
    pub news: Vec<NewsItem>,
    /// 세션 상태를 판단할 시각
    pub sessions_at: DateTime<Utc>,
    /// 프레임 생성 시각
    pub generated_at: DateTime<Utc>,
}

impl RenderInput {
    /// 시세/뉴스가 없는 초기 프레임 입력 (시작 시 게시).
    pub fn initial(metals: Vec<Metal>, history_points: usize, at: DateTime<Utc>) -> Self {
        Self {
            metals,
            quotes: BTreeMap::new(),
            previous: BTreeMap::new(),
            reference: BTreeMap::new(),
            history: PriceHistory::new(history_points),
            news: Vec::new(),
            sessions_at: at,
            generated_at: at,
        }
    }
}

/// 테마/레이아웃 설정.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// 이 시간보다 오래된 시세는 `[stale]` 표시
    pub stale_after: Duration,
    /// 차트 너비 (px)
    pub chart_width: u32,
    /// 차트 높이 (px)
    pub chart_height: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&RenderSettings::default())
    }
}

impl From<&RenderSettings> for RenderOptions {
    fn from(settings: &RenderSettings) -> Self {
        Self {
            stale_after: settings.stale_after(),
            chart_width: settings.chart_width,
            chart_height: settings.chart_height,
        }
    }
}

/// 한 번의 렌더링 결과. 모든 산출물이 한 묶음으로 게시됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFrame {
    /// 시세 보드 텍스트
    pub prices_text: String,
    /// 뉴스 티커 텍스트
    pub ticker_text: String,
    /// 가격 차트 SVG
    pub chart_svg: String,
    /// JSON 스냅샷
    pub snapshot_json: String,
}

impl RenderFrame {
    /// (파일명, 내용) 목록.
    pub fn artifacts(&self) -> [(&'static str, &[u8]); 4] {
        [
            (PRICES_FILE, self.prices_text.as_bytes()),
            (TICKER_FILE, self.ticker_text.as_bytes()),
            (CHART_FILE, self.chart_svg.as_bytes()),
            (SNAPSHOT_FILE, self.snapshot_json.as_bytes()),
        ]
    }
}

#[derive(Serialize)]
struct Snapshot<'a> {
    generated_at: DateTime<Utc>,
    prices: Vec<SnapshotPrice<'a>>,
    headlines: &'a [NewsItem],
    open_sessions: Vec<&'static str>,
}

#[derive(Serialize)]
struct SnapshotPrice<'a> {
    metal: Metal,
    code: &'static str,
    name: &'static str,
    price: Option<Decimal>,
    display_price: Option<String>,
    change: Option<PriceChange>,
    change_display: String,
    change_24h: Option<PriceChange>,
    currency: Option<&'static str>,
    source: Option<&'a str>,
    timestamp: Option<DateTime<Utc>>,
    stale: bool,
}

/// 입력으로 프레임을 생성합니다.
pub fn render(input: &RenderInput, options: &RenderOptions) -> RenderResult<RenderFrame> {
    let sessions = open_sessions(input.sessions_at);

    let prices_text = price_board(
        &input.metals,
        &input.quotes,
        &input.previous,
        input.generated_at,
        options.stale_after,
    );
    let ticker_text = news_ticker(&input.news);
    let chart_svg = render_chart(&ChartInput {
        metals: &input.metals,
        quotes: &input.quotes,
        previous: &input.previous,
        history: &input.history,
        open_sessions: &sessions,
        generated_at: input.generated_at,
        width: options.chart_width,
        height: options.chart_height,
    });

    let prices = input
        .metals
        .iter()
        .map(|&metal| {
            let quote = input.quotes.get(&metal);
            let change = quote.map(|q| q.change_since(input.previous.get(&metal)));
            SnapshotPrice {
                metal,
                code: metal.code(),
                name: metal.name(),
                price: quote.map(|q| q.price),
                display_price: quote.map(PriceQuote::display_price),
                change,
                change_display: change
                    .map(|c| c.percent_display())
                    .unwrap_or_else(|| "n/a".to_string()),
                change_24h: quote
                    .map(|q| q.change_from(input.reference.get(&metal).copied()))
                    .filter(|c| c.percent().is_some()),
                currency: quote.map(|q| q.currency.code()),
                source: quote.map(|q| q.source.as_str()),
                timestamp: quote.map(|q| q.timestamp),
                stale: quote
                    .map(|q| is_stale(q, input.generated_at, options.stale_after))
                    .unwrap_or(false),
            }
        })
        .collect();

    let snapshot_json = serde_json::to_string_pretty(&Snapshot {
        generated_at: input.generated_at,
        prices,
        headlines: &input.news,
        open_sessions: sessions,
    })?;

    Ok(RenderFrame {
        prices_text,
        ticker_text,
        chart_svg,
        snapshot_json,
    })
}
