//! 텍스트 오버레이: 시세 보드와 뉴스 티커.

use chrono::{DateTime, Utc};
use ronin_core::{Metal, NewsItem, PriceQuote};
use std::collections::BTreeMap;
use std::time::Duration;

/// 뉴스가 없을 때 티커에 표시하는 문구.
pub const WELCOME_TICKER: &str = "Welcome to Silver Ronin - 24/7 Precious Metals Market Coverage";

/// 티커 항목 사이 구분자.
pub const TICKER_SEPARATOR: &str = "   ";

/// 시세가 오래되었는지 확인합니다.
pub fn is_stale(quote: &PriceQuote, now: DateTime<Utc>, stale_after: Duration) -> bool {
    (now - quote.timestamp)
        .to_std()
        .map(|age| age > stale_after)
        .unwrap_or(false)
}

/// 시세 보드 한 줄: `Gold (XAU)  $2,415.50  +0.64%`.
pub fn price_line(
    metal: Metal,
    quote: Option<&PriceQuote>,
    previous: Option<&PriceQuote>,
    now: DateTime<Utc>,
    stale_after: Duration,
) -> String {
    let label = format!("{} ({})", metal.name(), metal.code());
    match quote {
        Some(q) => {
            let mut line = format!(
                "{}  {}  {}",
                label,
                q.display_price(),
                q.change_since(previous).percent_display()
            );
            if is_stale(q, now, stale_after) {
                line.push_str("  [stale]");
            }
            line
        }
        None => format!("{}  n/a  n/a", label),
    }
}

/// 시세 보드 전체 (귀금속당 한 줄).
pub fn price_board(
    metals: &[Metal],
    quotes: &BTreeMap<Metal, PriceQuote>,
    previous: &BTreeMap<Metal, PriceQuote>,
    now: DateTime<Utc>,
    stale_after: Duration,
) -> String {
    let mut board = String::new();
    for &metal in metals {
        board.push_str(&price_line(
            metal,
            quotes.get(&metal),
            previous.get(&metal),
            now,
            stale_after,
        ));
        board.push('\n');
    }
    board
}

/// 뉴스 티커 문자열.
pub fn news_ticker(news: &[NewsItem]) -> String {
    if news.is_empty() {
        return WELCOME_TICKER.to_string();
    }
    news.iter()
        .map(|item| format!("• {} ({})", item.headline.trim(), item.source.trim()))
        .collect::<Vec<_>>()
        .join(TICKER_SEPARATOR)
}
