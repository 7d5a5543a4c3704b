//! 해설 스크립트 템플릿.
//!
//! 템플릿 선택은 해설 사이클 번호로 결정되므로 같은 입력과 사이클 번호는
//! 항상 같은 스크립트를 만듭니다.

use std::collections::BTreeMap;

use ronin_core::{
    format_signed_percent, DecimalExt, Metal, NewsItem, Percentage, Price, PriceQuote,
    PERCENT_DECIMAL_PLACES,
};
use rust_decimal::Decimal;

/// 스크립트에 포함할 최대 헤드라인 수.
pub const MAX_HEADLINES: usize = 3;

const OPENING: [&str; 3] = [
    "This is Silver Ronin with your precious metals update.",
    "Welcome back to Silver Ronin, around the clock precious metals coverage.",
    "You are watching Silver Ronin. Here is the latest from the metals market.",
];

const HEADLINE_TEMPLATES: [&str; 3] = [
    "From {source}: {headline}",
    "Latest development: {headline}",
    "Market-moving news from {source}: {headline}",
];

/// 해설 입력.
#[derive(Debug, Clone, Default)]
pub struct NarrationContext {
    /// 표시 순서대로의 귀금속
    pub metals: Vec<Metal>,
    /// 최신 시세
    pub quotes: BTreeMap<Metal, PriceQuote>,
    /// 직전 시세
    pub previous: BTreeMap<Metal, PriceQuote>,
    /// 24시간 전 기준 시세 (추세 분류용)
    pub reference: BTreeMap<Metal, Price>,
    /// 최신 헤드라인 (최신순)
    pub news: Vec<NewsItem>,
    /// 열려 있는 세션
    pub open_sessions: Vec<&'static str>,
}

/// 24시간 변동률에 따른 추세 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    /// +1% 초과
    StrongUp,
    /// 0% 초과
    ModerateUp,
    /// -1% 미만
    StrongDown,
    /// 그 외
    Sideways,
}

impl Trend {
    /// 변동률(%)로 추세를 분류합니다.
    pub fn from_percent(pct: Percentage) -> Self {
        if pct > Decimal::ONE {
            Trend::StrongUp
        } else if pct > Decimal::ZERO {
            Trend::ModerateUp
        } else if pct < Decimal::NEGATIVE_ONE {
            Trend::StrongDown
        } else {
            Trend::Sideways
        }
    }

    /// 추세 문구.
    pub fn phrase(&self) -> &'static str {
        match self {
            Trend::StrongUp => "strong upward",
            Trend::ModerateUp => "moderate upward",
            Trend::StrongDown => "strong downward",
            Trend::Sideways => "sideways",
        }
    }

    fn sentiment(&self) -> &'static str {
        match self {
            Trend::StrongUp => "bullish",
            Trend::ModerateUp => "optimistic",
            Trend::StrongDown => "bearish",
            Trend::Sideways => "neutral",
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            Trend::StrongUp => "breakout",
            Trend::ModerateUp => "accumulation",
            Trend::StrongDown => "distribution",
            Trend::Sideways => "consolidation",
        }
    }
}

/// 해설 스크립트를 생성합니다.
///
/// 가격 문장은 직전 시세 대비 변동을, 추세 문장은 24시간 기준 시세 대비
/// 변동을 사용합니다. 기준 시세가 없는 귀금속은 추세 문장을 생략합니다.
pub fn compose_script(ctx: &NarrationContext, cycle: u64) -> String {
    let mut sentences: Vec<String> = Vec::new();
    sentences.push(OPENING[pick(cycle, 0)].to_string());

    for (i, &metal) in ctx.metals.iter().enumerate() {
        let Some(quote) = ctx.quotes.get(&metal) else {
            continue;
        };
        let pct = quote.change_since(ctx.previous.get(&metal)).percent();
        sentences.push(price_sentence(quote, pct, pick(cycle, i)));

        let daily = quote.change_from(ctx.reference.get(&metal).copied()).percent();
        if let Some(daily) = daily {
            sentences.push(trend_sentence(metal, Trend::from_percent(daily), pick(cycle, i + 1)));
        }
    }

    for (i, item) in ctx.news.iter().take(MAX_HEADLINES).enumerate() {
        let template = HEADLINE_TEMPLATES[pick(cycle, i)];
        let text = template
            .replace("{source}", item.source.trim())
            .replace("{headline}", item.headline.trim());
        sentences.push(terminate(text));
    }

    sentences.push(session_sentence(&ctx.open_sessions, pick(cycle, 0)));
    sentences.join(" ")
}

fn pick(cycle: u64, offset: usize) -> usize {
    ((cycle + offset as u64) % 3) as usize
}

fn price_sentence(quote: &PriceQuote, pct: Option<Percentage>, variant: usize) -> String {
    let name = quote.metal.name();
    let price = quote.display_price();
    let Some(pct) = pct else {
        return format!("{} is trading at {}.", name, price);
    };

    let rounded = pct.round_half_up(PERCENT_DECIMAL_PLACES);
    let movement = if rounded.is_zero() {
        "unchanged since the last update".to_string()
    } else {
        let direction = if rounded.is_sign_positive() { "up" } else { "down" };
        let magnitude = format_signed_percent(rounded.abs());
        // "+0.64%" → "0.64 percent"
        let magnitude = magnitude.trim_start_matches('+').trim_end_matches('%');
        format!("{} {} percent", direction, magnitude)
    };

    match variant {
        0 => format!("{} is trading at {}, {}.", name, price, movement),
        1 => format!("Market update: {} at {}, {}.", name, price, movement),
        _ => format!("Precious metals alert: {} now {}, {}.", name, price, movement),
    }
}

fn trend_sentence(metal: Metal, trend: Trend, variant: usize) -> String {
    match variant {
        0 => format!(
            "Technical analysis suggests {} is showing {} patterns.",
            metal.name(),
            trend.phrase()
        ),
        1 => format!(
            "Market sentiment for {} appears {}, with {} momentum.",
            metal.name(),
            trend.sentiment(),
            trend.phrase()
        ),
        _ => format!(
            "Looking at the charts, {} is in a {} trend, suggesting {}.",
            metal.name(),
            trend.phrase(),
            trend.pattern()
        ),
    }
}

fn session_sentence(open: &[&str], variant: usize) -> String {
    if open.is_empty() {
        return "Major markets are currently closed, so trading is quiet.".to_string();
    }
    let list = join_names(open);
    match variant {
        0 => format!("Markets are currently active with {} trading.", list),
        1 => format!("Global market overview: {} open right now.", list),
        _ => format!("Trading activity: {} sessions are under way.", list),
    }
}

/// "A", "A and B", "A, B and C".
fn join_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [one] => one.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

fn terminate(mut text: String) -> String {
    if !text.ends_with(['.', '!', '?']) {
        text.push('.');
    }
    text
}
