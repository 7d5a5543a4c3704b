//! 가격 이력 SVG 차트.
//!
//! 어두운 배경 위에 귀금속별 선 그래프를 그립니다. 귀금속마다 가격대가
//! 크게 다르므로 각 시리즈는 자신의 최저/최고가로 정규화됩니다.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;

use ronin_core::{Metal, PriceQuote};

use crate::history::PriceHistory;

const BACKGROUND: &str = "#1a1a1a";
const TEXT: &str = "#FFFFFF";
const GRID: &str = "#333333";

const MARGIN_LEFT: f64 = 40.0;
const MARGIN_RIGHT: f64 = 260.0;
const MARGIN_TOP: f64 = 70.0;
const MARGIN_BOTTOM: f64 = 60.0;

/// 귀금속별 선 색상.
pub fn metal_color(metal: Metal) -> &'static str {
    match metal {
        Metal::Gold => "#FFD700",
        Metal::Silver => "#C0C0C0",
        Metal::Platinum => "#E5E4E2",
        Metal::Palladium => "#B59410",
    }
}

/// 차트 입력.
pub struct ChartInput<'a> {
    /// 표시할 귀금속 (범례 순서)
    pub metals: &'a [Metal],
    /// 최신 시세 (범례 가격)
    pub quotes: &'a BTreeMap<Metal, PriceQuote>,
    /// 직전 시세 (범례 변동률)
    pub previous: &'a BTreeMap<Metal, PriceQuote>,
    /// 가격 이력
    pub history: &'a PriceHistory,
    /// 열려 있는 세션
    pub open_sessions: &'a [&'a str],
    /// 생성 시각
    pub generated_at: DateTime<Utc>,
    /// 너비 (px)
    pub width: u32,
    /// 높이 (px)
    pub height: u32,
}

/// SVG 문서를 생성합니다.
pub fn render_chart(input: &ChartInput<'_>) -> String {
    let width = f64::from(input.width.max(320));
    let height = f64::from(input.height.max(200));
    let plot_w = (width - MARGIN_LEFT - MARGIN_RIGHT).max(1.0);
    let plot_h = (height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0);

    let mut svg = String::with_capacity(4096);
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
        w = width,
        h = height
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n",
        BACKGROUND
    ));
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"40\" fill=\"{}\" font-family=\"Arial, sans-serif\" font-size=\"24\" font-weight=\"bold\" text-anchor=\"middle\">Precious Metals - Price History</text>\n",
        width / 2.0,
        TEXT
    ));

    // 가로 격자
    for i in 0..=4 {
        let y = MARGIN_TOP + plot_h * f64::from(i) / 4.0;
        svg.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1\"/>\n",
            MARGIN_LEFT,
            y,
            MARGIN_LEFT + plot_w,
            y,
            GRID
        ));
    }

    let time_range = time_range(input.history, input.metals);
    for &metal in input.metals {
        if let Some(points) = polyline_points(input.history, metal, time_range, plot_w, plot_h) {
            svg.push_str(&format!(
                "<polyline fill=\"none\" stroke=\"{}\" stroke-width=\"3\" points=\"{}\"/>\n",
                metal_color(metal),
                points
            ));
        }
    }

    // 범례: 최신 가격과 변동률
    for (row, &metal) in input.metals.iter().enumerate() {
        let y = MARGIN_TOP + 20.0 + row as f64 * 36.0;
        let x = width - MARGIN_RIGHT + 20.0;
        let label = match input.quotes.get(&metal) {
            Some(q) => format!(
                "{} {} {}",
                metal.name(),
                q.display_price(),
                q.change_since(input.previous.get(&metal)).percent_display()
            ),
            None => format!("{} n/a", metal.name()),
        };
        svg.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"14\" height=\"14\" fill=\"{}\"/>\n",
            x,
            y - 12.0,
            metal_color(metal)
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" fill=\"{}\" font-family=\"Arial, sans-serif\" font-size=\"16\">{}</text>\n",
            x + 22.0,
            y,
            TEXT,
            escape_xml(&label)
        ));
    }

    let status = if input.open_sessions.is_empty() {
        "Markets Open: None".to_string()
    } else {
        format!("Markets Open: {}", input.open_sessions.join(", "))
    };
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" fill=\"{}\" font-family=\"Arial, sans-serif\" font-size=\"14\" font-style=\"italic\">{}</text>\n",
        MARGIN_LEFT,
        height - 20.0,
        TEXT,
        escape_xml(&status)
    ));
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" fill=\"{}\" font-family=\"Arial, sans-serif\" font-size=\"12\" font-style=\"italic\" text-anchor=\"end\">Updated: {}</text>\n",
        width - 20.0,
        height - 20.0,
        TEXT,
        input.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    svg.push_str("</svg>\n");
    svg
}

/// 모든 시리즈에 걸친 (최초, 최종) 시각.
fn time_range(history: &PriceHistory, metals: &[Metal]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let mut range: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
    for &metal in metals {
        for point in history.series(metal) {
            range = Some(match range {
                Some((lo, hi)) => (lo.min(point.at), hi.max(point.at)),
                None => (point.at, point.at),
            });
        }
    }
    range
}

fn polyline_points(
    history: &PriceHistory,
    metal: Metal,
    time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    plot_w: f64,
    plot_h: f64,
) -> Option<String> {
    let (t_min, t_max) = time_range?;
    let values: Vec<(DateTime<Utc>, f64)> = history
        .series(metal)
        .filter_map(|p| p.price.to_f64().map(|v| (p.at, v)))
        .collect();
    if values.is_empty() {
        return None;
    }

    let lo = values.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let hi = values.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
    let span_ms = (t_max - t_min).num_milliseconds() as f64;

    let points: Vec<String> = values
        .iter()
        .map(|(at, v)| {
            let x_ratio = if span_ms > 0.0 {
                (*at - t_min).num_milliseconds() as f64 / span_ms
            } else {
                1.0
            };
            let y_ratio = if hi > lo { (v - lo) / (hi - lo) } else { 0.5 };
            let x = MARGIN_LEFT + x_ratio * plot_w;
            let y = MARGIN_TOP + (1.0 - y_ratio) * plot_h;
            format!("{:.1},{:.1}", x, y)
        })
        .collect();

    Some(points.join(" "))
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
