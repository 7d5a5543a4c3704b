//! 프레임 렌더링/게시 통합 테스트.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use ronin_core::{Currency, Metal, NewsItem, PriceQuote};
use ronin_render::{
    render, PriceHistory, Publisher, RenderError, RenderInput, RenderOptions, Renderer,
    PRICES_FILE, SNAPSHOT_FILE, TICKER_FILE, WELCOME_TICKER,
};
use rust_decimal_macros::dec;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap()
}

fn gold(price: rust_decimal::Decimal, at: DateTime<Utc>) -> PriceQuote {
    PriceQuote::new(Metal::Gold, price, Currency::Usd, at, "metalpriceapi")
}

fn sample_input() -> RenderInput {
    let t1 = t0() + Duration::minutes(1);
    let q0 = gold(dec!(2400.12), t0());
    let q1 = gold(dec!(2415.50), t1);
    let mut history = PriceHistory::new(100);
    history.record(&q0);
    history.record(&q1);

    RenderInput {
        metals: Metal::ALL.to_vec(),
        quotes: BTreeMap::from([(Metal::Gold, q1)]),
        previous: BTreeMap::from([(Metal::Gold, q0)]),
        reference: BTreeMap::from([(Metal::Gold, dec!(2380.00))]),
        history,
        news: vec![NewsItem::new("Gold hits record high", "Reuters", t0())],
        sessions_at: t1,
        generated_at: t1,
    }
}

#[test]
fn test_second_cycle_shows_percent_change() {
    let frame = render(&sample_input(), &RenderOptions::default()).unwrap();

    let first_line = frame.prices_text.lines().next().unwrap();
    assert_eq!(first_line, "Gold (XAU)  $2,415.50  +0.64%");
    assert!(frame.prices_text.contains("Silver (XAG)  n/a  n/a"));
    assert_eq!(frame.ticker_text, "• Gold hits record high (Reuters)");

    let snapshot: serde_json::Value = serde_json::from_str(&frame.snapshot_json).unwrap();
    assert_eq!(snapshot["prices"][0]["code"], "XAU");
    assert_eq!(snapshot["prices"][0]["change_display"], "+0.64%");
    assert_eq!(snapshot["prices"][0]["display_price"], "$2,415.50");
    assert_eq!(snapshot["prices"][0]["change_24h"]["state"], "change");
    assert!(snapshot["prices"][1]["change_24h"].is_null());
    assert_eq!(snapshot["open_sessions"][0], "New York");
}

#[test]
fn test_render_is_idempotent() {
    let input = sample_input();
    let options = RenderOptions::default();
    let a = render(&input, &options).unwrap();
    let b = render(&input, &options).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_initial_frame_uses_welcome_ticker() {
    let input = RenderInput::initial(Metal::ALL.to_vec(), 100, t0());
    let frame = render(&input, &RenderOptions::default()).unwrap();
    assert_eq!(frame.ticker_text, WELCOME_TICKER);
    assert_eq!(frame.prices_text.lines().count(), 4);
    assert!(frame.prices_text.lines().all(|l| l.ends_with("n/a  n/a")));
}

#[tokio::test]
async fn test_renderer_publishes_all_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Renderer::new(
        RenderOptions::default(),
        Publisher::new(dir.path()),
        std::time::Duration::from_secs(5),
    );

    let frame = renderer.render(sample_input()).await.unwrap();
    renderer.publish(&frame).await.unwrap();

    let prices = std::fs::read_to_string(dir.path().join(PRICES_FILE)).unwrap();
    assert_eq!(prices, frame.prices_text);
    assert!(dir.path().join(TICKER_FILE).exists());
    assert!(dir.path().join(SNAPSHOT_FILE).exists());
    assert!(dir.path().join("price_chart.svg").exists());
}

#[tokio::test]
async fn test_slow_render_times_out_and_keeps_previous_frame() {
    let dir = tempfile::tempdir().unwrap();
    let publisher = Publisher::new(dir.path());
    let initial = Renderer::new(
        RenderOptions::default(),
        publisher.clone(),
        std::time::Duration::from_secs(5),
    );
    let frame = initial
        .render(RenderInput::initial(Metal::ALL.to_vec(), 100, t0()))
        .await
        .unwrap();
    initial.publish(&frame).await.unwrap();
    let before = std::fs::read(dir.path().join(PRICES_FILE)).unwrap();

    let slow = Renderer::new(
        RenderOptions::default(),
        publisher,
        std::time::Duration::from_millis(20),
    )
    .with_render_fn(|input, options| {
        std::thread::sleep(std::time::Duration::from_millis(300));
        render(input, options)
    });

    let err = slow.render(sample_input()).await.unwrap_err();
    assert!(matches!(err, RenderError::Timeout(_)));
    assert_eq!(std::fs::read(dir.path().join(PRICES_FILE)).unwrap(), before);
}

#[test]
fn test_concurrent_reader_never_sees_torn_file() {
    let dir = tempfile::tempdir().unwrap();
    let publisher = Publisher::new(dir.path());
    let a = "A".repeat(256 * 1024);
    let b = "B".repeat(256 * 1024);
    publisher.publish(&[("board.txt", a.as_bytes())]).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let path = publisher.path_of("board.txt");
    let reader = {
        let done = done.clone();
        std::thread::spawn(move || {
            while !done.load(Ordering::SeqCst) {
                let contents = std::fs::read_to_string(&path).unwrap();
                let first = contents.chars().next().unwrap();
                assert_eq!(contents.len(), 256 * 1024);
                assert!(contents.chars().all(|c| c == first));
            }
        })
    };

    for i in 0..50 {
        let body = if i % 2 == 0 { &b } else { &a };
        publisher.publish(&[("board.txt", body.as_bytes())]).unwrap();
    }
    done.store(true, Ordering::SeqCst);

    reader.join().unwrap();
}

mod properties {
    use super::*;
    use proptest::prelude::*;
    use ronin_core::format_price;
    use rust_decimal::Decimal;

    proptest! {
        #[test]
        fn board_shows_rounded_quote_price(cents in 1i64..500_000_000, scale in 0u32..4) {
            let price = Decimal::new(cents, scale);
            let quote = gold(price, t0());
            let input = RenderInput {
                metals: vec![Metal::Gold],
                quotes: BTreeMap::from([(Metal::Gold, quote)]),
                previous: BTreeMap::new(),
                reference: BTreeMap::new(),
                history: PriceHistory::new(10),
                news: Vec::new(),
                sessions_at: t0(),
                generated_at: t0(),
            };
            let frame = render(&input, &RenderOptions::default()).unwrap();
            let expected = format!("Gold (XAU)  {}  n/a\n", format_price(price, Currency::Usd));
            prop_assert_eq!(frame.prices_text, expected);
        }
    }
}
