//! 주기적 음성 해설 작업.
//!
//! 갱신 루프가 매 사이클 끝에 보내는 상태를 받아, 해설 주기마다 스크립트를
//! 만들어 합성합니다. 합성은 갱신 루프와 별도 작업에서 실행되므로 느린 TTS
//! 엔진이 화면 갱신을 막지 않습니다.

use std::time::Duration;

use ronin_narrator::{compose_script, NarrationClip, NarrationContext, NarrationError, Narrator};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 해설 한 번을 생성합니다. 실패는 로그로만 남깁니다.
pub async fn narrate_once(
    narrator: &Narrator,
    context: &NarrationContext,
    cycle: u64,
) -> Option<NarrationClip> {
    let script = compose_script(context, cycle);

    match narrator.synthesize(&script).await {
        Ok(clip) => {
            debug!(source = "narration", cycle, path = %clip.audio_path.display(), "해설 사이클 완료");
            Some(clip)
        }
        Err(NarrationError::NoEngine) => {
            debug!(source = "narration", cycle, "음성 엔진 없음, 합성 생략");
            None
        }
        Err(e) => {
            warn!(
                source = "narration",
                cycle,
                kind = %e.kind(),
                error = %e,
                "해설 합성 실패, 이전 클립 유지"
            );
            None
        }
    }
}

/// 종료 신호가 올 때까지 `cadence`마다 해설을 생성합니다.
///
/// 첫 해설은 첫 갱신 사이클이 끝난 직후에 생성됩니다.
pub async fn run_narration(
    narrator: Narrator,
    mut updates: watch::Receiver<Option<NarrationContext>>,
    cadence: Duration,
    shutdown: CancellationToken,
) {
    tokio::select! {
        _ = shutdown.cancelled() => return,
        ready = updates.wait_for(|ctx| ctx.is_some()) => {
            if ready.is_err() {
                debug!(source = "narration", "갱신 루프 종료, 해설 작업 종료");
                return;
            }
        }
    }

    info!(
        source = "narration",
        engine = narrator.engine_name().unwrap_or("none"),
        cadence_secs = cadence.as_secs(),
        "해설 작업 시작"
    );

    let mut ticker = interval(cadence);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut cycle: u64 = 0;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!(source = "narration", "종료 신호 수신, 해설 작업 종료");
                break;
            }
            _ = ticker.tick() => {}
        }

        let context = updates.borrow_and_update().clone();
        let Some(context) = context else {
            continue;
        };
        if context.quotes.is_empty() {
            debug!(source = "narration", "표시할 시세 없음, 해설 생략");
            continue;
        }

        cycle += 1;
        narrate_once(&narrator, &context, cycle).await;
    }
}
