//! 해설 합성 및 게시.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ronin_core::NarrationSettings;
use ronin_render::Publisher;
use tracing::{info, warn};

use crate::engine::{detect_engine, SpeechEngine};
use crate::error::{NarrationError, NarrationResult};

/// 해설 오디오 파일.
pub const AUDIO_FILE: &str = "narration.wav";
/// 해설 스크립트 파일.
pub const SCRIPT_FILE: &str = "narration.txt";

/// 게시된 해설 클립.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationClip {
    /// 오디오 경로
    pub audio_path: PathBuf,
    /// 스크립트 경로
    pub script_path: PathBuf,
    /// 합성한 엔진
    pub engine: &'static str,
    /// 오디오 크기 (바이트)
    pub bytes: usize,
    /// 성공까지의 시도 횟수
    pub attempts: u32,
}

/// 음성 해설 생성기.
pub struct Narrator {
    engine: Option<Box<dyn SpeechEngine>>,
    publisher: Publisher,
    timeout: Duration,
    max_attempts: u32,
}

impl Narrator {
    /// 새 생성기를 생성합니다. 엔진이 없으면 스크립트만 기록합니다.
    pub fn new(
        engine: Option<Box<dyn SpeechEngine>>,
        publisher: Publisher,
        timeout: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            engine,
            publisher,
            timeout,
            max_attempts: max_attempts.max(1),
        }
    }

    /// 설정에서 엔진을 탐지해 생성합니다.
    pub fn from_settings(settings: &NarrationSettings) -> Self {
        Self::new(
            detect_engine(settings),
            Publisher::new(&settings.output_dir),
            settings.timeout(),
            settings.max_attempts,
        )
    }

    /// 사용 중인 엔진 이름.
    pub fn engine_name(&self) -> Option<&'static str> {
        self.engine.as_deref().map(|e| e.name())
    }

    /// 스크립트를 합성하고 오디오와 스크립트를 함께 게시합니다.
    ///
    /// 시도마다 타임아웃이 적용되며 최대 `max_attempts`번 시도합니다.
    /// 실패하면 이전에 게시된 클립이 그대로 남습니다.
    pub async fn synthesize(&self, script: &str) -> NarrationResult<NarrationClip> {
        let Some(engine) = self.engine.as_deref() else {
            info!(source = "narration", script, "음성 엔진 없음, 스크립트만 기록");
            return Err(NarrationError::NoEngine);
        };

        self.publisher.ensure_dir()?;
        let scratch = self
            .publisher
            .dir()
            .join(format!(".{}.synth.{}", AUDIO_FILE, std::process::id()));

        let mut last_error = NarrationError::NoEngine;
        for attempt in 1..=self.max_attempts {
            let started = Instant::now();
            let synthesis = tokio::time::timeout(self.timeout, engine.synthesize(script, &scratch));
            let audio = match synthesis.await {
                Ok(Ok(())) => read_audio(engine.name(), &scratch).await,
                Ok(Err(e)) => Err(e),
                Err(_) => Err(NarrationError::Timeout {
                    engine: engine.name(),
                    timeout: self.timeout,
                }),
            };
            let _ = tokio::fs::remove_file(&scratch).await;

            match audio {
                Ok(audio) => {
                    let bytes = audio.len();
                    self.publisher
                        .publish_owned(vec![
                            (AUDIO_FILE, audio),
                            (SCRIPT_FILE, script.as_bytes().to_vec()),
                        ])
                        .await?;
                    info!(
                        source = "narration",
                        engine = engine.name(),
                        attempt,
                        bytes,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "해설 클립 게시"
                    );
                    return Ok(NarrationClip {
                        audio_path: self.publisher.path_of(AUDIO_FILE),
                        script_path: self.publisher.path_of(SCRIPT_FILE),
                        engine: engine.name(),
                        bytes,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    warn!(
                        source = "narration",
                        engine = engine.name(),
                        attempt,
                        max_attempts = self.max_attempts,
                        kind = %e.kind(),
                        error = %e,
                        "음성 합성 실패"
                    );
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

async fn read_audio(engine: &'static str, path: &Path) -> NarrationResult<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(audio) if !audio.is_empty() => Ok(audio),
        _ => Err(NarrationError::EmptyOutput { engine }),
    }
}
