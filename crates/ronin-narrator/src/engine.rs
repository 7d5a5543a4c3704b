//! 오프라인 음성 합성 엔진.
//!
//! 두 엔진 모두 자식 프로세스로 실행되며, 스크립트를 stdin으로 받아
//! 지정한 경로에 WAV 파일을 씁니다.
//!
//! - [`PiperEngine`]: 고품질 신경망 TTS, 음성 모델(.onnx) 필요
//! - [`EspeakEngine`]: 가벼운 대체 엔진

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use ronin_core::{EngineChoice, NarrationSettings};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{NarrationError, NarrationResult};

/// 음성 합성 엔진.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// 로그에 표시되는 엔진 이름.
    fn name(&self) -> &'static str;

    /// 스크립트를 합성해 `output`에 WAV 파일로 씁니다.
    async fn synthesize(&self, script: &str, output: &Path) -> NarrationResult<()>;
}

/// Piper TTS.
#[derive(Debug, Clone)]
pub struct PiperEngine {
    bin: PathBuf,
    voice: PathBuf,
}

impl PiperEngine {
    /// 새 엔진을 생성합니다.
    pub fn new(bin: impl Into<PathBuf>, voice: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            voice: voice.into(),
        }
    }
}

#[async_trait]
impl SpeechEngine for PiperEngine {
    fn name(&self) -> &'static str {
        "piper"
    }

    async fn synthesize(&self, script: &str, output: &Path) -> NarrationResult<()> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("--model")
            .arg(&self.voice)
            .arg("--output_file")
            .arg(output);
        run_with_stdin(self.name(), cmd, script).await
    }
}

/// espeak-ng TTS.
#[derive(Debug, Clone)]
pub struct EspeakEngine {
    bin: PathBuf,
    voice: String,
}

impl EspeakEngine {
    /// 새 엔진을 생성합니다.
    pub fn new(bin: impl Into<PathBuf>, voice: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            voice: voice.into(),
        }
    }
}

#[async_trait]
impl SpeechEngine for EspeakEngine {
    fn name(&self) -> &'static str {
        "espeak"
    }

    async fn synthesize(&self, script: &str, output: &Path) -> NarrationResult<()> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("-v")
            .arg(&self.voice)
            .arg("-s")
            .arg("160")
            .arg("-w")
            .arg(output)
            .arg("--stdin");
        run_with_stdin(self.name(), cmd, script).await
    }
}

/// 스크립트를 stdin으로 넘기고 종료를 기다립니다.
///
/// 반환된 future가 타임아웃으로 drop되면 자식 프로세스도 종료됩니다.
async fn run_with_stdin(engine: &'static str, mut cmd: Command, script: &str) -> NarrationResult<()> {
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .map_err(|source| NarrationError::Spawn { engine, source })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(script.as_bytes())
            .await
            .map_err(|source| NarrationError::Spawn { engine, source })?;
        // stdin을 닫아야 엔진이 입력 끝을 인식함
        drop(stdin);
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|source| NarrationError::Spawn { engine, source })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let tail: String = stderr
            .chars()
            .rev()
            .take(300)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        return Err(NarrationError::Failed {
            engine,
            status: output.status.to_string(),
            stderr: tail,
        });
    }

    debug!(engine, "음성 합성 프로세스 종료");
    Ok(())
}

/// `PATH`에서 실행 파일을 찾습니다.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// 설정과 `PATH`에서 사용할 엔진을 결정합니다.
///
/// `auto`는 Piper(음성 모델이 있을 때) → espeak-ng → espeak 순으로 찾습니다.
pub fn detect_engine(settings: &NarrationSettings) -> Option<Box<dyn SpeechEngine>> {
    let piper = || -> Option<Box<dyn SpeechEngine>> {
        let voice = settings.piper_voice.as_ref().filter(|v| v.is_file())?;
        let bin = settings
            .piper_bin
            .clone()
            .or_else(|| find_in_path("piper"))?;
        Some(Box::new(PiperEngine::new(bin, voice.clone())))
    };
    let espeak = || -> Option<Box<dyn SpeechEngine>> {
        let bin = settings
            .espeak_bin
            .clone()
            .or_else(|| find_in_path("espeak-ng"))
            .or_else(|| find_in_path("espeak"))?;
        Some(Box::new(EspeakEngine::new(bin, settings.espeak_voice.clone())))
    };

    let engine = match settings.engine {
        EngineChoice::None => return None,
        EngineChoice::Piper => piper(),
        EngineChoice::Espeak => espeak(),
        EngineChoice::Auto => piper().or_else(espeak),
    };

    match &engine {
        Some(e) => info!(engine = e.name(), "음성 합성 엔진 선택"),
        None => warn!(
            requested = ?settings.engine,
            "사용 가능한 음성 합성 엔진 없음, 스크립트만 기록합니다"
        ),
    }
    engine
}
