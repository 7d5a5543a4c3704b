//! 음성 해설.
//!
//! 최신 시세와 뉴스로 해설 스크립트를 만들고, 오프라인 TTS 엔진으로
//! 합성한 오디오를 OBS가 읽는 경로에 원자적으로 게시합니다.

pub mod engine;
pub mod error;
pub mod narrator;
pub mod script;

pub use engine::{detect_engine, find_in_path, EspeakEngine, PiperEngine, SpeechEngine};
pub use error::{NarrationError, NarrationResult};
pub use narrator::{NarrationClip, Narrator, AUDIO_FILE, SCRIPT_FILE};
pub use script::{compose_script, NarrationContext, Trend, MAX_HEADLINES};
