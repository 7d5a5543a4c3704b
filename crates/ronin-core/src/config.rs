//! 설정 관리.
//!
//! 설정은 시작 시 한 번만 로드되며 이후 변경되지 않습니다.
//! 로드 순서 (뒤가 우선):
//! 1. 내장 기본값
//! 2. TOML 설정 파일 (선택)
//! 3. `RONIN__` 접두사 환경 변수 (예: `RONIN__CADENCE__PRICE_SECS=30`)
//! 4. 관례적 환경 변수 (`METALPRICE_API_KEY`, `NEWSAPI_API_KEY`, `UPDATE_INTERVAL` 등)
//!
//! API 키는 `SecretString`으로 보관되며 로그에 출력되지 않습니다.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Currency, Metal};

/// 파이프라인 전체 설정.
#[derive(Debug)]
pub struct RoninConfig {
    /// 비밀이 아닌 설정 값
    pub settings: Settings,
    /// 프로바이더 API 키
    pub credentials: Credentials,
}

/// 비밀이 아닌 설정 값 (설정 파일/환경 변수에서 역직렬화).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// 시세 조회 설정
    pub price: PriceSettings,
    /// 뉴스 조회 설정
    pub news: NewsSettings,
    /// 갱신 주기 설정
    pub cadence: CadenceSettings,
    /// 재시도 설정
    pub retry: RetrySettings,
    /// 렌더링 설정
    pub render: RenderSettings,
    /// 음성 해설 설정
    pub narration: NarrationSettings,
    /// 종료 설정
    pub shutdown: ShutdownSettings,
    /// 로깅 설정
    pub logging: LoggingSettings,
}

/// 시세 조회 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PriceSettings {
    /// 1차 프로바이더(MetalPriceAPI) 기본 URL
    pub primary_url: String,
    /// 2차 프로바이더(GoldAPI) 기본 URL
    pub secondary_url: String,
    /// 조회할 귀금속 목록
    pub metals: Vec<Metal>,
    /// 표시 통화
    pub currency: Currency,
    /// 요청 타임아웃 (밀리초)
    pub request_timeout_ms: u64,
}

impl Default for PriceSettings {
    fn default() -> Self {
        Self {
            primary_url: "https://api.metalpriceapi.com/v1".to_string(),
            secondary_url: "https://www.goldapi.io/api".to_string(),
            metals: Metal::ALL.to_vec(),
            currency: Currency::Usd,
            request_timeout_ms: 5_000,
        }
    }
}

impl PriceSettings {
    /// 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// 뉴스 조회 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NewsSettings {
    /// 뉴스 조회 활성화 여부
    pub enabled: bool,
    /// NewsAPI 기본 URL
    pub base_url: String,
    /// 검색 쿼리
    pub query: String,
    /// 티커에 표시할 최대 헤드라인 수
    pub max_items: usize,
    /// 이보다 오래된 기사는 제외 (시간)
    pub max_age_hours: i64,
    /// 요청 타임아웃 (밀리초)
    pub request_timeout_ms: u64,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://newsapi.org/v2".to_string(),
            query: "gold OR silver OR platinum OR palladium OR \"precious metals\"".to_string(),
            max_items: 10,
            max_age_hours: 24 * 7,
            request_timeout_ms: 5_000,
        }
    }
}

impl NewsSettings {
    /// 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// 갱신 주기 설정 (초 단위, price < news < narration).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CadenceSettings {
    /// 시세 갱신 주기
    pub price_secs: u64,
    /// 뉴스 갱신 주기
    pub news_secs: u64,
    /// 음성 해설 주기
    pub narration_secs: u64,
}

impl Default for CadenceSettings {
    fn default() -> Self {
        Self {
            price_secs: 60,
            news_secs: 300,
            narration_secs: 900,
        }
    }
}

impl CadenceSettings {
    /// 시세 갱신 주기를 Duration으로 반환
    pub fn price(&self) -> Duration {
        Duration::from_secs(self.price_secs)
    }

    /// 뉴스 갱신 주기를 Duration으로 반환
    pub fn news(&self) -> Duration {
        Duration::from_secs(self.news_secs)
    }

    /// 음성 해설 주기를 Duration으로 반환
    pub fn narration(&self) -> Duration {
        Duration::from_secs(self.narration_secs)
    }
}

/// 재시도 설정 (지수 백오프).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySettings {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// 첫 재시도 전 대기 (밀리초)
    pub initial_backoff_ms: u64,
    /// 최대 대기 (밀리초)
    pub max_backoff_ms: u64,
    /// 대기 시간 배수
    pub multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            multiplier: 2.0,
        }
    }
}

/// 렌더링 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderSettings {
    /// 산출물 디렉토리 (OBS가 읽는 경로)
    pub output_dir: PathBuf,
    /// 렌더링 시간 예산 (밀리초)
    pub timeout_ms: u64,
    /// 이 시간보다 오래된 시세는 [stale]로 표시 (초)
    pub stale_after_secs: u64,
    /// 귀금속별 가격 이력 보관 개수
    pub history_points: usize,
    /// 차트 너비 (px)
    pub chart_width: u32,
    /// 차트 높이 (px)
    pub chart_height: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("assets"),
            timeout_ms: 5_000,
            stale_after_secs: 600,
            history_points: 100,
            chart_width: 1280,
            chart_height: 720,
        }
    }
}

impl RenderSettings {
    /// 렌더링 시간 예산을 Duration으로 반환
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// 오래된 시세 판단 기준을 Duration으로 반환
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

/// 음성 합성 엔진 선택.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineChoice {
    /// Piper 우선, 없으면 espeak-ng
    #[default]
    Auto,
    /// Piper
    Piper,
    /// espeak-ng
    Espeak,
    /// 음성 합성 안 함 (스크립트만 기록)
    None,
}

/// 음성 해설 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NarrationSettings {
    /// 음성 해설 활성화 여부
    pub enabled: bool,
    /// 합성 엔진
    pub engine: EngineChoice,
    /// Piper 실행 파일 경로 (없으면 PATH에서 탐색)
    pub piper_bin: Option<PathBuf>,
    /// Piper 음성 모델 (.onnx)
    pub piper_voice: Option<PathBuf>,
    /// espeak-ng 실행 파일 경로 (없으면 PATH에서 탐색)
    pub espeak_bin: Option<PathBuf>,
    /// espeak 음성 코드 (예: "en-us")
    pub espeak_voice: String,
    /// 합성 타임아웃 (밀리초)
    pub timeout_ms: u64,
    /// 해설 사이클당 최대 시도 횟수
    pub max_attempts: u32,
    /// 오디오 산출물 디렉토리
    pub output_dir: PathBuf,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            engine: EngineChoice::Auto,
            piper_bin: None,
            piper_voice: None,
            espeak_bin: None,
            espeak_voice: "en-us".to_string(),
            timeout_ms: 30_000,
            max_attempts: 2,
            output_dir: PathBuf::from("assets/audio"),
        }
    }
}

impl NarrationSettings {
    /// 합성 타임아웃을 Duration으로 반환
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// 종료 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownSettings {
    /// 진행 중 작업 대기 시간 (밀리초)
    pub grace_ms: u64,
}

impl Default for ShutdownSettings {
    fn default() -> Self {
        Self { grace_ms: 10_000 }
    }
}

impl ShutdownSettings {
    /// 종료 유예 시간을 Duration으로 반환
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 프로바이더 API 키.
#[derive(Debug)]
pub struct Credentials {
    /// MetalPriceAPI 키 (필수)
    pub metalprice: SecretString,
    /// GoldAPI 키 (2차 프로바이더, 선택)
    pub goldapi: Option<SecretString>,
    /// NewsAPI 키 (뉴스 활성화 시 필수)
    pub newsapi: Option<SecretString>,
}

/// 관례적 환경 변수 → 설정 키 매핑.
const ENV_OVERRIDES: [(&str, &str); 5] = [
    ("METALPRICE_API_KEY", "credentials.metalprice_api_key"),
    ("GOLDAPI_API_KEY", "credentials.goldapi_api_key"),
    ("NEWSAPI_API_KEY", "credentials.newsapi_api_key"),
    ("UPDATE_INTERVAL", "cadence.price_secs"),
    ("OUTPUT_DIR", "render.output_dir"),
];

impl RoninConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// `.env` 파일이 있으면 먼저 읽습니다.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        dotenvy::dotenv().ok();
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load_with_env(path, &env)
    }

    /// 명시적인 환경 변수 맵으로 설정을 로드합니다.
    pub fn load_with_env(path: Option<&Path>, env: &HashMap<String, String>) -> ConfigResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("RONIN")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("price.metals")
                .try_parsing(true)
                .source(Some(env.clone().into_iter().collect())),
        );

        for (var, key) in ENV_OVERRIDES {
            let value = env.get(var).map(|v| v.trim()).filter(|v| !v.is_empty());
            builder = builder.set_override_option(key, value.map(str::to_string))?;
        }

        let raw = builder.build()?;
        let settings: Settings = raw.clone().try_deserialize()?;

        let secret = |key: &str| -> Option<SecretString> {
            raw.get_string(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| SecretString::new(v.into()))
        };

        let credentials = Credentials {
            metalprice: secret("credentials.metalprice_api_key").ok_or_else(|| {
                ConfigError::Missing(
                    "METALPRICE_API_KEY (credentials.metalprice_api_key)".to_string(),
                )
            })?,
            goldapi: secret("credentials.goldapi_api_key"),
            newsapi: secret("credentials.newsapi_api_key"),
        };

        let config = Self {
            settings,
            credentials,
        };
        config.validate()?;
        Ok(config)
    }

    /// 설정 값의 일관성을 검증합니다.
    pub fn validate(&self) -> ConfigResult<()> {
        let s = &self.settings;

        if s.news.enabled && self.credentials.newsapi.is_none() {
            return Err(ConfigError::Missing(
                "NEWSAPI_API_KEY (credentials.newsapi_api_key), 또는 news.enabled = false"
                    .to_string(),
            ));
        }

        if s.price.metals.is_empty() {
            return Err(ConfigError::Invalid(
                "price.metals 목록이 비어 있습니다".to_string(),
            ));
        }

        let c = &s.cadence;
        if c.price_secs == 0 || c.news_secs == 0 || c.narration_secs == 0 {
            return Err(ConfigError::Invalid(
                "갱신 주기는 0보다 커야 합니다".to_string(),
            ));
        }
        if !(c.price_secs < c.news_secs && c.news_secs < c.narration_secs) {
            return Err(ConfigError::Invalid(format!(
                "갱신 주기는 price < news < narration 이어야 합니다 ({} / {} / {})",
                c.price_secs, c.news_secs, c.narration_secs
            )));
        }

        if s.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts는 1 이상이어야 합니다".to_string(),
            ));
        }
        if s.retry.multiplier < 1.0 {
            return Err(ConfigError::Invalid(
                "retry.multiplier는 1.0 이상이어야 합니다".to_string(),
            ));
        }

        if s.price.request_timeout_ms == 0 || s.news.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_ms는 0보다 커야 합니다".to_string(),
            ));
        }
        if s.render.timeout_ms == 0 || s.narration.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "render/narration timeout_ms는 0보다 커야 합니다".to_string(),
            ));
        }
        if s.render.timeout() >= c.price() {
            return Err(ConfigError::Invalid(format!(
                "render.timeout_ms({})는 시세 주기({}초)보다 짧아야 합니다",
                s.render.timeout_ms, c.price_secs
            )));
        }

        if s.render.history_points == 0 {
            return Err(ConfigError::Invalid(
                "render.history_points는 1 이상이어야 합니다".to_string(),
            ));
        }

        if s.narration.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "narration.max_attempts는 1 이상이어야 합니다".to_string(),
            ));
        }

        Ok(())
    }
}
