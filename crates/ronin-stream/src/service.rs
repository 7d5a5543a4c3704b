//! 설정으로부터 서비스 구성.

use std::time::Duration;

use ronin_core::{Credentials, RoninConfig};
use ronin_feed::{
    GoldApiProvider, MetalPriceApiProvider, NewsApiProvider, NewsFetcher, PriceFetcher,
    RetryConfig,
};
use ronin_narrator::Narrator;
use ronin_render::Renderer;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::Result;
use crate::narration::{narrate_once, run_narration};
use crate::refresh::{Cadences, Due, RefreshLoop};

/// 갱신 루프와 해설 작업을 묶은 서비스.
pub struct Service {
    refresh: RefreshLoop,
    narrator: Option<Narrator>,
    narration_cadence: Duration,
    grace: Duration,
}

impl Service {
    /// 새 서비스를 생성합니다.
    pub fn new(
        refresh: RefreshLoop,
        narrator: Option<Narrator>,
        narration_cadence: Duration,
        grace: Duration,
    ) -> Self {
        Self {
            refresh,
            narrator,
            narration_cadence,
            grace,
        }
    }

    /// 설정으로 프로바이더, 렌더러, 해설기를 구성합니다.
    pub fn from_config(config: RoninConfig) -> Result<Self> {
        let RoninConfig {
            settings,
            credentials,
        } = config;
        let Credentials {
            metalprice,
            goldapi,
            newsapi,
        } = credentials;

        let client = reqwest::Client::builder()
            .user_agent(concat!("silver-ronin/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let retry = RetryConfig::from(&settings.retry);

        let price_timeout = settings.price.request_timeout();
        let primary = MetalPriceApiProvider::new(
            client.clone(),
            settings.price.primary_url.as_str(),
            metalprice,
            price_timeout,
        );
        let mut prices =
            PriceFetcher::new(Box::new(primary), settings.price.currency, retry.clone());
        match goldapi {
            Some(key) => {
                let secondary = GoldApiProvider::new(
                    client.clone(),
                    settings.price.secondary_url.as_str(),
                    key,
                    price_timeout,
                );
                prices = prices.with_secondary(Box::new(secondary));
            }
            None => info!(source = "price", "GOLDAPI_API_KEY 없음, 2차 프로바이더 미사용"),
        }

        let news = match (settings.news.enabled, newsapi) {
            (true, Some(key)) => {
                let provider = NewsApiProvider::new(
                    client,
                    settings.news.base_url.as_str(),
                    key,
                    settings.news.query.as_str(),
                    settings.news.request_timeout(),
                );
                Some(NewsFetcher::new(
                    Box::new(provider),
                    retry,
                    settings.news.max_age_hours,
                    settings.render.stale_after(),
                ))
            }
            (true, None) => {
                warn!(source = "news", "NewsAPI 키 없음, 뉴스 티커 비활성화");
                None
            }
            (false, _) => None,
        };

        let refresh = RefreshLoop::new(
            prices,
            news,
            Renderer::from_settings(&settings.render),
            settings.price.metals.clone(),
            Cadences::from(&settings.cadence),
        )
        .with_max_news_items(settings.news.max_items)
        .with_history_points(settings.render.history_points);

        let narrator = settings
            .narration
            .enabled
            .then(|| Narrator::from_settings(&settings.narration));

        Ok(Self::new(
            refresh,
            narrator,
            settings.cadence.narration(),
            settings.shutdown.grace(),
        ))
    }

    /// 종료 신호가 올 때까지 실행합니다.
    ///
    /// 갱신 루프가 끝나면 해설 작업에 종료 유예 시간을 주고, 그 안에 끝나지
    /// 않으면 중단합니다.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let Service {
            refresh,
            narrator,
            narration_cadence,
            grace,
        } = self;

        let narration = narrator.map(|narrator| {
            tokio::spawn(run_narration(
                narrator,
                refresh.subscribe(),
                narration_cadence,
                shutdown.clone(),
            ))
        });

        let result = refresh.run(shutdown.clone()).await;
        shutdown.cancel();

        if let Some(handle) = narration {
            let abort = handle.abort_handle();
            if tokio::time::timeout(grace, handle).await.is_err() {
                warn!(
                    source = "narration",
                    grace_ms = grace.as_millis() as u64,
                    "종료 유예 시간 초과, 해설 작업 중단"
                );
                abort.abort();
            }
        }

        result
    }

    /// 초기 프레임과 한 번의 전체 갱신, 한 번의 해설만 실행합니다.
    pub async fn run_once(self) -> Result<()> {
        let Service {
            mut refresh,
            narrator,
            ..
        } = self;

        let updates = refresh.subscribe();
        refresh.startup().await?;
        refresh.run_cycle(Due::all()).await.log_summary();

        if let Some(narrator) = narrator {
            let context = updates.borrow().clone();
            if let Some(context) = context {
                narrate_once(&narrator, &context, 1).await;
            }
        }
        Ok(())
    }
}
