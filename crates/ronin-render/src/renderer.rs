//! 시간 예산이 있는 렌더링과 게시.

use std::sync::Arc;
use std::time::Duration;

use ronin_core::RenderSettings;
use tracing::warn;

use crate::error::{RenderError, RenderResult};
use crate::frame::{render, RenderFrame, RenderInput, RenderOptions};
use crate::publish::Publisher;

/// 입력으로 프레임을 만드는 함수. 기본값은 [`render`].
pub type RenderFn =
    Arc<dyn Fn(&RenderInput, &RenderOptions) -> RenderResult<RenderFrame> + Send + Sync>;

/// 프레임 렌더러.
///
/// 렌더링은 블로킹 스레드에서 시간 예산 안에 실행되며, 예산을 넘기면
/// 결과를 버리고 이전 프레임을 그대로 둡니다.
#[derive(Clone)]
pub struct Renderer {
    options: RenderOptions,
    publisher: Publisher,
    budget: Duration,
    render_fn: RenderFn,
}

impl Renderer {
    /// 새 렌더러를 생성합니다.
    pub fn new(options: RenderOptions, publisher: Publisher, budget: Duration) -> Self {
        Self {
            options,
            publisher,
            budget,
            render_fn: Arc::new(render),
        }
    }

    /// 프레임 생성 함수를 교체합니다.
    pub fn with_render_fn<F>(mut self, render_fn: F) -> Self
    where
        F: Fn(&RenderInput, &RenderOptions) -> RenderResult<RenderFrame> + Send + Sync + 'static,
    {
        self.render_fn = Arc::new(render_fn);
        self
    }

    /// 설정에서 생성합니다.
    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self::new(
            RenderOptions::from(settings),
            Publisher::new(&settings.output_dir),
            settings.timeout(),
        )
    }

    /// 게시자.
    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// 시간 예산 안에서 프레임을 생성합니다.
    pub async fn render(&self, input: RenderInput) -> RenderResult<RenderFrame> {
        let options = self.options.clone();
        let render_fn = Arc::clone(&self.render_fn);
        let task = tokio::task::spawn_blocking(move || render_fn(&input, &options));

        match tokio::time::timeout(self.budget, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(RenderError::Task(e.to_string())),
            Err(_) => {
                warn!(
                    source = "render",
                    kind = "render_timeout",
                    budget_ms = self.budget.as_millis() as u64,
                    "렌더링 시간 초과, 이전 프레임 유지"
                );
                Err(RenderError::Timeout(self.budget))
            }
        }
    }

    /// 프레임의 모든 산출물을 원자적으로 게시합니다.
    pub async fn publish(&self, frame: &RenderFrame) -> RenderResult<()> {
        let files = frame
            .artifacts()
            .iter()
            .map(|(name, contents)| (*name, contents.to_vec()))
            .collect();
        self.publisher.publish_owned(files).await
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("options", &self.options)
            .field("publisher", &self.publisher)
            .field("budget", &self.budget)
            .finish_non_exhaustive()
    }
}
