//! Silver Ronin livestream service CLI.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use ronin_core::{init_logging, LogConfig, LogFormat, RoninConfig};
use ronin_stream::Service;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "silver-ronin")]
#[command(about = "Silver Ronin 24/7 Precious Metals Livestream", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 경로 (TOML)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error). 설정 파일보다 우선
    #[arg(long)]
    log_level: Option<String>,

    /// 로그 형식 (pretty, json, compact). 설정 파일보다 우선
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// 한 번만 갱신하고 종료
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 설정 로드 (실패 시 로깅 초기화 전이므로 stderr로 출력)
    let config = match RoninConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("silver-ronin: {e}");
            return ExitCode::from(2);
        }
    };

    let mut log_config = LogConfig::from_settings(&config.settings.logging);
    if let Some(level) = cli.log_level.clone() {
        log_config.level = level;
    }
    if let Some(format) = cli.log_format {
        log_config = log_config.with_format(format);
    }
    if let Err(e) = init_logging(log_config) {
        eprintln!("silver-ronin: 로깅 초기화 실패: {e}");
        return ExitCode::FAILURE;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        metals = ?config.settings.price.metals,
        currency = config.settings.price.currency.code(),
        "Silver Ronin 시작"
    );

    match run(cli, config).await {
        Ok(()) => {
            info!("Silver Ronin 종료");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = format!("{e:#}"), "Silver Ronin 비정상 종료");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: RoninConfig) -> anyhow::Result<()> {
    let service = Service::from_config(config).context("서비스 구성 실패")?;

    if cli.once {
        return service.run_once().await.context("단일 갱신 실패");
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    service.run(shutdown).await.context("갱신 루프 실패")
}

async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Ctrl+C 핸들러 설치 실패");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "SIGTERM 핸들러 설치 실패");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    // 갱신 루프와 해설 작업에 종료 시그널 전파
    shutdown_token.cancel();
}
