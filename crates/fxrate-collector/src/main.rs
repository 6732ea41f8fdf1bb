//! FX rate backfill CLI.

use clap::Parser;
use fxrate_collector::{
    run_backfill, CollectorError, RunSettings, RunSummary, Secrets, SettingsOverrides,
};
use fxrate_core::logging::{init_logging, LogConfig, LogFormat};
use fxrate_data::{storage, ExchangeRateHostClient};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "fxrate-collector")]
#[command(about = "Backfill daily FX rates into a Postgres table", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 경로 (기본: config.yaml, 없으면 무시)
    #[arg(long)]
    config: Option<PathBuf>,

    /// 시작일 (YYYY-MM-DD 또는 today)
    #[arg(long)]
    start: Option<String>,

    /// 종료일 (YYYY-MM-DD 또는 today)
    #[arg(long)]
    end: Option<String>,

    /// 통화 목록 (쉼표로 구분, 예: "CAD,EUR,GBP") 또는 ALL
    #[arg(long)]
    symbols: Option<String>,

    /// 대상 테이블
    #[arg(long)]
    table: Option<String>,

    /// 요청당 최대 일수 (1~365)
    #[arg(long)]
    batch_days: Option<u32>,

    /// upsert 배치 크기
    #[arg(long)]
    upsert_batch_size: Option<u32>,

    /// 저장 없이 건수만 출력
    #[arg(long)]
    dry_run: bool,

    /// 기준 통화
    #[arg(long)]
    base_currency: Option<String>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            start: self.start.clone(),
            end: self.end.clone(),
            symbols: self.symbols.clone(),
            table: self.table.clone(),
            batch_days: self.batch_days,
            upsert_batch_size: self.upsert_batch_size,
            // 플래그가 없으면 설정 파일/환경변수 값 유지
            dry_run: self.dry_run.then_some(true),
            base_currency: self.base_currency.clone(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    // 로깅 초기화
    let log_config = LogConfig::new(format!(
        "fxrate_collector={0},fxrate_data={0},fxrate_core={0}",
        cli.log_level
    ))
    .with_env_format();
    let log_config = match cli.log_format {
        Some(format) => log_config.with_format(format),
        None => log_config,
    };
    if let Err(e) = init_logging(log_config) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli).await {
        Ok(summary) => {
            summary.log_summary();
            println!("{}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "백필 실패");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<RunSummary, CollectorError> {
    tracing::info!("FX Rate Collector 시작");

    // 설정 로드 및 검증 (네트워크 호출 전)
    let settings = RunSettings::load(cli.config.as_deref(), &cli.overrides())?;
    let provider_settings = settings.provider_settings();
    let today = chrono::Utc::now().date_naive();
    let config = settings.into_pipeline_config(today)?;
    config.validate()?;

    let secrets = Secrets::from_env()?;
    let client = ExchangeRateHostClient::new(secrets.provider_key.clone(), provider_settings)?;

    let summary = run_backfill(&config, Arc::new(client), || {
        storage::connect(&secrets.store_url, &secrets.store_key)
    })
    .await?;

    tracing::info!("FX Rate Collector 종료");
    Ok(summary)
}
