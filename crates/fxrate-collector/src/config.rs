//! 실행 설정 및 비밀값 로드.
//!
//! 설정 우선순위 (뒤가 앞을 덮어씀):
//!
//! 1. 기본값
//! 2. 설정 파일 (`config.yaml`, 확장자로 형식 판별)
//! 3. `FXRATE_*` 환경변수 (예: `FXRATE_BATCH_DAYS=90`)
//! 4. CLI 플래그
//!
//! 비밀값(저장소 URL/키, 제공자 키)은 설정 파일에 두지 않고 환경변수 또는
//! `.env`에서만 읽습니다.

use crate::error::{CollectorError, Result};
use chrono::NaiveDate;
use fxrate_core::{parse_date, CurrencyCode, DateChunker, DateRange};
use fxrate_data::provider::MAX_TIMEFRAME_SPAN_DAYS;
use fxrate_data::storage::validate_table_name;
use fxrate_data::{ProviderSettings, SymbolMode};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 기본 설정 파일 경로 (없으면 무시)
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// 환경변수 접두사
pub const ENV_PREFIX: &str = "FXRATE";

pub const SUPABASE_URL: &str = "SUPABASE_URL";
pub const SUPABASE_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const EXCHANGERATE_HOST_KEY: &str = "EXCHANGERATE_HOST_KEY";

/// 파일/환경변수/CLI를 병합한 실행 설정 (파싱 전 원본 값).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunSettings {
    /// 시작일 (`YYYY-MM-DD` 또는 `today`)
    pub start: String,
    /// 종료일 (`YYYY-MM-DD` 또는 `today`)
    pub end: String,
    /// `ALL` 또는 쉼표 구분 통화 코드
    pub symbols: String,
    /// 대상 테이블
    pub table: String,
    /// 청크 최대 일수
    pub batch_days: u32,
    /// upsert 배치 크기
    pub upsert_batch_size: usize,
    /// 저장 없이 건수만 출력
    pub dry_run: bool,
    pub base_currency: String,
    /// 레코드의 `provider` 값
    pub provider_tag: String,
    pub provider_base_url: String,
    pub request_timeout_secs: u64,
    pub catalog_timeout_secs: u64,
}

/// CLI에서 전달된 덮어쓰기 값.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub start: Option<String>,
    pub end: Option<String>,
    pub symbols: Option<String>,
    pub table: Option<String>,
    pub batch_days: Option<u32>,
    pub upsert_batch_size: Option<u32>,
    pub dry_run: Option<bool>,
    pub base_currency: Option<String>,
}

impl RunSettings {
    /// 설정을 로드합니다.
    ///
    /// `path`를 지정하면 해당 파일이 반드시 존재해야 하고,
    /// 지정하지 않으면 `config.yaml`이 있을 때만 읽습니다.
    pub fn load(path: Option<&Path>, overrides: &SettingsOverrides) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false),
        };
        let env = config::Environment::with_prefix(ENV_PREFIX).try_parsing(true);

        Self::layered(file, env, overrides)
    }

    /// 기본값 → `file` → `env` → `overrides` 순서로 병합합니다.
    fn layered<S>(file: S, env: config::Environment, overrides: &SettingsOverrides) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("start", "2020-01-01")?
            .set_default("end", "today")?
            .set_default("symbols", "CAD,EUR,GBP,TRY,AED")?
            .set_default("table", "exchange_rates")?
            .set_default("batch_days", 365)?
            .set_default("upsert_batch_size", 1000)?
            .set_default("dry_run", false)?
            .set_default("base_currency", "USD")?
            .set_default("provider_tag", "exchangerate.host")?
            .set_default("provider_base_url", "https://api.exchangerate.host")?
            .set_default("request_timeout_secs", 60)?
            .set_default("catalog_timeout_secs", 30)?
            // 파일에서 로드
            .add_source(file)
            // 환경 변수로 오버라이드
            .add_source(env)
            // CLI 플래그가 최우선
            .set_override_option("start", overrides.start.clone())?
            .set_override_option("end", overrides.end.clone())?
            .set_override_option("symbols", overrides.symbols.clone())?
            .set_override_option("table", overrides.table.clone())?
            .set_override_option("batch_days", overrides.batch_days.map(i64::from))?
            .set_override_option(
                "upsert_batch_size",
                overrides.upsert_batch_size.map(i64::from),
            )?
            .set_override_option("dry_run", overrides.dry_run)?
            .set_override_option("base_currency", overrides.base_currency.clone())?;

        let settings: RunSettings = builder.build()?.try_deserialize()?;
        tracing::debug!(?settings, "설정 로드 완료");
        Ok(settings)
    }

    /// 날짜/통화 값을 파싱해 파이프라인 설정을 만듭니다.
    ///
    /// `today`는 현재 UTC 날짜입니다. 날짜 순서는 [`PipelineConfig::validate`]가 검증합니다.
    pub fn into_pipeline_config(self, today: NaiveDate) -> Result<PipelineConfig> {
        Ok(PipelineConfig {
            start: parse_date(&self.start, today)?,
            end: parse_date(&self.end, today)?,
            symbols: SymbolMode::parse(&self.symbols)?,
            table: self.table,
            batch_days: self.batch_days,
            upsert_batch_size: self.upsert_batch_size,
            dry_run: self.dry_run,
            base_currency: CurrencyCode::new(&self.base_currency)?,
            provider_tag: self.provider_tag,
        })
    }

    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            base_url: self.provider_base_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            catalog_timeout: Duration::from_secs(self.catalog_timeout_secs),
        }
    }
}

/// 한 번의 실행에 필요한 검증 전 파이프라인 설정.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub symbols: SymbolMode,
    pub table: String,
    pub batch_days: u32,
    pub upsert_batch_size: usize,
    pub dry_run: bool,
    pub base_currency: CurrencyCode,
    pub provider_tag: String,
}

impl PipelineConfig {
    /// 네트워크 호출 전 입력 검증.
    ///
    /// 날짜 순서, 청크 일수(1~365), 배치 크기, 테이블 이름을 확인하고
    /// 검증된 범위와 청크 분할기를 반환합니다.
    pub fn validate(&self) -> Result<(DateRange, DateChunker)> {
        let range = DateRange::new(self.start, self.end)?;
        let chunker = DateChunker::new(self.batch_days)?;

        if self.batch_days > MAX_TIMEFRAME_SPAN_DAYS {
            return Err(CollectorError::Configuration(format!(
                "batch_days must be at most {} (got {})",
                MAX_TIMEFRAME_SPAN_DAYS, self.batch_days
            )));
        }
        if self.upsert_batch_size == 0 {
            return Err(CollectorError::Configuration(
                "upsert_batch_size must be at least 1".to_string(),
            ));
        }
        validate_table_name(&self.table)
            .map_err(|e| CollectorError::Configuration(e.to_string()))?;

        Ok((range, chunker))
    }
}

/// 필수 비밀값.
///
/// `Debug`를 구현하지 않습니다 (저장소 URL에 비밀번호가 포함될 수 있음).
#[derive(Clone)]
pub struct Secrets {
    /// 저장소 엔드포인트 (`https://…` 또는 `postgres://…`)
    pub store_url: String,
    /// 저장소 서비스 키
    pub store_key: SecretString,
    /// exchangerate.host 액세스 키
    pub provider_key: SecretString,
}

impl Secrets {
    /// 환경변수에서 읽습니다. `.env`는 바이너리 시작 시 한 번 로드됩니다.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 주어진 조회 함수로 읽습니다. 비어 있는 값은 누락으로 취급합니다.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    CollectorError::Configuration(format!(
                        "{} 환경변수가 설정되지 않았습니다",
                        key
                    ))
                })
        };

        Ok(Self {
            store_url: require(SUPABASE_URL)?,
            store_key: SecretString::new(require(SUPABASE_SERVICE_ROLE_KEY)?.into()),
            provider_key: SecretString::new(require(EXCHANGERATE_HOST_KEY)?.into()),
        })
    }
}
