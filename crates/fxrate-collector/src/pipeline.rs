//! 환율 백필 파이프라인.
//!
//! ```text
//! 검증 → 통화 결정 → 청크별 조회(순차) → 레코드 변환 → (dry-run: 보고) | (배치 upsert) → 완료
//! ```
//!
//! 모든 청크 조회가 성공한 뒤에만 저장을 시작합니다. 배치 실패 시 이전 배치는
//! 이미 반영된 상태로 남고 이후 배치는 실행하지 않습니다.

use crate::config::PipelineConfig;
use crate::error::{CollectorError, Result};
use crate::stats::RunSummary;
use chrono::NaiveDate;
use fxrate_core::{CurrencyCode, DateChunker, DateRange, NormalizedQuotes, RateRow};
use fxrate_data::{QuoteSource, RateFetcher, RateStore, StoreError, SymbolResolver};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// 백필 실행기.
pub struct RatePipeline {
    fetcher: RateFetcher,
    resolver: SymbolResolver,
    store: Option<Arc<dyn RateStore>>,
}

impl RatePipeline {
    /// `store`는 dry-run 실행이면 `None`이어도 됩니다.
    pub fn new(
        fetcher: RateFetcher,
        resolver: SymbolResolver,
        store: Option<Arc<dyn RateStore>>,
    ) -> Self {
        Self {
            fetcher,
            resolver,
            store,
        }
    }

    /// 제공자 하나로 조회기와 통화 결정기를 함께 구성합니다.
    pub fn from_source(
        source: Arc<dyn QuoteSource>,
        base: CurrencyCode,
        store: Option<Arc<dyn RateStore>>,
    ) -> Self {
        Self::new(
            RateFetcher::new(source.clone(), base.clone()),
            SymbolResolver::new(source, base),
            store,
        )
    }

    /// 백필을 실행합니다.
    pub async fn run(&self, config: &PipelineConfig) -> Result<RunSummary> {
        let started = Instant::now();
        let (range, chunker) = self.validate(config)?;

        let mut summary = RunSummary {
            dry_run: config.dry_run,
            table: config.table.clone(),
            ..Default::default()
        };

        tracing::info!(
            range = %range,
            days = range.num_days(),
            batch_days = chunker.max_span_days(),
            base = %config.base_currency,
            dry_run = config.dry_run,
            "환율 백필 시작"
        );

        // 1. 통화 결정
        let symbols = self.resolver.resolve(&config.symbols).await?;
        summary.symbols = symbols.len();

        // 2. 청크별 조회 (순차)
        let chunks: Vec<_> = chunker.chunks(range).collect();
        let mut rows: Vec<RateRow> = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            let quotes = self.fetcher.fetch(chunk, Some(&symbols)).await?;
            summary.chunks += 1;

            tracing::info!(
                chunk = %chunk,
                progress = format!("{}/{}", idx + 1, chunks.len()),
                days = quotes.day_count(),
                quotes = quotes.quote_count(),
                "청크 조회 완료"
            );

            summary.skipped += flatten_quotes(&quotes, config, &mut rows);
        }

        summary.rows_prepared = rows.len();
        tracing::info!(
            rows = rows.len(),
            table = %config.table,
            "upsert 대상 레코드 준비 완료"
        );

        // 3. 저장
        if config.dry_run {
            tracing::info!("dry-run 모드: 저장 생략");
        } else {
            let store = self.store.as_ref().ok_or_else(|| {
                CollectorError::Configuration("저장소가 구성되지 않았습니다".to_string())
            })?;

            let total_batches = rows.len().div_ceil(config.upsert_batch_size);
            for (idx, batch) in rows.chunks(config.upsert_batch_size).enumerate() {
                let written = store.upsert_rates(&config.table, batch).await?;
                summary.rows_written += written;
                summary.batches += 1;

                tracing::debug!(
                    batch = idx + 1,
                    total = total_batches,
                    size = batch.len(),
                    table = %config.table,
                    "배치 upsert 완료"
                );
            }
        }

        summary.elapsed = started.elapsed();
        Ok(summary)
    }

    /// 네트워크 호출 전 입력 검증 (설정 검증 + 조회기 기준 통화 일치).
    fn validate(&self, config: &PipelineConfig) -> Result<(DateRange, DateChunker)> {
        let validated = config.validate()?;
        if &config.base_currency != self.fetcher.base() {
            return Err(CollectorError::Configuration(format!(
                "base currency {} does not match fetcher base {}",
                config.base_currency,
                self.fetcher.base()
            )));
        }
        Ok(validated)
    }
}

/// 설정 검증 → (dry-run이 아니면) 저장소 연결 → 백필 실행.
///
/// `connect_store`는 검증을 통과하고 실제로 저장할 때만 한 번 호출됩니다.
pub async fn run_backfill<F, Fut>(
    config: &PipelineConfig,
    source: Arc<dyn QuoteSource>,
    connect_store: F,
) -> Result<RunSummary>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<Arc<dyn RateStore>, StoreError>>,
{
    config.validate()?;

    // dry-run이면 저장소에 연결하지 않음
    let store = if config.dry_run {
        None
    } else {
        Some(connect_store().await?)
    };

    RatePipeline::from_source(source, config.base_currency.clone(), store)
        .run(config)
        .await
}

/// 정규화된 시세를 날짜 오름차순으로 레코드로 변환해 `rows`에 추가합니다.
///
/// 잘못된 환율(비유한, 0 이하)과 해석할 수 없는 날짜는 건너뛰며, 그 수를 반환합니다.
fn flatten_quotes(
    quotes: &NormalizedQuotes,
    config: &PipelineConfig,
    rows: &mut Vec<RateRow>,
) -> usize {
    let mut skipped = 0;

    for (date_str, day) in quotes.days() {
        let Ok(rate_date) = date_str.parse::<NaiveDate>() else {
            skipped += day.len();
            tracing::warn!(date = %date_str, "날짜 형식 오류, 건너뜀");
            continue;
        };

        for (symbol, rate) in day {
            let row = CurrencyCode::new(symbol).and_then(|symbol| {
                RateRow::new(
                    rate_date,
                    config.base_currency.clone(),
                    symbol,
                    *rate,
                    config.provider_tag.as_str(),
                )
            });

            match row {
                Ok(row) => rows.push(row),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(date = %date_str, symbol = %symbol, error = %e, "잘못된 환율, 건너뜀");
                }
            }
        }
    }

    skipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxrate_data::SymbolMode;

    fn config() -> PipelineConfig {
        PipelineConfig {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            symbols: SymbolMode::parse("EUR").unwrap(),
            table: "exchange_rates".into(),
            batch_days: 365,
            upsert_batch_size: 1000,
            dry_run: true,
            base_currency: CurrencyCode::new("USD").unwrap(),
            provider_tag: "exchangerate.host".into(),
        }
    }

    #[test]
    fn test_flatten_orders_by_date_and_skips_invalid() {
        let mut quotes = NormalizedQuotes::new();
        quotes.insert("2024-01-02", "EUR", 0.92);
        quotes.insert("2024-01-01", "EUR", 0.91);
        quotes.insert("2024-01-01", "GBP", -1.0);
        quotes.insert("2024-01-01", "CAD", f64::NAN);
        quotes.ensure_day("2024-01-03");

        let mut rows = Vec::new();
        let skipped = flatten_quotes(&quotes, &config(), &mut rows);

        assert_eq!(skipped, 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rate_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(rows[1].rate_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert!(rows.iter().all(|r| r.base_currency.as_str() == "USD"));
        assert!(rows.iter().all(|r| r.provider == "exchangerate.host"));
    }

    #[test]
    fn test_flatten_skips_non_currency_symbols() {
        let mut quotes = NormalizedQuotes::new();
        quotes.insert("2024-01-01", "EU1", 0.9);
        quotes.insert("2024-01-01", "EUR", 0.9);

        let mut rows = Vec::new();
        assert_eq!(flatten_quotes(&quotes, &config(), &mut rows), 1);
        assert_eq!(rows.len(), 1);
    }
}
