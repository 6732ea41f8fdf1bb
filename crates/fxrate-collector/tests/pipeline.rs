//! 백필 파이프라인 시나리오 테스트 (stub 제공자 / 기록용 저장소).

use async_trait::async_trait;
use chrono::NaiveDate;
use fxrate_collector::{run_backfill, CollectorError, PipelineConfig, RatePipeline};
use fxrate_core::{CurrencyCode, RateRow};
use fxrate_data::provider::{CatalogResponse, QuoteSource, TimeframeRequest, TimeframeResponse};
use fxrate_data::{
    ProviderError, RateFetcher, RateStore, Sleeper, StoreError, SymbolMode, SymbolResolver,
};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// Stubs
// =============================================================================

/// 요청 기간의 모든 날짜에 대해 `USDEUR` 시세를 돌려주는 제공자.
///
/// `failures`에 담긴 오류는 앞에서부터 한 번씩 먼저 반환됩니다.
/// `fail_from`이 지정되면 해당 시작일 이후 청크는 `quotes` 없는 응답을 받습니다.
#[derive(Default)]
struct StubSource {
    requests: Mutex<Vec<TimeframeRequest>>,
    catalog_calls: Mutex<usize>,
    failures: Mutex<VecDeque<ProviderError>>,
    fail_from: Option<NaiveDate>,
}

impl StubSource {
    fn requests(&self) -> Vec<TimeframeRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn catalog_calls(&self) -> usize {
        *self.catalog_calls.lock().unwrap()
    }
}

#[async_trait]
impl QuoteSource for StubSource {
    fn name(&self) -> &str {
        "stub"
    }

    async fn list_currencies(&self) -> Result<CatalogResponse, ProviderError> {
        *self.catalog_calls.lock().unwrap() += 1;
        Ok(serde_json::from_value(json!({
            "success": true,
            "currencies": {"EUR": "Euro", "GBP": "British Pound", "USD": "US Dollar"}
        }))?)
    }

    async fn timeframe(
        &self,
        request: &TimeframeRequest,
    ) -> Result<TimeframeResponse, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        if self.fail_from.is_some_and(|d| request.start >= d) {
            return Ok(serde_json::from_value(json!({"success": true}))?);
        }

        let mut quotes = Map::new();
        let mut day = request.start;
        while day <= request.end {
            quotes.insert(
                day.format("%Y-%m-%d").to_string(),
                json!({"USDEUR": 0.91, "timestamp": 1704067199}),
            );
            day = day.succ_opt().unwrap();
        }
        Ok(serde_json::from_value(
            json!({"success": true, "quotes": Value::Object(quotes)}),
        )?)
    }
}

/// 배치를 기록하는 저장소. `fail_on`번째 호출(1부터)에서 거부합니다.
#[derive(Default)]
struct RecordingStore {
    batches: Mutex<Vec<Vec<RateRow>>>,
    calls: Mutex<usize>,
    fail_on: Option<usize>,
}

impl RecordingStore {
    fn batches(&self) -> Vec<Vec<RateRow>> {
        self.batches.lock().unwrap().clone()
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl RateStore for RecordingStore {
    async fn upsert_rates(&self, _table: &str, rows: &[RateRow]) -> Result<usize, StoreError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        if self.fail_on == Some(call) {
            return Err(StoreError::Rejected {
                status: 500,
                body: "batch rejected".into(),
            });
        }
        self.batches.lock().unwrap().push(rows.to_vec());
        Ok(rows.len())
    }
}

#[derive(Default)]
struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn usd() -> CurrencyCode {
    CurrencyCode::new("USD").unwrap()
}

fn config(dry_run: bool, upsert_batch_size: usize) -> PipelineConfig {
    PipelineConfig {
        start: date(2024, 1, 1),
        end: date(2024, 1, 3),
        symbols: SymbolMode::parse("EUR").unwrap(),
        table: "exchange_rates".into(),
        batch_days: 365,
        upsert_batch_size,
        dry_run,
        base_currency: usd(),
        provider_tag: "exchangerate.host".into(),
    }
}

fn pipeline(source: &Arc<StubSource>, store: Option<&Arc<RecordingStore>>) -> RatePipeline {
    let store = store.map(|s| s.clone() as Arc<dyn RateStore>);
    RatePipeline::from_source(source.clone(), usd(), store)
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_dry_run_prepares_rows_without_writing() {
    let source = Arc::new(StubSource::default());
    let store = Arc::new(RecordingStore::default());

    let summary = pipeline(&source, Some(&store))
        .run(&config(true, 1000))
        .await
        .unwrap();

    assert_eq!(summary.rows_prepared, 3);
    assert_eq!(summary.rows_written, 0);
    assert!(summary.dry_run);
    assert_eq!(summary.chunks, 1);
    assert_eq!(store.calls(), 0);

    let requests = source.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].currencies.as_deref(), Some("EUR,USD"));
    assert_eq!(requests[0].source, None);
}

#[tokio::test]
async fn test_dry_run_needs_no_store() {
    let source = Arc::new(StubSource::default());

    let summary = pipeline(&source, None)
        .run(&config(true, 1000))
        .await
        .unwrap();

    assert_eq!(summary.rows_prepared, 3);
}

#[tokio::test]
async fn test_write_upserts_in_fixed_size_batches() {
    let source = Arc::new(StubSource::default());
    let store = Arc::new(RecordingStore::default());

    let summary = pipeline(&source, Some(&store))
        .run(&config(false, 2))
        .await
        .unwrap();

    assert_eq!(summary.rows_prepared, 3);
    assert_eq!(summary.rows_written, 3);
    assert_eq!(summary.batches, 2);

    let batches = store.batches();
    let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 1]);

    let keys: Vec<_> = batches
        .iter()
        .flatten()
        .map(|r| {
            let (d, base, symbol) = r.natural_key();
            (d, base.to_string(), symbol.to_string())
        })
        .collect();
    assert_eq!(
        keys,
        vec![
            (date(2024, 1, 1), "USD".to_string(), "EUR".to_string()),
            (date(2024, 1, 2), "USD".to_string(), "EUR".to_string()),
            (date(2024, 1, 3), "USD".to_string(), "EUR".to_string()),
        ]
    );
    assert!(batches
        .iter()
        .flatten()
        .all(|r| r.provider == "exchangerate.host"));
}

#[tokio::test]
async fn test_reversed_range_rejected_before_network() {
    let source = Arc::new(StubSource::default());
    let store = Arc::new(RecordingStore::default());
    let mut cfg = config(false, 1000);
    cfg.start = date(2024, 1, 3);
    cfg.end = date(2024, 1, 1);
    cfg.symbols = SymbolMode::All;

    let err = pipeline(&source, Some(&store)).run(&cfg).await.unwrap_err();

    assert!(matches!(err, CollectorError::Configuration(_)));
    assert!(source.requests().is_empty());
    assert_eq!(source.catalog_calls(), 0);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_invalid_settings_rejected_before_network() {
    let source = Arc::new(StubSource::default());

    for mutate in [
        (|c: &mut PipelineConfig| c.batch_days = 0) as fn(&mut PipelineConfig),
        |c| c.batch_days = 366,
        |c| c.upsert_batch_size = 0,
        |c| c.table = "rates; drop table x".into(),
    ] {
        let mut cfg = config(true, 1000);
        mutate(&mut cfg);
        let err = pipeline(&source, None).run(&cfg).await.unwrap_err();
        assert!(matches!(err, CollectorError::Configuration(_)));
    }

    assert!(source.requests().is_empty());
}

#[tokio::test]
async fn test_write_without_store_is_configuration_error() {
    let source = Arc::new(StubSource::default());

    let err = pipeline(&source, None)
        .run(&config(false, 1000))
        .await
        .unwrap_err();

    assert!(matches!(err, CollectorError::Configuration(_)));
}

#[tokio::test]
async fn test_later_chunk_failure_writes_nothing() {
    let source = Arc::new(StubSource {
        fail_from: Some(date(2024, 1, 3)),
        ..Default::default()
    });
    let store = Arc::new(RecordingStore::default());
    let mut cfg = config(false, 1000);
    cfg.batch_days = 1;

    let err = pipeline(&source, Some(&store)).run(&cfg).await.unwrap_err();

    assert!(matches!(
        err,
        CollectorError::Provider(ProviderError::UnexpectedShape(_))
    ));
    assert_eq!(source.requests().len(), 3);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_store_failure_keeps_prior_batches() {
    let source = Arc::new(StubSource::default());
    let store = Arc::new(RecordingStore {
        fail_on: Some(2),
        ..Default::default()
    });

    let err = pipeline(&source, Some(&store))
        .run(&config(false, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, CollectorError::Store(StoreError::Rejected { .. })));
    assert_eq!(store.calls(), 2);
    assert_eq!(store.batches().len(), 1);
}

#[tokio::test]
async fn test_chunks_are_fetched_in_ascending_order() {
    let source = Arc::new(StubSource::default());
    let mut cfg = config(true, 1000);
    cfg.end = date(2024, 1, 5);
    cfg.batch_days = 2;

    let summary = pipeline(&source, None).run(&cfg).await.unwrap();

    let spans: Vec<_> = source
        .requests()
        .iter()
        .map(|r| (r.start, r.end))
        .collect();
    assert_eq!(
        spans,
        vec![
            (date(2024, 1, 1), date(2024, 1, 2)),
            (date(2024, 1, 3), date(2024, 1, 4)),
            (date(2024, 1, 5), date(2024, 1, 5)),
        ]
    );
    assert_eq!(summary.chunks, 3);
    assert_eq!(summary.rows_prepared, 5);
}

#[tokio::test]
async fn test_all_symbols_uses_catalog_once() {
    let source = Arc::new(StubSource::default());
    let mut cfg = config(true, 1000);
    cfg.symbols = SymbolMode::All;
    cfg.batch_days = 1;

    let summary = pipeline(&source, None).run(&cfg).await.unwrap();

    assert_eq!(source.catalog_calls(), 1);
    assert_eq!(summary.symbols, 3);
    assert!(source
        .requests()
        .iter()
        .all(|r| r.currencies.as_deref() == Some("EUR,GBP,USD")));
}

#[tokio::test]
async fn test_transient_failure_is_retried_within_run() {
    let source = Arc::new(StubSource {
        failures: Mutex::new(VecDeque::from([ProviderError::Rejected(
            "rate limit reached".into(),
        )])),
        ..Default::default()
    });
    let sleeper = Arc::new(RecordingSleeper::default());
    let fetcher = RateFetcher::new(source.clone(), usd()).with_sleeper(sleeper.clone());
    let resolver = SymbolResolver::new(source.clone(), usd());

    let summary = RatePipeline::new(fetcher, resolver, None)
        .run(&config(true, 1000))
        .await
        .unwrap();

    assert_eq!(summary.rows_prepared, 3);
    assert_eq!(source.requests().len(), 2);
    assert_eq!(
        *sleeper.sleeps.lock().unwrap(),
        vec![Duration::from_secs(2)]
    );
}

// =============================================================================
// Store connection ordering
// =============================================================================

/// 호출 횟수를 세는 저장소 연결 함수.
fn counting_connect(
    store: &Arc<RecordingStore>,
    connects: &Arc<AtomicUsize>,
) -> impl FnOnce() -> std::future::Ready<Result<Arc<dyn RateStore>, StoreError>> {
    let store = store.clone();
    let connects = connects.clone();
    move || {
        connects.fetch_add(1, Ordering::SeqCst);
        std::future::ready(Ok(store as Arc<dyn RateStore>))
    }
}

#[tokio::test]
async fn test_reversed_range_rejected_before_store_connect() {
    let source = Arc::new(StubSource::default());
    let store = Arc::new(RecordingStore::default());
    let connects = Arc::new(AtomicUsize::new(0));
    let mut cfg = config(false, 1000);
    cfg.start = date(2024, 1, 3);
    cfg.end = date(2024, 1, 1);

    let err = run_backfill(&cfg, source.clone(), counting_connect(&store, &connects))
        .await
        .unwrap_err();

    assert!(matches!(err, CollectorError::Configuration(_)));
    assert_eq!(connects.load(Ordering::SeqCst), 0);
    assert!(source.requests().is_empty());
}

#[tokio::test]
async fn test_invalid_batching_rejected_before_store_connect() {
    let source = Arc::new(StubSource::default());
    let store = Arc::new(RecordingStore::default());
    let connects = Arc::new(AtomicUsize::new(0));
    let mut cfg = config(false, 0);
    cfg.batch_days = 400;

    let err = run_backfill(&cfg, source.clone(), counting_connect(&store, &connects))
        .await
        .unwrap_err();

    assert!(matches!(err, CollectorError::Configuration(_)));
    assert_eq!(connects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unreachable_store_fails_only_after_validation() {
    let source = Arc::new(StubSource::default());
    let mut cfg = config(false, 1000);
    cfg.start = date(2024, 1, 3);
    cfg.end = date(2024, 1, 1);

    let unreachable = || async {
        Err::<Arc<dyn RateStore>, _>(StoreError::Connection("connection refused".into()))
    };
    let err = run_backfill(&cfg, source.clone(), unreachable)
        .await
        .unwrap_err();
    assert!(matches!(err, CollectorError::Configuration(_)));

    cfg.start = date(2024, 1, 1);
    cfg.end = date(2024, 1, 3);
    let err = run_backfill(&cfg, source.clone(), unreachable)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CollectorError::Store(StoreError::Connection(_))
    ));
    assert!(source.requests().is_empty());
}

#[tokio::test]
async fn test_dry_run_never_connects_store() {
    let source = Arc::new(StubSource::default());
    let store = Arc::new(RecordingStore::default());
    let connects = Arc::new(AtomicUsize::new(0));

    let summary = run_backfill(
        &config(true, 1000),
        source.clone(),
        counting_connect(&store, &connects),
    )
    .await
    .unwrap();

    assert_eq!(summary.rows_prepared, 3);
    assert_eq!(connects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_write_connects_store_once() {
    let source = Arc::new(StubSource::default());
    let store = Arc::new(RecordingStore::default());
    let connects = Arc::new(AtomicUsize::new(0));

    let summary = run_backfill(
        &config(false, 2),
        source.clone(),
        counting_connect(&store, &connects),
    )
    .await
    .unwrap();

    assert_eq!(connects.load(Ordering::SeqCst), 1);
    assert_eq!(summary.rows_written, 3);
    assert_eq!(store.calls(), 2);
}
