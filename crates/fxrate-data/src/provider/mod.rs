//! 환율 제공자 경계.
//!
//! `QuoteSource`는 제공자 호출 한 번을 추상화합니다. 재시도와 응답
//! 해석(`success: false`, 키 형태 정규화)은 호출하는 쪽(`RateFetcher`,
//! `SymbolResolver`)이 담당합니다.

pub mod exchangerate_host;
pub mod normalize;

pub use exchangerate_host::{ExchangeRateHostClient, ProviderSettings};
pub use normalize::{normalize_quotes, QuoteKey};

use crate::error::ProviderError;
use async_trait::async_trait;
use chrono::NaiveDate;
use fxrate_core::{Chunk, CurrencyCode, SymbolSet};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// 제공자 기본 기준 통화 (무료 플랜은 USD 고정).
pub const PROVIDER_DEFAULT_BASE: &str = "USD";

/// 요청당 최대 조회 일수.
pub const MAX_TIMEFRAME_SPAN_DAYS: u32 = 365;

/// 기간 조회 요청.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeframeRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// 제한할 통화 목록 (`None`이면 제공자 기본 전체)
    pub currencies: Option<String>,
    /// 기준 통화 (`None`이면 제공자 기본값)
    pub source: Option<String>,
}

impl TimeframeRequest {
    pub fn new(chunk: &Chunk, symbols: Option<&SymbolSet>, base: &CurrencyCode) -> Self {
        Self {
            start: chunk.start,
            end: chunk.end,
            currencies: symbols.map(SymbolSet::to_query_param),
            source: (base.as_str() != PROVIDER_DEFAULT_BASE).then(|| base.to_string()),
        }
    }
}

/// 제공자 에러 본문 (`{"error": {"code": 104, "info": "..."}}`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
}

impl ApiErrorBody {
    /// 로그/에러 메시지용 설명.
    pub fn describe(&self) -> String {
        match (&self.info, &self.kind, self.code) {
            (Some(info), _, _) => info.clone(),
            (None, Some(kind), _) => kind.clone(),
            (None, None, Some(code)) => format!("error code {}", code),
            (None, None, None) => "unknown provider error".to_string(),
        }
    }
}

/// 통화 목록 응답.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub currencies: BTreeMap<String, Value>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

/// 기간 조회 응답.
///
/// 제공자 변형에 따라 날짜별 시세가 `quotes`(`USDEUR` 키) 또는
/// `rates`(`EUR` 키)에 담깁니다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeframeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub quotes: Option<Map<String, Value>>,
    #[serde(default)]
    pub rates: Option<Map<String, Value>>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

impl TimeframeResponse {
    /// 날짜별 시세 맵 (`quotes` 우선, 없으면 `rates`).
    pub fn days(&self) -> Option<&Map<String, Value>> {
        self.quotes.as_ref().or(self.rates.as_ref())
    }

    pub fn error_detail(&self) -> String {
        self.error.clone().unwrap_or_default().describe()
    }
}

/// 환율 제공자 호출.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// 제공자 이름 (로그용)
    fn name(&self) -> &str;

    /// 지원 통화 전체 목록 조회.
    async fn list_currencies(&self) -> Result<CatalogResponse, ProviderError>;

    /// 기간 조회 1회.
    async fn timeframe(&self, request: &TimeframeRequest)
        -> Result<TimeframeResponse, ProviderError>;
}
