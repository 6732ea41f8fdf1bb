//! 환율 데이터 수집 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - exchangerate.host 클라이언트 (`QuoteSource` 구현)
//! - 응답 형태 정규화 (`SYMBOL` / `BASESYMBOL` 키)
//! - 재시도/백오프를 포함한 기간 조회 (`RateFetcher`)
//! - 조회 대상 통화 결정 (`SymbolResolver`)
//! - 자연 키 기반 upsert 저장소 (PostgREST, PostgreSQL)

pub mod error;
pub mod fetcher;
pub mod provider;
pub mod storage;
pub mod symbols;

pub use error::{ProviderError, StoreError};
pub use fetcher::{RateFetcher, RetryPolicy, Sleeper, TokioSleeper};
pub use provider::{
    ExchangeRateHostClient, ProviderSettings, QuoteSource, TimeframeRequest, TimeframeResponse,
};
pub use storage::{PgRateStore, PostgrestStore, RateStore};
pub use symbols::{SymbolMode, SymbolResolver};
