//! 환율 저장소.
//!
//! 자연 키 `(rate_date, base_currency, symbol)`로 충돌을 해소하는 upsert만
//! 제공합니다. 기록 시각(`fetched_at` 등)은 저장소가 부여합니다.
//!
//! | URL 스킴 | 구현 |
//! |---|---|
//! | `http`, `https` | `PostgrestStore` (Supabase REST) |
//! | `postgres`, `postgresql` | `PgRateStore` (sqlx) |

pub mod postgres;
pub mod postgrest;

pub use postgres::PgRateStore;
pub use postgrest::PostgrestStore;

use crate::error::StoreError;
use async_trait::async_trait;
use fxrate_core::RateRow;
use secrecy::SecretString;
use std::sync::Arc;

/// 충돌 해소에 사용하는 자연 키 컬럼.
pub const NATURAL_KEY_COLUMNS: [&str; 3] = ["rate_date", "base_currency", "symbol"];

/// upsert 가능한 환율 저장소.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// 배치 1개를 upsert하고 반영된 행 수를 반환합니다.
    ///
    /// 배치는 원자적으로 처리되며 배치 간 트랜잭션은 없습니다.
    async fn upsert_rates(&self, table: &str, rows: &[RateRow]) -> Result<usize, StoreError>;
}

/// 저장소 URL 스킴에 맞는 구현을 생성합니다.
pub async fn connect(url: &str, credential: &SecretString) -> Result<Arc<dyn RateStore>, StoreError> {
    let scheme = url
        .split_once("://")
        .map(|(scheme, _)| scheme.to_ascii_lowercase())
        .ok_or_else(|| StoreError::Connection(format!("저장소 URL 형식 오류: {}", url)))?;

    match scheme.as_str() {
        "http" | "https" => Ok(Arc::new(PostgrestStore::new(url, credential.clone())?)),
        "postgres" | "postgresql" => Ok(Arc::new(PgRateStore::connect(url, credential).await?)),
        other => Err(StoreError::Connection(format!(
            "지원하지 않는 저장소 스킴: {}",
            other
        ))),
    }
}

/// 테이블 이름 검증 (`table` 또는 `schema.table`, SQL 식별자 문자만).
pub fn validate_table_name(table: &str) -> Result<(), StoreError> {
    let valid_ident = |ident: &str| {
        let mut chars = ident.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    let parts: Vec<&str> = table.split('.').collect();
    if parts.len() <= 2 && parts.iter().all(|p| valid_ident(p)) {
        Ok(())
    } else {
        Err(StoreError::InvalidTable(table.to_string()))
    }
}
