//! PostgreSQL 직접 연결 저장소.
//!
//! UNNEST 패턴으로 배치당 한 번의 INSERT를 실행하고,
//! 자연 키 충돌 시 `rate`와 `provider`를 갱신합니다.

use super::{validate_table_name, RateStore};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::NaiveDate;
use fxrate_core::RateRow;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;

/// sqlx 기반 저장소.
#[derive(Clone)]
pub struct PgRateStore {
    pool: PgPool,
}

impl PgRateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 연결 풀을 생성합니다.
    ///
    /// URL에 비밀번호가 없으면 `credential`을 비밀번호로 사용합니다.
    pub async fn connect(url: &str, credential: &SecretString) -> Result<Self, StoreError> {
        let mut options =
            PgConnectOptions::from_str(url).map_err(|e| StoreError::Connection(e.to_string()))?;

        let has_password = reqwest::Url::parse(url)
            .map(|u| u.password().is_some())
            .unwrap_or(false);
        if !has_password {
            options = options.password(credential.expose_secret());
        }

        // 배치는 순차 실행되므로 연결 1개면 충분
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        tracing::info!("데이터베이스 연결 성공");
        Ok(Self { pool })
    }

    fn upsert_sql(table: &str) -> String {
        format!(
            r#"
            INSERT INTO {table} (rate_date, base_currency, symbol, rate, provider)
            SELECT * FROM UNNEST(
                $1::date[], $2::text[], $3::text[], $4::numeric[], $5::text[]
            )
            ON CONFLICT (rate_date, base_currency, symbol) DO UPDATE SET
                rate = EXCLUDED.rate,
                provider = EXCLUDED.provider
            "#
        )
    }
}

#[async_trait]
impl RateStore for PgRateStore {
    async fn upsert_rates(&self, table: &str, rows: &[RateRow]) -> Result<usize, StoreError> {
        validate_table_name(table)?;
        if rows.is_empty() {
            return Ok(0);
        }

        // 각 컬럼에 대한 배열 생성
        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.rate_date).collect();
        let bases: Vec<&str> = rows.iter().map(|r| r.base_currency.as_str()).collect();
        let symbols: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
        let rates: Vec<Decimal> = rows.iter().map(|r| r.rate).collect();
        let providers: Vec<&str> = rows.iter().map(|r| r.provider.as_str()).collect();

        let sql = Self::upsert_sql(table);
        let result = sqlx::query(&sql)
            .bind(&dates)
            .bind(&bases)
            .bind(&symbols)
            .bind(&rates)
            .bind(&providers)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            table = table,
            rows = rows.len(),
            affected = result.rows_affected(),
            "PostgreSQL upsert 완료"
        );
        Ok(rows.len())
    }
}
