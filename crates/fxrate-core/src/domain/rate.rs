//! 환율 레코드 및 정규화된 시세.
//!
//! - `NormalizedQuotes` - 제공자 응답을 `날짜 -> {심볼 -> 환율}`로 정규화한 결과
//! - `RateRow` - 저장소에 upsert되는 한 건의 관측값
//!
//! 자연 키 `(rate_date, base_currency, symbol)`의 유일성은 저장소가 보장합니다.

use crate::error::{CoreError, Result};
use crate::types::CurrencyCode;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// 날짜(ISO 문자열)별 심볼 환율 맵.
///
/// 한 번의 조회 결과로 생성되며, 반환 후에는 변경하지 않고
/// 곧바로 `RateRow`로 변환됩니다. 시세가 없는 심볼은 0으로 채우지 않고
/// 키 자체가 없습니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedQuotes {
    days: BTreeMap<String, BTreeMap<String, f64>>,
}

impl NormalizedQuotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// 시세가 없더라도 날짜 항목을 만듭니다.
    pub fn ensure_day(&mut self, date: impl Into<String>) -> &mut BTreeMap<String, f64> {
        self.days.entry(date.into()).or_default()
    }

    /// 시세를 추가합니다. 같은 날짜/심볼이 이미 있으면 덮어씁니다.
    pub fn insert(&mut self, date: impl Into<String>, symbol: impl Into<String>, rate: f64) {
        self.ensure_day(date).insert(symbol.into(), rate);
    }

    pub fn get(&self, date: &str, symbol: &str) -> Option<f64> {
        self.days.get(date).and_then(|day| day.get(symbol)).copied()
    }

    pub fn day(&self, date: &str) -> Option<&BTreeMap<String, f64>> {
        self.days.get(date)
    }

    /// 날짜 오름차순으로 순회합니다.
    pub fn days(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, f64>)> {
        self.days.iter()
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn quote_count(&self) -> usize {
        self.days.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// 저장 단위 환율 레코드.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateRow {
    pub rate_date: NaiveDate,
    pub base_currency: CurrencyCode,
    pub symbol: CurrencyCode,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    pub provider: String,
}

impl RateRow {
    /// 레코드를 생성합니다.
    ///
    /// 환율은 양의 유한값이어야 합니다.
    pub fn new(
        rate_date: NaiveDate,
        base_currency: CurrencyCode,
        symbol: CurrencyCode,
        rate: f64,
        provider: impl Into<String>,
    ) -> Result<Self> {
        let invalid = || CoreError::InvalidRate {
            date: rate_date,
            symbol: symbol.to_string(),
            rate,
        };

        if !rate.is_finite() || rate <= 0.0 {
            return Err(invalid());
        }
        let rate = Decimal::try_from(rate).map_err(|_| invalid())?;
        // 극소값은 Decimal 정밀도에서 0으로 떨어질 수 있음
        if rate.is_zero() {
            return Err(invalid());
        }

        Ok(Self {
            rate_date,
            base_currency,
            symbol,
            rate,
            provider: provider.into(),
        })
    }

    /// 자연 키 `(rate_date, base_currency, symbol)`.
    pub fn natural_key(&self) -> (NaiveDate, &str, &str) {
        (
            self.rate_date,
            self.base_currency.as_str(),
            self.symbol.as_str(),
        )
    }
}

// =============================================================================
// 테스트
// =============================================================================
