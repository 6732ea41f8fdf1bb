//! 제공자 응답 키 정규화.
//!
//! 제공자 변형에 따라 날짜별 시세 키가 `EUR`(심볼) 또는 `USDEUR`(기준+심볼)
//! 형태로 옵니다. 키 길이와 접두어로 형태를 판별해 심볼만 남깁니다.
//!
//! ```text
//! {"2024-01-01": {"USDEUR": 0.9, "EUR": 0.91, "note": "x"}}
//!   -> {"2024-01-01": {"EUR": 0.91}}
//! ```

use crate::error::ProviderError;
use chrono::NaiveDate;
use fxrate_core::{CurrencyCode, NormalizedQuotes};
use serde_json::{Map, Value};

/// 시세 키 형태.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteKey {
    /// `EUR`
    PlainSymbol(String),
    /// `USDEUR` (기준 통화 접두어)
    PrefixedPair(String),
    /// 통화 키가 아님 (`timestamp`, `EURGBP` 등)
    Unrecognized,
}

impl QuoteKey {
    pub fn classify(key: &str, base: &CurrencyCode) -> Self {
        let alphabetic = key.chars().all(|c| c.is_ascii_alphabetic());
        match key.len() {
            3 if alphabetic => QuoteKey::PlainSymbol(key.to_ascii_uppercase()),
            6 if alphabetic && key[..3].eq_ignore_ascii_case(base.as_str()) => {
                QuoteKey::PrefixedPair(key[3..].to_ascii_uppercase())
            }
            _ => QuoteKey::Unrecognized,
        }
    }

    /// 정규화된 심볼.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            QuoteKey::PlainSymbol(symbol) | QuoteKey::PrefixedPair(symbol) => Some(symbol),
            QuoteKey::Unrecognized => None,
        }
    }
}

/// 날짜별 시세 맵을 `NormalizedQuotes`로 변환합니다.
///
/// - 숫자가 아닌 값과 통화 키가 아닌 항목은 조용히 버립니다.
/// - 같은 날짜에 같은 심볼이 두 번 나오면 응답 순서상 마지막 값이 남습니다.
/// - 값이 객체가 아닌 날짜는 시세 없는 날짜로 남습니다.
/// - 날짜 키가 `YYYY-MM-DD`가 아니면 응답 구조 오류입니다.
pub fn normalize_quotes(
    days: &Map<String, Value>,
    base: &CurrencyCode,
) -> Result<NormalizedQuotes, ProviderError> {
    let mut normalized = NormalizedQuotes::new();

    for (date, entries) in days {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| ProviderError::UnexpectedShape(format!("invalid date key '{}'", date)))?;

        let day = normalized.ensure_day(date.as_str());
        let Some(entries) = entries.as_object() else {
            continue;
        };

        for (key, value) in entries {
            let Some(rate) = value.as_f64() else {
                continue;
            };
            let quote_key = QuoteKey::classify(key, base);
            match quote_key.symbol() {
                Some(symbol) => {
                    day.insert(symbol.to_string(), rate);
                }
                None => {
                    tracing::trace!(date = %date, key = %key, "통화 키가 아닌 항목 무시");
                }
            }
        }
    }

    Ok(normalized)
}

// =============================================================================
// 테스트
// =============================================================================
