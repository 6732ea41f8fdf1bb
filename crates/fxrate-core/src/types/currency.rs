//! 통화 코드 및 심볼 집합 정의.
//!
//! - `CurrencyCode` - 대문자 3자리 ISO 통화 코드 (예: USD, EUR)
//! - `SymbolSet` - 조회/저장 대상 통화 코드 집합 (기준 통화 항상 포함)

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// 대문자 3자리 통화 코드.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// 통화 코드를 검증하고 대문자로 정규화합니다.
    ///
    /// 앞뒤 공백은 무시하며, 영문자 3자리가 아니면 에러를 반환합니다.
    pub fn new(code: impl AsRef<str>) -> Result<Self> {
        let trimmed = code.as_ref().trim();
        if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(CoreError::InvalidCurrencyCode(code.as_ref().to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 조회 대상 통화 코드 집합.
///
/// 중복이 없고 순서는 의미가 없으며(내부적으로 정렬 유지),
/// 생성 시점부터 기준 통화를 항상 포함합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSet {
    base: CurrencyCode,
    codes: BTreeSet<CurrencyCode>,
}

impl SymbolSet {
    /// 주어진 코드들과 기준 통화로 집합을 생성합니다.
    pub fn with_base(codes: impl IntoIterator<Item = CurrencyCode>, base: CurrencyCode) -> Self {
        let mut codes: BTreeSet<CurrencyCode> = codes.into_iter().collect();
        codes.insert(base.clone());
        Self { base, codes }
    }

    /// 쉼표로 구분된 코드 목록을 파싱합니다 (대소문자 무시, 빈 항목 무시).
    ///
    /// # 예제
    ///
    /// ```
    /// use fxrate_core::{CurrencyCode, SymbolSet};
    ///
    /// let base = CurrencyCode::new("USD").unwrap();
    /// let set = SymbolSet::parse_list("cad, eur", base).unwrap();
    /// assert_eq!(set.to_query_param(), "CAD,EUR,USD");
    /// ```
    pub fn parse_list(list: &str, base: CurrencyCode) -> Result<Self> {
        let codes = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(CurrencyCode::new)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::with_base(codes, base))
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.codes.contains(code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// 기준 통화가 항상 포함되므로 실제로는 비어 있지 않습니다.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// 정렬된 순서로 코드를 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.codes.iter()
    }

    /// 요청 파라미터 형식 (`CAD,EUR,USD`).
    pub fn to_query_param(&self) -> String {
        self.codes
            .iter()
            .map(CurrencyCode::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

// =============================================================================
// 테스트
// =============================================================================
