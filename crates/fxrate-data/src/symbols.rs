//! 조회 대상 통화 결정.
//!
//! - `ALL`: 제공자 통화 목록 전체 (`/list` 1회 호출, 재시도 없음)
//! - `CAD,EUR,...`: 사용자 지정 목록 + 기준 통화

use crate::error::ProviderError;
use crate::provider::QuoteSource;
use fxrate_core::{CoreError, CurrencyCode, SymbolSet};
use std::sync::Arc;

/// 통화 선택 방식.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolMode {
    /// 제공자 지원 통화 전체
    All,
    /// 사용자 지정 목록 (중복 제거, 대문자)
    Explicit(Vec<CurrencyCode>),
}

impl SymbolMode {
    /// 설정 문자열 파싱 (`"ALL"`은 대소문자 무시).
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("all") {
            return Ok(SymbolMode::All);
        }

        let mut codes: Vec<CurrencyCode> = Vec::new();
        for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let code = CurrencyCode::new(item)?;
            if !codes.contains(&code) {
                codes.push(code);
            }
        }
        Ok(SymbolMode::Explicit(codes))
    }
}

impl std::str::FromStr for SymbolMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// 통화 집합 결정기.
pub struct SymbolResolver {
    source: Arc<dyn QuoteSource>,
    base: CurrencyCode,
}

impl SymbolResolver {
    pub fn new(source: Arc<dyn QuoteSource>, base: CurrencyCode) -> Self {
        Self { source, base }
    }

    /// 조회 대상 통화 집합을 결정합니다. 결과는 항상 기준 통화를 포함합니다.
    pub async fn resolve(&self, mode: &SymbolMode) -> Result<SymbolSet, ProviderError> {
        match mode {
            SymbolMode::Explicit(codes) => {
                let set = SymbolSet::with_base(codes.iter().cloned(), self.base.clone());
                tracing::info!(count = set.len(), symbols = %set.to_query_param(), "지정 통화 사용");
                Ok(set)
            }
            SymbolMode::All => self.fetch_catalog().await,
        }
    }

    /// 제공자 통화 목록 조회 (1회, 실패 시 즉시 오류).
    async fn fetch_catalog(&self) -> Result<SymbolSet, ProviderError> {
        let catalog = self.source.list_currencies().await?;

        if !catalog.success {
            let detail = catalog.error.unwrap_or_default().describe();
            return Err(ProviderError::Rejected(format!("/list failed: {}", detail)));
        }

        let mut codes = Vec::with_capacity(catalog.currencies.len());
        for key in catalog.currencies.keys() {
            match CurrencyCode::new(key) {
                Ok(code) => codes.push(code),
                Err(_) => {
                    tracing::warn!(provider = self.source.name(), code = %key, "잘못된 통화 코드 무시");
                }
            }
        }

        if codes.is_empty() {
            return Err(ProviderError::UnexpectedShape(
                "/list returned no currencies".into(),
            ));
        }

        let set = SymbolSet::with_base(codes, self.base.clone());
        tracing::info!(
            provider = self.source.name(),
            count = set.len(),
            "지원 통화 목록 조회 완료"
        );
        Ok(set)
    }
}

// =============================================================================
// 테스트
// =============================================================================
