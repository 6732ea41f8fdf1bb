//! 에러 타입 정의.

use fxrate_core::CoreError;
use fxrate_data::{ProviderError, StoreError};
use thiserror::Error;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정/입력 검증 에러 (날짜 범위, 누락된 비밀값 등)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 환율 제공자 에러 (재시도 소진 포함)
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// 저장소 에러
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<CoreError> for CollectorError {
    fn from(err: CoreError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<config::ConfigError> for CollectorError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
