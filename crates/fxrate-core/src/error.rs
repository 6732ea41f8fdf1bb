//! 도메인 검증 에러 타입.

use chrono::NaiveDate;
use thiserror::Error;

/// 핵심 도메인 에러.
///
/// 모두 입력 검증 실패이며 재시도 대상이 아닙니다.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// 3자리 영문 통화 코드가 아님
    #[error("Invalid currency code: '{0}'")]
    InvalidCurrencyCode(String),

    /// 종료일이 시작일보다 앞섬
    #[error("End date {end} must be on/after start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// 청크 최대 일수가 1 미만
    #[error("Chunk span must be at least 1 day (got {0})")]
    InvalidChunkSpan(u32),

    /// 저장할 수 없는 환율 값 (비유한 또는 0 이하)
    #[error("Invalid rate for {symbol} on {date}: {rate}")]
    InvalidRate {
        date: NaiveDate,
        symbol: String,
        rate: f64,
    },

    /// 날짜 문자열 파싱 실패
    #[error("Invalid date '{0}' (expected YYYY-MM-DD or 'today')")]
    InvalidDate(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
