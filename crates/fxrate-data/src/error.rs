//! 제공자/저장소 오류 타입.

use thiserror::Error;

/// 환율 제공자 관련 오류.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 네트워크/전송 오류
    #[error("Network error: {0}")]
    Network(String),

    /// 2xx가 아닌 HTTP 응답
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// `success: false` 응답 (요청 한도 초과 등)
    #[error("Provider rejected request: {0}")]
    Rejected(String),

    /// 응답 본문 파싱 실패
    #[error("Parse error: {0}")]
    Parse(String),

    /// 예상하지 못한 응답 구조
    #[error("Unexpected payload shape: {0}")]
    UnexpectedShape(String),

    /// 재시도 소진
    #[error("{endpoint} failed after {attempts} attempts: {last_error}")]
    Exhausted {
        endpoint: &'static str,
        attempts: u32,
        last_error: Box<ProviderError>,
    },
}

impl ProviderError {
    /// 재시도 가능한 일시적 오류인지 확인.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Network(_)
                | ProviderError::HttpStatus { .. }
                | ProviderError::Rejected(_)
                | ProviderError::Parse(_)
        )
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}

/// 저장소 관련 오류.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 저장소가 배치를 거부함
    #[error("Store rejected batch ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// 연결 오류
    #[error("Store connection error: {0}")]
    Connection(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    Query(String),

    /// 테이블 이름이 식별자 형식이 아님
    #[error("Invalid table name: '{0}'")]
    InvalidTable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                StoreError::Connection(err.to_string())
            }
            sqlx::Error::Database(db_err) => StoreError::Query(db_err.message().to_string()),
            _ => StoreError::Query(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Connection(err.to_string())
    }
}
