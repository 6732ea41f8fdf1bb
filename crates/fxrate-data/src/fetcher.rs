//! 재시도를 포함한 기간 조회.
//!
//! # 재시도 상태 전이
//!
//! ```text
//! attempt 0 ──[일시 오류]──> sleep 2s ──> attempt 1 ──[일시 오류]──> sleep 4s ──> attempt 2
//!     │                                       │                                   │
//!  [성공] ──> 정규화 결과 반환             [성공]                      [일시 오류] ──> Exhausted
//! ```
//!
//! 일시 오류: 네트워크 오류, 2xx가 아닌 HTTP 상태, `success: false` 응답,
//! 본문 파싱 실패. 응답 구조 오류(`quotes`/`rates` 없음)는 즉시 실패합니다.

use crate::error::ProviderError;
use crate::provider::{normalize_quotes, QuoteSource, TimeframeRequest};
use async_trait::async_trait;
use fxrate_core::{Chunk, CurrencyCode, NormalizedQuotes, SymbolSet};
use std::sync::Arc;
use std::time::Duration;

/// 백오프 대기.
///
/// 테스트에서 실제 대기 없이 대기 시간을 기록할 수 있도록 주입합니다.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// tokio 타이머 기반 대기.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// 고정 횟수 재시도 정책.
///
/// `n`번째 시도(0부터) 전 대기 시간은 `n == 0`이면 0, 아니면 `unit * 2^n`.
/// 기본값(3회, 1초)은 0s → 2s → 4s 입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// 최소 1회는 시도합니다.
    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_unit,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// `attempt`번째 시도 전에 기다릴 시간.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        self.backoff_unit
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// 청크 단위 환율 조회기.
pub struct RateFetcher {
    source: Arc<dyn QuoteSource>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    base: CurrencyCode,
}

impl RateFetcher {
    /// 기본 정책(3회, 0s/2s/4s)과 tokio 타이머로 생성합니다.
    pub fn new(source: Arc<dyn QuoteSource>, base: CurrencyCode) -> Self {
        Self {
            source,
            sleeper: Arc::new(TokioSleeper),
            policy: RetryPolicy::default(),
            base,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    /// 청크 기간의 환율을 조회해 정규화합니다.
    ///
    /// `symbols`가 `None`이면 제공자 기본 통화 전체를 조회합니다.
    /// 재시도를 모두 소진하면 마지막 오류를 담은 `Exhausted`를 반환합니다.
    pub async fn fetch(
        &self,
        chunk: &Chunk,
        symbols: Option<&SymbolSet>,
    ) -> Result<NormalizedQuotes, ProviderError> {
        let request = TimeframeRequest::new(chunk, symbols, &self.base);
        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..self.policy.max_attempts {
            let delay = self.policy.delay_before(attempt);
            if !delay.is_zero() {
                tracing::debug!(
                    chunk = %chunk,
                    attempt = attempt + 1,
                    delay_secs = delay.as_secs_f64(),
                    "재시도 전 대기"
                );
                self.sleeper.sleep(delay).await;
            }

            match self.attempt(&request).await {
                Ok(quotes) => return Ok(quotes),
                Err(e) if e.is_retryable() => {
                    tracing::warn!(
                        provider = self.source.name(),
                        chunk = %chunk,
                        attempt = attempt + 1,
                        max_attempts = self.policy.max_attempts,
                        error = %e,
                        "기간 조회 실패, 재시도 예정"
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        let last_error =
            last_error.unwrap_or_else(|| ProviderError::Rejected("no attempt was made".into()));
        tracing::error!(
            provider = self.source.name(),
            chunk = %chunk,
            attempts = self.policy.max_attempts,
            error = %last_error,
            "기간 조회 최종 실패"
        );
        Err(ProviderError::Exhausted {
            endpoint: "timeframe",
            attempts: self.policy.max_attempts,
            last_error: Box::new(last_error),
        })
    }

    /// 요청 1회: 호출 → 성공 여부 확인 → 정규화.
    async fn attempt(&self, request: &TimeframeRequest) -> Result<NormalizedQuotes, ProviderError> {
        let response = self.source.timeframe(request).await?;

        if !response.success {
            return Err(ProviderError::Rejected(response.error_detail()));
        }

        let days = response.days().ok_or_else(|| {
            ProviderError::UnexpectedShape("neither 'quotes' nor 'rates' present".into())
        })?;

        normalize_quotes(days, &self.base)
    }
}

// =============================================================================
// 테스트
// =============================================================================
