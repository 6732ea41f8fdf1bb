//! exchangerate.host API 클라이언트.
//!
//! # 엔드포인트
//!
//! - `GET /list` - 지원 통화 목록 (요청 1회 소모)
//! - `GET /timeframe` - 기간별 일간 환율 (요청당 최대 365일)
//!
//! 무료 플랜은 기준 통화가 USD로 고정이며 월 요청 수 제한이 있습니다.
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use fxrate_data::provider::{ExchangeRateHostClient, ProviderSettings};
//!
//! let client = ExchangeRateHostClient::new(access_key, ProviderSettings::default())?;
//! let catalog = client.list_currencies().await?;
//! ```

use super::{CatalogResponse, QuoteSource, TimeframeRequest, TimeframeResponse};
use crate::error::ProviderError;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// 제공자 연결 설정.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// API 기본 URL
    pub base_url: String,
    /// `/timeframe` 요청 타임아웃
    pub request_timeout: Duration,
    /// `/list` 요청 타임아웃
    pub catalog_timeout: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.exchangerate.host".to_string(),
            request_timeout: Duration::from_secs(60),
            catalog_timeout: Duration::from_secs(30),
        }
    }
}

/// exchangerate.host 클라이언트.
#[derive(Clone)]
pub struct ExchangeRateHostClient {
    client: reqwest::Client,
    access_key: SecretString,
    settings: ProviderSettings,
}

impl ExchangeRateHostClient {
    pub fn new(access_key: SecretString, settings: ProviderSettings) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fxrate-collector/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Network(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            access_key,
            settings,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), endpoint)
    }

    /// GET 요청 1회 실행 후 JSON 본문 반환.
    ///
    /// 본문이 `success: false`여도 그대로 반환합니다.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<T, ProviderError> {
        let url = self.url(endpoint);
        tracing::debug!(url = %url, params = ?params, "exchangerate.host 요청");

        let response = self
            .client
            .get(&url)
            .query(&[("access_key", self.access_key.expose_secret())])
            .query(params)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl QuoteSource for ExchangeRateHostClient {
    fn name(&self) -> &str {
        "exchangerate.host"
    }

    async fn list_currencies(&self) -> Result<CatalogResponse, ProviderError> {
        self.get_json("list", &[], self.settings.catalog_timeout)
            .await
    }

    async fn timeframe(
        &self,
        request: &TimeframeRequest,
    ) -> Result<TimeframeResponse, ProviderError> {
        let start_date = request.start.to_string();
        let end_date = request.end.to_string();

        let mut params = vec![
            ("start_date", start_date.as_str()),
            ("end_date", end_date.as_str()),
        ];
        if let Some(currencies) = request.currencies.as_deref() {
            params.push(("currencies", currencies));
        }
        if let Some(source) = request.source.as_deref() {
            params.push(("source", source));
        }

        self.get_json("timeframe", &params, self.settings.request_timeout)
            .await
    }
}
