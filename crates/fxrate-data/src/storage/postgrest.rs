//! Supabase(PostgREST) REST 저장소.
//!
//! `POST /rest/v1/{table}?on_conflict=rate_date,base_currency,symbol`에
//! `Prefer: resolution=merge-duplicates`를 붙여 자연 키 기준 upsert를 수행합니다.

use super::{validate_table_name, RateStore, NATURAL_KEY_COLUMNS};
use crate::error::StoreError;
use async_trait::async_trait;
use fxrate_core::RateRow;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// PostgREST 저장소.
#[derive(Clone)]
pub struct PostgrestStore {
    client: reqwest::Client,
    rest_url: String,
    service_key: SecretString,
}

impl PostgrestStore {
    /// # Arguments
    /// * `project_url` - 프로젝트 URL (예: `https://xyz.supabase.co`)
    /// * `service_key` - 서비스 역할 키
    pub fn new(project_url: &str, service_key: SecretString) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            service_key,
        })
    }
}

#[async_trait]
impl RateStore for PostgrestStore {
    async fn upsert_rates(&self, table: &str, rows: &[RateRow]) -> Result<usize, StoreError> {
        validate_table_name(table)?;
        if rows.is_empty() {
            return Ok(0);
        }

        let key = self.service_key.expose_secret();
        let response = self
            .client
            .post(format!("{}/{}", self.rest_url, table))
            .query(&[("on_conflict", NATURAL_KEY_COLUMNS.join(","))])
            .header("apikey", key)
            .bearer_auth(key)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(table = table, rows = rows.len(), "PostgREST upsert 완료");
        Ok(rows.len())
    }
}
