// src/services/okanebox.rs
use chrono::NaiveDate;
use log::{debug, error, info};
use reqwest::{header, Client};
use serde::Deserialize;
use thiserror::Error;

use crate::config::OkaneboxConfig;
use crate::models::{QuotaRecord, QuotaSeries};
use crate::services::normalizer::FundQuery;

/// Why a history fetch failed. Every variant ends the run; the tag only
/// tells callers which stage broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("connection error: {0}")]
    Connectivity(String),

    #[error("decoding error: {0}")]
    Decoding(String),

    #[error("unexpected response shape: {0}")]
    SchemaMismatch(String),
}

impl FetchError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connectivity(_) => "connectivity",
            Self::Decoding(_) => "decoding",
            Self::SchemaMismatch(_) => "schema_mismatch",
        }
    }
}

/// A row of `/fundoinvestimento/hist`. Other columns are ignored.
#[derive(Debug, Deserialize)]
struct RawQuotaRecord {
    #[serde(rename = "DT_COMPTC")]
    dt_comptc: String,
    #[serde(rename = "VL_QUOTA")]
    vl_quota: f64,
    #[serde(rename = "VL_QUOTA_NORM")]
    vl_quota_norm: f64,
}

impl RawQuotaRecord {
    fn into_record(self) -> Result<QuotaRecord, FetchError> {
        // DT_COMPTC may carry a time part after the date
        let date = self
            .dt_comptc
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .ok_or_else(|| FetchError::SchemaMismatch(format!("invalid DT_COMPTC '{}'", self.dt_comptc)))?;

        Ok(QuotaRecord {
            date,
            quota: self.vl_quota,
            quota_norm: self.vl_quota_norm,
        })
    }
}

/// Parses a decompressed response body into a date-ordered series.
pub fn parse_history(body: &[u8]) -> Result<QuotaSeries, FetchError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| FetchError::Decoding(format!("malformed JSON: {}", e)))?;

    if !value.is_array() {
        return Err(FetchError::Decoding("expected a JSON array of records".to_string()));
    }

    let raw: Vec<RawQuotaRecord> =
        serde_json::from_value(value).map_err(|e| FetchError::SchemaMismatch(e.to_string()))?;

    let records = raw
        .into_iter()
        .map(RawQuotaRecord::into_record)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(QuotaSeries::from_records(records))
}

pub struct OkaneboxClient {
    client: Client,
    config: OkaneboxConfig,
}

impl OkaneboxClient {
    pub fn new(config: OkaneboxConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder().gzip(true);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Connectivity(format!("failed to build HTTP client: {}", e)))?;

        Ok(OkaneboxClient { client, config })
    }

    pub fn url_for(&self, query: &FundQuery) -> String {
        format!(
            "{base}/{cnpj}/{start}/{end}/",
            base = self.config.base_url.trim_end_matches('/'),
            cnpj = query.cnpj(),
            start = query.start(),
            end = query.end()
        )
    }

    /// One GET, no retries. Any failure discards the whole response.
    pub async fn fetch_history(&self, query: &FundQuery) -> Result<QuotaSeries, FetchError> {
        let url = self.url_for(query);
        info!("Fetching fund history from URL: {}", url);

        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.config.token))
            .send()
            .await
            .map_err(|e| {
                error!("Request to Okanebox failed: {}", e);
                FetchError::Connectivity(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Okanebox answered with status {}", status);
            return Err(FetchError::Connectivity(format!("HTTP status {}", status)));
        }

        let body = response.bytes().await.map_err(|e| {
            error!("Failed to read Okanebox response body: {}", e);
            FetchError::Decoding(e.to_string())
        })?;
        debug!("Received {} bytes (decompressed)", body.len());

        let series = parse_history(&body)?;
        info!("Parsed {} quota records for {}", series.len(), query.cnpj());
        Ok(series)
    }
}
