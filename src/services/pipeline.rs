// src/services/pipeline.rs
use log::{error, info};
use thiserror::Error;

use crate::models::{ChartData, QuotaSeries};
use crate::services::metrics::{derive_points, summarize};
use crate::services::normalizer::{FundQuery, InputError};
use crate::services::okanebox::{FetchError, OkaneboxClient};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Failed to fetch fund data: {0}")]
    Fetch(#[from] FetchError),
}

impl PipelineError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::Fetch(e) => e.kind(),
        }
    }
}

/// Derives every chart series from an already fetched history.
pub fn build_chart_data(query: FundQuery, series: &QuotaSeries) -> ChartData {
    let points = derive_points(series);
    let summary = summarize(&points);
    ChartData { query, points, summary }
}

/// Fetch, then derive. Nothing is kept between calls.
pub async fn compute(client: &OkaneboxClient, query: &FundQuery) -> Result<ChartData, PipelineError> {
    let series = client.fetch_history(query).await.map_err(|e| {
        error!("Fetch failed for {}: {}", query.cnpj(), e);
        PipelineError::from(e)
    })?;

    let data = build_chart_data(query.clone(), &series);
    info!(
        "Computed {} points for {} ({} to {})",
        data.points.len(),
        query.cnpj(),
        query.start(),
        query.end()
    );
    Ok(data)
}

/// Normalizes raw form inputs and runs the pipeline. Input errors return
/// before any request is made.
pub async fn run(
    client: &OkaneboxClient,
    raw_id: &str,
    raw_start: &str,
    raw_end: &str,
) -> Result<ChartData, PipelineError> {
    let query = FundQuery::new(raw_id, raw_start, raw_end)?;
    compute(client, &query).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OkaneboxConfig;
    use crate::models::QuotaRecord;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn chart_data_is_aligned_with_the_series() {
        let start = NaiveDate::from_ymd_opt(2023, 5, 2).unwrap();
        let records = (0..30)
            .map(|i| QuotaRecord {
                date: start + Duration::days(i),
                quota: 10.0 + (i % 7) as f64,
                quota_norm: i as f64,
            })
            .collect();
        let series = QuotaSeries::from_records(records);
        let query = FundQuery::new("1", "2023-05-01", "2023-06-30").unwrap();

        let data = build_chart_data(query.clone(), &series);
        assert_eq!(data.query, query);
        assert_eq!(data.points.len(), 30);
        assert_eq!(data.dates().first(), Some(&start));
        assert!(data.points[20].volatility.is_none());
        assert!(data.points[21].volatility.is_some());
        assert_eq!(data.summary.observations, 30);
    }

    #[tokio::test]
    async fn input_errors_stop_before_the_network() {
        // Nothing listens on this address; an attempted request would be a connectivity error.
        let client = OkaneboxClient::new(OkaneboxConfig::new("http://127.0.0.1:9", "t")).unwrap();
        let err = run(&client, "no digits", "2020-01-01", "2020-02-01").await.unwrap_err();
        assert_eq!(err.kind(), "input");

        let err = run(&client, "123", "2020-01-01", "not-a-date").await.unwrap_err();
        assert!(matches!(err, PipelineError::Input(InputError::EndDate(_))));
    }

    #[tokio::test]
    async fn network_failure_is_one_collapsed_message() {
        let client = OkaneboxClient::new(OkaneboxConfig::new("http://127.0.0.1:9", "t")).unwrap();
        let err = run(&client, "123", "2020-01-01", "2020-02-01").await.unwrap_err();
        assert_eq!(err.kind(), "connectivity");
        let message = err.to_string();
        assert!(message.starts_with("Failed to fetch fund data: connection error:"), "{}", message);
    }
}
