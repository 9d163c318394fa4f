// src/models.rs
use serde::{Serialize, Deserialize};
use chrono::NaiveDate;

use crate::services::normalizer::FundQuery;

/// One day of fund history as returned by Okanebox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaRecord {
    pub date: NaiveDate,
    pub quota: f64,
    pub quota_norm: f64,
}

/// Quota history ordered by date ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuotaSeries {
    records: Vec<QuotaRecord>,
}

impl QuotaSeries {
    pub fn from_records(mut records: Vec<QuotaRecord>) -> Self {
        // stable: same-day rows keep API order
        records.sort_by_key(|r| r.date);
        QuotaSeries { records }
    }

    pub fn records(&self) -> &[QuotaRecord] {
        &self.records
    }

    pub fn quotas(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.quota).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedPoint {
    pub date: NaiveDate,
    pub quota: f64,
    pub quota_norm: f64,
    pub running_max: f64,
    pub drawdown: Option<f64>,
    pub change: Option<f64>,
    pub volatility: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub observations: usize,
    pub total_return: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub latest_volatility: Option<f64>,
}

/// Everything the dashboard needs to draw one fund.
#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub query: FundQuery,
    pub points: Vec<DerivedPoint>,
    pub summary: MetricsSummary,
}

impl ChartData {
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }
}
