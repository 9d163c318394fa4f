// src/services/export.rs
use anyhow::Result;
use csv::Writer;

use crate::models::ChartData;

const HEADER: [&str; 7] = [
    "date",
    "quota",
    "quota_norm",
    "running_max",
    "drawdown",
    "change",
    "volatility",
];

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes the aligned series as CSV; missing values become empty cells.
pub fn to_csv(data: &ChartData) -> Result<String> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(HEADER)?;

    for p in &data.points {
        wtr.write_record([
            p.date.format("%Y-%m-%d").to_string(),
            p.quota.to_string(),
            p.quota_norm.to_string(),
            p.running_max.to_string(),
            optional(p.drawdown),
            optional(p.change),
            optional(p.volatility),
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}

/// Download name, e.g. `10500884000105_20200101_20201231.csv`.
pub fn csv_file_name(data: &ChartData) -> String {
    format!("{}_{}_{}.csv", data.query.cnpj(), data.query.start(), data.query.end())
}
