// src/services/metrics.rs
use log::{debug, warn};

use crate::models::{DerivedPoint, MetricsSummary, QuotaSeries};

/// Trailing window of period changes used for volatility.
pub const ROLLING_WINDOW: usize = 21;
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// `running_max[i] = max(raw[0..=i])`.
pub fn running_max(raw: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(raw.len());
    let mut peak = f64::NEG_INFINITY;
    for value in raw {
        if *value > peak {
            peak = *value;
        }
        out.push(peak);
    }
    out
}

/// Percent decline from the running peak; zero at every new high.
///
/// Missing where the ratio is undefined (a zero or non-finite peak).
pub fn drawdown(raw: &[f64]) -> Vec<Option<f64>> {
    raw.iter()
        .zip(running_max(raw))
        .map(|(value, peak)| Some((value / peak - 1.0) * 100.0).filter(|d| d.is_finite()))
        .collect()
}

/// Simple period-over-period change, missing at the first observation.
pub fn pct_change(raw: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(raw.len());
    if raw.is_empty() {
        return out;
    }
    out.push(None);
    out.extend(raw.windows(2).map(|pair| Some(pair[1] / pair[0] - 1.0)));
    out
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values
        .iter()
        .map(|x| {
            let d = x - mean;
            d * d
        })
        .sum::<f64>()
        / (n - 1.0);
    Some(var.sqrt())
}

/// Annualized volatility in percent over the trailing `window` changes.
///
/// Position `i` needs `window` defined changes ending at `i`; since the first
/// change is missing, the first defined value sits at index `window`.
pub fn rolling_volatility(raw: &[f64], window: usize) -> Vec<Option<f64>> {
    let changes = pct_change(raw);
    let annualization = TRADING_DAYS_PER_YEAR.sqrt() * 100.0;

    (0..changes.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let slice = &changes[i + 1 - window..=i];
            let values: Option<Vec<f64>> = slice.iter().copied().collect();
            let values = values?;
            if values.iter().any(|v| !v.is_finite()) {
                return None;
            }
            sample_std(&values).map(|std| std * annualization)
        })
        .collect()
}

/// Aligns the series with its derived fields. Recomputed in full on every call.
pub fn derive_points(series: &QuotaSeries) -> Vec<DerivedPoint> {
    let raw = series.quotas();
    if raw.iter().any(|v| *v <= 0.0) {
        warn!("Quota series has non-positive values, drawdown and volatility may be undefined");
    }

    let peaks = running_max(&raw);
    let drawdowns = drawdown(&raw);
    let changes = pct_change(&raw);
    let vols = rolling_volatility(&raw, ROLLING_WINDOW);

    debug!("Derived {} points", raw.len());

    series
        .records()
        .iter()
        .enumerate()
        .map(|(i, record)| DerivedPoint {
            date: record.date,
            quota: record.quota,
            quota_norm: record.quota_norm,
            running_max: peaks[i],
            drawdown: drawdowns[i],
            change: changes[i],
            volatility: vols[i],
        })
        .collect()
}

pub fn summarize(points: &[DerivedPoint]) -> MetricsSummary {
    let first = points.first();
    let last = points.last();

    let total_return = match (first, last) {
        (Some(f), Some(l)) if f.quota > 0.0 => Some((l.quota / f.quota - 1.0) * 100.0),
        _ => None,
    };

    let max_drawdown = points
        .iter()
        .filter_map(|p| p.drawdown)
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |m| m.min(d))));

    let latest_volatility = points.iter().rev().find_map(|p| p.volatility);

    MetricsSummary {
        first_date: first.map(|p| p.date),
        last_date: last.map(|p| p.date),
        observations: points.len(),
        total_return,
        max_drawdown,
        latest_volatility,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuotaRecord;
    use chrono::{Duration, NaiveDate};

    fn wavy(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn drawdown_scenario() {
        let raw = [100.0, 110.0, 99.0, 121.0];
        assert_eq!(running_max(&raw), vec![100.0, 110.0, 110.0, 121.0]);

        let dd: Vec<f64> = drawdown(&raw).into_iter().map(Option::unwrap).collect();
        assert_eq!(dd[0], 0.0);
        assert_eq!(dd[1], 0.0);
        assert!((dd[2] + 10.0).abs() < 1e-9);
        assert_eq!(dd[3], 0.0);
    }

    #[test]
    fn running_max_is_non_decreasing_and_drawdown_non_positive() {
        let raw = wavy(200);
        let peaks = running_max(&raw);
        assert!(peaks.windows(2).all(|w| w[1] >= w[0]));

        for (i, dd) in drawdown(&raw).iter().enumerate() {
            let dd = dd.expect("positive quotas give a defined drawdown");
            assert!(dd <= 0.0);
            if raw[i] == peaks[i] {
                assert_eq!(dd, 0.0);
            }
        }
    }

    #[test]
    fn zero_peak_gives_missing_drawdown() {
        let dd = drawdown(&[0.0, 1.0, 0.5]);
        assert_eq!(dd[0], None);
        assert_eq!(dd[1], Some(0.0));
        assert_eq!(dd[2], Some(-50.0));
        assert!(dd.iter().flatten().all(|d| *d <= 0.0));
    }

    #[test]
    fn running_max_is_causal() {
        let mut raw = wavy(50);
        let before = running_max(&raw[..30]);
        raw[40] = 1_000.0;
        let after = running_max(&raw);
        assert_eq!(before, after[..30].to_vec());
    }

    #[test]
    fn pct_change_is_missing_only_at_start() {
        let changes = pct_change(&[100.0, 110.0, 99.0]);
        assert_eq!(changes[0], None);
        assert!((changes[1].unwrap() - 0.1).abs() < 1e-12);
        assert!((changes[2].unwrap() + 0.1).abs() < 1e-12);
        assert!(pct_change(&[]).is_empty());
    }

    #[test]
    fn volatility_needs_a_full_window_of_changes() {
        let raw = wavy(60);
        let vols = rolling_volatility(&raw, ROLLING_WINDOW);
        assert_eq!(vols.len(), raw.len());
        for (i, v) in vols.iter().enumerate() {
            if i < ROLLING_WINDOW {
                assert!(v.is_none(), "index {} should be missing", i);
            } else {
                let v = v.expect("defined after the window fills");
                assert!(v.is_finite() && v >= 0.0);
            }
        }
    }

    #[test]
    fn volatility_of_constant_growth_is_zero() {
        let raw: Vec<f64> = (0..30).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let vols = rolling_volatility(&raw, ROLLING_WINDOW);
        assert!(vols[ROLLING_WINDOW].unwrap().abs() < 1e-9);
    }

    #[test]
    fn volatility_matches_hand_computed_value() {
        // alternating +1% / -1% changes
        let mut raw = vec![100.0];
        for i in 0..ROLLING_WINDOW {
            let last = *raw.last().unwrap();
            let step = if i % 2 == 0 { 1.01 } else { 0.99 };
            raw.push(last * step);
        }
        let changes: Vec<f64> = pct_change(&raw).into_iter().flatten().collect();
        let expected = sample_std(&changes).unwrap() * 252f64.sqrt() * 100.0;

        let vols = rolling_volatility(&raw, ROLLING_WINDOW);
        assert!((vols[ROLLING_WINDOW].unwrap() - expected).abs() < 1e-9);
        // 11 x 0.01 and 10 x -0.01: mean 1/2100, sample std ~0.010235
        assert!((expected - 16.25).abs() < 0.1);
    }

    #[test]
    fn short_series_has_no_volatility() {
        let vols = rolling_volatility(&wavy(21), ROLLING_WINDOW);
        assert!(vols.iter().all(Option::is_none));
    }

    #[test]
    fn derive_and_summarize() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let raw = [100.0, 110.0, 99.0, 121.0];
        let records = raw
            .iter()
            .enumerate()
            .map(|(i, q)| QuotaRecord {
                date: start + Duration::days(i as i64),
                quota: *q,
                quota_norm: q / 100.0,
            })
            .collect();
        let series = QuotaSeries::from_records(records);
        let points = derive_points(&series);

        assert_eq!(points.len(), 4);
        assert_eq!(points[2].running_max, 110.0);
        assert!(points.iter().all(|p| p.volatility.is_none()));

        let summary = summarize(&points);
        assert_eq!(summary.observations, 4);
        assert_eq!(summary.first_date, Some(start));
        assert!((summary.total_return.unwrap() - 21.0).abs() < 1e-9);
        assert!((summary.max_drawdown.unwrap() + 10.0).abs() < 1e-9);
        assert_eq!(summary.latest_volatility, None);
    }

    #[test]
    fn summary_of_empty_series() {
        let summary = summarize(&[]);
        assert_eq!(summary.observations, 0);
        assert_eq!(summary.total_return, None);
        assert_eq!(summary.max_drawdown, None);
    }
}
