// src/services/charts.rs
use chrono::NaiveDate;

use crate::models::ChartData;

const WIDTH: i32 = 720;
const HEIGHT: i32 = 300;
const PADDING: f64 = 48.0;
const Y_TICKS: usize = 5;
const X_LABELS: usize = 6;

const RETURN_COLOR: &str = "#348dc1";
const DRAWDOWN_COLOR: &str = "#d9534f";
const VOLATILITY_COLOR: &str = "#ff9933";

pub const RETURN_TITLE: &str = "Normalized Return";
pub const DRAWDOWN_TITLE: &str = "Drawdown (%)";
pub const VOLATILITY_TITLE: &str = "Rolling Volatility 21d (% a.a.)";

/// Hover text for one point: `dd/mm/yyyy: 12.34`.
pub fn format_tooltip(date: NaiveDate, value: f64) -> String {
    format!("{}: {:.2}", date.format("%d/%m/%Y"), value)
}

fn extent(values: &[Option<f64>]) -> Option<(f64, f64)> {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for v in values.iter().flatten() {
        if v.is_finite() {
            min_v = min_v.min(*v);
            max_v = max_v.max(*v);
        }
    }

    if !min_v.is_finite() || !max_v.is_finite() {
        return None;
    }

    if min_v == max_v {
        let adjust = if min_v == 0.0 { 1.0 } else { min_v.abs() * 0.1 }; // widen flat ranges
        min_v -= adjust;
        max_v += adjust;
    }

    Some((min_v, max_v))
}

fn scale_value(value: f64, min_v: f64, max_v: f64, height: f64) -> f64 {
    let inner_height = height - 2.0 * PADDING;
    let norm = (value - min_v) / (max_v - min_v);
    PADDING + (1.0 - norm) * inner_height
}

fn x_positions(len: usize, width: f64) -> Vec<f64> {
    if len == 0 {
        return Vec::new();
    }

    if len == 1 {
        return vec![width / 2.0];
    }

    let inner_width = width - 2.0 * PADDING;
    (0..len)
        .map(|i| PADDING + inner_width * (i as f64 / (len - 1) as f64))
        .collect()
}

fn svg_header(width: i32, height: i32) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}"><style>text{{font-family:Arial,sans-serif;font-size:10px;fill:#666}} circle.pt{{fill-opacity:0}} circle.pt:hover{{fill-opacity:1}}</style>"#,
        w = width,
        h = height
    )
}

fn wrap_plot(title: &str, svg_body: String) -> String {
    format!(
        r#"<div class="plot"><div class="plot-title">{title}</div>{svg}</div>"#,
        title = title,
        svg = svg_body
    )
}

fn add_value_axis(svg: &mut String, min_v: f64, max_v: f64, width: f64, height: f64) {
    for i in 0..Y_TICKS {
        let value = min_v + (max_v - min_v) * i as f64 / (Y_TICKS - 1) as f64;
        let y = scale_value(value, min_v, max_v, height);
        svg.push_str(&format!(
            r##"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="#eeeeee" stroke-width="1" />"##,
            x1 = PADDING,
            x2 = width - PADDING,
            y = y
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end">{label:.2}</text>"#,
            x = PADDING - 4.0,
            y = y + 3.0,
            label = value
        ));
    }
}

fn add_time_axis(svg: &mut String, dates: &[NaiveDate], xs: &[f64], width: f64, height: f64) {
    let axis_y = height - PADDING + 5.0;
    svg.push_str(&format!(
        r##"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="#000" stroke-width="1" />"##,
        x1 = PADDING,
        x2 = width - PADDING,
        y = axis_y
    ));

    let step = (dates.len() / X_LABELS).max(1);
    for idx in (0..dates.len()).step_by(step) {
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
            x = xs[idx],
            y = axis_y + 16.0,
            label = dates[idx].format("%m/%Y")
        ));
    }
}

/// Runs of consecutive defined points, so gaps break the line.
fn segments(xs: &[f64], ys: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (x, y) in xs.iter().zip(ys) {
        match y {
            Some(y) => current.push((*x, *y)),
            None => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// One line chart with a hover tooltip per point. Missing values are skipped.
///
/// Points are spaced by observation index, not by calendar distance, so
/// weekends and holidays take no room on the date axis.
pub fn render_line_chart(title: &str, dates: &[NaiveDate], values: &[Option<f64>], color: &str) -> String {
    let values: Vec<Option<f64>> = values.iter().map(|v| v.filter(|x| x.is_finite())).collect();

    let (min_v, max_v) = match extent(&values) {
        Some(extent) if dates.len() == values.len() => extent,
        _ => {
            return wrap_plot(title, r#"<p class="no-data">No data for the selected period</p>"#.to_string());
        }
    };

    let width = WIDTH as f64;
    let height = HEIGHT as f64;
    let xs = x_positions(dates.len(), width);
    let ys: Vec<Option<f64>> = values
        .iter()
        .map(|v| v.map(|v| scale_value(v, min_v, max_v, height)))
        .collect();

    let mut svg = svg_header(WIDTH, HEIGHT);
    add_value_axis(&mut svg, min_v, max_v, width, height);

    for segment in segments(&xs, &ys) {
        let points_attr = segment
            .iter()
            .map(|(x, y)| format!("{x:.2},{y:.2}"))
            .collect::<Vec<_>>()
            .join(" ");
        svg.push_str(&format!(
            r#"<polyline fill="none" stroke="{color}" stroke-width="1.5" points="{points}" />"#,
            color = color,
            points = points_attr
        ));
    }

    for ((date, value), (x, y)) in dates.iter().zip(&values).zip(xs.iter().zip(&ys)) {
        if let (Some(value), Some(y)) = (value, y) {
            svg.push_str(&format!(
                r#"<circle class="pt" cx="{x:.2}" cy="{y:.2}" r="3" fill="{color}"><title>{tip}</title></circle>"#,
                x = x,
                y = y,
                color = color,
                tip = format_tooltip(*date, *value)
            ));
        }
    }

    add_time_axis(&mut svg, dates, &xs, width, height);
    svg.push_str("</svg>");
    wrap_plot(title, svg)
}

pub fn normalized_return_chart(data: &ChartData) -> String {
    let values: Vec<Option<f64>> = data.points.iter().map(|p| Some(p.quota_norm)).collect();
    render_line_chart(RETURN_TITLE, &data.dates(), &values, RETURN_COLOR)
}

pub fn drawdown_chart(data: &ChartData) -> String {
    let values: Vec<Option<f64>> = data.points.iter().map(|p| p.drawdown).collect();
    render_line_chart(DRAWDOWN_TITLE, &data.dates(), &values, DRAWDOWN_COLOR)
}

pub fn volatility_chart(data: &ChartData) -> String {
    let values: Vec<Option<f64>> = data.points.iter().map(|p| p.volatility).collect();
    render_line_chart(VOLATILITY_TITLE, &data.dates(), &values, VOLATILITY_COLOR)
}

/// The three dashboard charts in display order.
pub fn render_all(data: &ChartData) -> Vec<String> {
    vec![
        normalized_return_chart(data),
        drawdown_chart(data),
        volatility_chart(data),
    ]
}
