// src/handlers/page.rs
use chrono::Utc;
use chrono_tz::America::Sao_Paulo;
use log::{error, info};
use std::sync::Arc;
use warp::reply::Html;
use warp::Rejection;

use super::fund::FundParams;
use crate::models::{ChartData, MetricsSummary};
use crate::services::charts::render_all;
use crate::services::okanebox::OkaneboxClient;
use crate::services::pipeline;

pub const DEFAULT_START: &str = "1900-01-01";

const STYLE: &str = "body{font-family:Arial,sans-serif;margin:24px;color:#333}\
form{display:flex;gap:12px;align-items:flex-end;margin-bottom:16px}\
label{display:flex;flex-direction:column;font-size:12px}\
.error{background:#fbeaea;border:1px solid #d9534f;padding:12px;color:#a94442}\
.plot{margin:16px 0;max-width:760px}.plot-title{font-weight:bold;margin-bottom:4px}\
table.summary td{padding:2px 12px 2px 0}";

fn default_end() -> String {
    Utc::now().with_timezone(&Sao_Paulo).format("%Y-%m-%d").to_string()
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_form(cnpj: &str, start: &str, end: &str) -> String {
    format!(
        r#"<form method="get" action="/">
<label>Fund CNPJ<input type="text" name="cnpj" value="{cnpj}" placeholder="00.000.000/0000-00"></label>
<label>Start<input type="date" name="start" value="{start}"></label>
<label>End<input type="date" name="end" value="{end}"></label>
<button type="submit">Show</button>
</form>"#,
        cnpj = escape_html(cnpj),
        start = escape_html(start),
        end = escape_html(end)
    )
}

fn fmt_pct(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}%", v)).unwrap_or_else(|| "-".to_string())
}

fn render_summary(summary: &MetricsSummary) -> String {
    let period = match (summary.first_date, summary.last_date) {
        (Some(first), Some(last)) => format!("{} - {}", first.format("%d/%m/%Y"), last.format("%d/%m/%Y")),
        _ => "-".to_string(),
    };
    format!(
        r#"<table class="summary">
<tr><td>Period</td><td>{period}</td></tr>
<tr><td>Observations</td><td>{obs}</td></tr>
<tr><td>Total return</td><td>{ret}</td></tr>
<tr><td>Max drawdown</td><td>{dd}</td></tr>
<tr><td>Latest volatility</td><td>{vol}</td></tr>
</table>"#,
        period = period,
        obs = summary.observations,
        ret = fmt_pct(summary.total_return),
        dd = fmt_pct(summary.max_drawdown),
        vol = fmt_pct(summary.latest_volatility)
    )
}

fn render_results(data: &ChartData) -> String {
    let mut body = format!(
        r#"<h2>Fund {cnpj}</h2>{summary}<p><a href="/api/v1/fund/csv?cnpj={cnpj}&amp;start={start}&amp;end={end}">Download CSV</a></p>"#,
        cnpj = data.query.cnpj(),
        start = data.query.start(),
        end = data.query.end(),
        summary = render_summary(&data.summary)
    );
    for chart in render_all(data) {
        body.push_str(&chart);
    }
    body
}

fn render_error(message: &str) -> String {
    format!(r#"<div class="error">{}</div>"#, escape_html(message))
}

pub fn render_page(form: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en"><head><meta charset="utf-8"><title>Fund Quota Dashboard</title><style>{style}</style></head>
<body><h1>Fund Quota Dashboard</h1>
{form}
{content}
</body></html>"#,
        style = STYLE,
        form = form,
        content = content
    )
}

/// Every submission reruns normalize, fetch and derive from scratch. Failures
/// replace the charts with a single message.
pub async fn get_dashboard(params: FundParams, client: Arc<OkaneboxClient>) -> Result<Html<String>, Rejection> {
    let start = params.start.clone().unwrap_or_else(|| DEFAULT_START.to_string());
    let end = params.end.clone().unwrap_or_else(default_end);
    let cnpj = params.cnpj.clone().unwrap_or_default();
    let form = render_form(&cnpj, &start, &end);

    if params.cnpj.is_none() {
        return Ok(warp::reply::html(render_page(&form, "")));
    }

    info!("Rendering dashboard for '{}' from {} to {}", cnpj, start, end);
    let content = match pipeline::run(&client, &cnpj, &start, &end).await {
        Ok(data) => render_results(&data),
        Err(e) => {
            error!("Dashboard run failed ({}): {}", e.kind(), e);
            render_error(&e.to_string())
        }
    };

    Ok(warp::reply::html(render_page(&form, &content)))
}

/// Turns an unparsable query string on `/` into the dashboard page with one
/// error message; other rejections pass through.
pub async fn recover_dashboard(err: Rejection) -> Result<Html<String>, Rejection> {
    match err.find::<warp::reject::InvalidQuery>() {
        Some(e) => {
            error!("Dashboard query rejected: {}", e);
            let form = render_form("", DEFAULT_START, &default_end());
            Ok(warp::reply::html(render_page(&form, &render_error(&e.to_string()))))
        }
        None => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html(r#"<b a="x">'&'</b>"#), "&lt;b a=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/b&gt;");
    }

    #[test]
    fn error_page_shows_one_message() {
        let page = render_page("", &render_error("Failed to fetch fund data: boom"));
        assert_eq!(page.matches(r#"class="error""#).count(), 1);
        assert!(page.contains("boom"));
        assert!(!page.contains("<svg"));
    }

    #[test]
    fn default_end_is_a_normalizable_date() {
        assert!(crate::services::normalizer::normalize_date(&default_end()).is_some());
    }
}
