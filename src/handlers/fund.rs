// src/handlers/fund.rs
use serde::Deserialize;
use std::sync::Arc;
use warp::reply::Json;
use warp::{Rejection, Reply};
use log::{error, info};

use super::error::ApiError;
use crate::services::export::{csv_file_name, to_csv};
use crate::services::okanebox::OkaneboxClient;
use crate::services::pipeline;

/// Raw form/query inputs; absent fields behave like empty inputs.
#[derive(Debug, Default, Deserialize)]
pub struct FundParams {
    pub cnpj: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl FundParams {
    pub fn fields(&self) -> (&str, &str, &str) {
        (
            self.cnpj.as_deref().unwrap_or(""),
            self.start.as_deref().unwrap_or(""),
            self.end.as_deref().unwrap_or(""),
        )
    }
}

pub async fn get_fund_data(params: FundParams, client: Arc<OkaneboxClient>) -> Result<Json, Rejection> {
    info!("Handling request for fund data: {:?}", params);
    let (cnpj, start, end) = params.fields();

    let data = pipeline::run(&client, cnpj, start, end).await.map_err(|e| {
        error!("Fund data request failed: {}", e);
        warp::reject::custom(ApiError::from(e))
    })?;

    Ok(warp::reply::json(&data))
}

pub async fn get_fund_csv(params: FundParams, client: Arc<OkaneboxClient>) -> Result<impl Reply, Rejection> {
    info!("Handling CSV export request: {:?}", params);
    let (cnpj, start, end) = params.fields();

    let data = pipeline::run(&client, cnpj, start, end).await.map_err(|e| {
        error!("CSV export failed: {}", e);
        warp::reject::custom(ApiError::from(e))
    })?;

    let body = to_csv(&data).map_err(|e| {
        error!("Failed to write CSV: {}", e);
        warp::reject::custom(ApiError::internal_error(e.to_string()))
    })?;

    let reply = warp::reply::with_header(body, "content-type", "text/csv; charset=utf-8");
    Ok(warp::reply::with_header(
        reply,
        "content-disposition",
        format!("attachment; filename=\"{}\"", csv_file_name(&data)),
    ))
}
