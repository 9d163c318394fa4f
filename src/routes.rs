// src/routes.rs
use std::sync::Arc;
use warp::reject::Rejection;
use crate::handlers::fund::{get_fund_csv, get_fund_data, FundParams};
use crate::handlers::page::{get_dashboard, recover_dashboard};
use crate::services::okanebox::OkaneboxClient;
use log::info;

use std::convert::Infallible;
use warp::{Filter, Reply};
use crate::handlers::error::ApiError;

// Render rejections as `{"error": .., "kind": ..}`
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;
    let kind;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
        kind = "not_found";
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
        kind = api_error.kind;
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        code = warp::http::StatusCode::BAD_REQUEST;
        message = e.to_string();
        kind = "input";
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = warp::http::StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
        kind = "method";
    } else {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
        kind = "internal";
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
            "kind": kind,
        })),
        code,
    ))
}

pub fn routes(client: Arc<OkaneboxClient>) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let client_filter = warp::any().map(move || client.clone());

    let dashboard_route = warp::path::end()
        .and(warp::get())
        .and(
            warp::query::<FundParams>()
                .and(client_filter.clone())
                .and_then(get_dashboard)
                .recover(recover_dashboard)
                .unify(),
        );

    let fund_route = warp::path!("api" / "v1" / "fund")
        .and(warp::get())
        .and(warp::query::<FundParams>())
        .and(client_filter.clone())
        .and_then(get_fund_data);

    let fund_csv_route = warp::path!("api" / "v1" / "fund" / "csv")
        .and(warp::get())
        .and(warp::query::<FundParams>())
        .and(client_filter.clone())
        .and_then(get_fund_csv);

    let health_route = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({ "status": "ok" })));

    info!("All routes configured successfully.");

    dashboard_route
        .or(fund_route)
        .or(fund_csv_route)
        .or(health_route)
        .recover(handle_rejection)
}
