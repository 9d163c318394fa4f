// src/bin/fetch_fund.rs
use fund_quota_dashboard::config::AppConfig;
use fund_quota_dashboard::services::export::to_csv;
use fund_quota_dashboard::services::okanebox::OkaneboxClient;
use fund_quota_dashboard::services::pipeline;
use log::{info, error};
use dotenv::dotenv;
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 3 {
        anyhow::bail!("usage: fetch_fund <cnpj> <start> <end> [--csv]");
    }
    let print_csv = args.iter().any(|a| a == "--csv");

    let config = AppConfig::from_env()?;
    let client = OkaneboxClient::new(config.okanebox)?;

    info!("Running pipeline for {} from {} to {}", args[0], args[1], args[2]);
    let data = match pipeline::run(&client, &args[0], &args[1], &args[2]).await {
        Ok(data) => data,
        Err(e) => {
            error!("ERROR ({}): {}", e.kind(), e);
            return Err(e.into());
        }
    };

    let summary = &data.summary;
    info!("CNPJ:              {}", data.query.cnpj());
    info!("Observations:      {}", summary.observations);
    info!("Period:            {:?} to {:?}", summary.first_date, summary.last_date);
    info!("Total return:      {:?}", summary.total_return);
    info!("Max drawdown:      {:?}", summary.max_drawdown);
    info!("Latest volatility: {:?}", summary.latest_volatility);

    if print_csv {
        print!("{}", to_csv(&data)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&data.summary)?);
    }

    Ok(())
}
