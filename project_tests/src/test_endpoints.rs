//! # Endpoint Live Probe
//!
//! Connects to a running telemetry backend, exercises every feed once, and
//! prints a merged storage table so the wiring can be verified end to end.

use anyhow::Result;
use clap::Parser;
use lib_telemetry::{
    ApiClient, Balance, CloudInvDto, Endpoint, EndpointModel, ProdStatsDto, ProdStatsModel,
    WorldInvDto, WorldInvModel, classify, merge_storage,
};

#[derive(Parser, Debug)]
#[clap(about = "Live probe for the factory telemetry backend", version)]
struct Args {
    #[clap(
        long,
        env = "FACTORY_BASE_URL",
        default_value = "http://localhost:8080",
        help = "Base URL of the running backend."
    )]
    url: String,

    #[clap(long, default_value_t = 20, help = "Maximum merged rows to print.")]
    rows: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = ApiClient::new(&args.url)?;

    println!("[*] Probing backend at {}", args.url);

    let cloud: Vec<CloudInvDto> = client.fetch_array(Endpoint::CloudInv).await?;
    println!("[OK] {}: {} records", Endpoint::CloudInv, cloud.len());

    let world: Vec<WorldInvDto> = client.fetch_array(Endpoint::WorldInv).await?;
    println!("[OK] {}: {} records", Endpoint::WorldInv, world.len());

    let stats: Vec<ProdStatsDto> = client.fetch_array(Endpoint::ProdStats).await?;
    println!("[OK] {}: {} records", Endpoint::ProdStats, stats.len());

    let inventory: Vec<_> = world.into_iter().map(WorldInvModel::map).collect();
    let rates: Vec<_> = stats.into_iter().map(ProdStatsModel::map).collect();
    let merged = merge_storage(&inventory, &rates);

    println!();
    println!("{:<32} {:>8}  {:<30} balance", "item", "amount", "rates");
    println!("{}", "-".repeat(84));
    for row in merged.iter().take(args.rows) {
        let balance = classify(row.current_production, row.current_consumption);
        let marker = if balance == Balance::Deficit { "!" } else { " " };
        println!(
            "{marker}{:<31} {:>8}  {:<30} {balance}",
            row.display_name(),
            row.amount,
            row.production_per_minute
        );
    }
    if merged.len() > args.rows {
        println!("... {} more rows", merged.len() - args.rows);
    }

    Ok(())
}
