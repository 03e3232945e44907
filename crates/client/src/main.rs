//! Probe the catalog service: refresh the catalog, print the stock report.
//!
//! Usage: `clinistock-probe [search]`. Configuration comes from the
//! `CLINISTOCK_*` environment variables.

use anyhow::Context;
use tracing::info;

use clinistock_client::ClientConfig;
use clinistock_inventory::FilterCriteria;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    clinistock_observability::init();

    let config = ClientConfig::from_env().context("failed to load client configuration")?;
    let client = clinistock_client::connect(&config)?;

    let supplies = client
        .force_refresh()
        .await
        .with_context(|| format!("catalog service at {} is unreachable", config.api_url))?;
    info!(count = supplies.len(), api_url = %config.api_url, "catalog loaded");

    if let Some(search) = std::env::args().nth(1) {
        let hits = client
            .get_filtered_catalog(&FilterCriteria::search(search))
            .await
            .context("filtered catalog query failed")?;
        for supply in &hits {
            println!(
                "{}\t{}\t{} {}\t{}",
                supply.id_typed(),
                supply.name(),
                supply.quantity(),
                supply.unit(),
                client.get_health_state(supply)
            );
        }
    }

    let report = client.stock_report();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
