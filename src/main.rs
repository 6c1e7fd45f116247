use anyhow::{Context, Result};
use config_manager::SystemConfig;
use fetch_orchestrator::{CycleOutcome, FetchOrchestrator};
use transfer_core::RecordFilter;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = SystemConfig::load().context("failed to load configuration")?;
    let orchestrator =
        FetchOrchestrator::from_config(&config).context("failed to build fetch orchestrator")?;

    // Usage: transfer_tracker [YYYY-MM-DD] [--all]
    // No date runs the current UTC day; --all disables the BTC filter.
    let mut date: Option<String> = None;
    for arg in std::env::args().skip(1) {
        if arg == "--all" {
            orchestrator.set_filter(RecordFilter::All).await;
        } else {
            date = Some(arg);
        }
    }

    let outcome = match date {
        Some(date) => orchestrator.set_date(&date).await?,
        None => orchestrator.refresh().await?,
    };

    if let CycleOutcome::Completed {
        pages,
        records,
        termination,
    } = outcome
    {
        info!(
            "Fetched {} records over {} pages ({:?})",
            records, pages, termination
        );
    }

    let snapshot = orchestrator.snapshot().await;
    let analysis = match snapshot.analysis {
        Some(analysis) => analysis,
        None => {
            warn!("No aggregate produced");
            return Ok(());
        }
    };

    info!(
        "Totals: ${:.2} across {} transfers ({} of {} loaded records pass the filter, {} skipped)",
        analysis.total_volume,
        analysis.total_txs,
        snapshot.filtered_count,
        snapshot.total_loaded,
        analysis.skipped_records
    );

    let mut pairs: Vec<_> = analysis.pair_volumes.iter().collect();
    pairs.sort_by(|a, b| b.1.volume.total_cmp(&a.1.volume));
    info!("Top pairs by volume:");
    for (key, pair) in pairs.iter().take(10) {
        info!("  {:<50} ${:>14.2} ({} txs)", key, pair.volume, pair.count);
    }

    let mut routes: Vec<_> = analysis.route_volumes.iter().collect();
    routes.sort_by(|a, b| b.1.volume.total_cmp(&a.1.volume));
    info!("Routes:");
    for (tool, stats) in routes.iter().take(10) {
        info!(
            "  {:<30} ${:>14.2} ({} txs)",
            tool, stats.volume, stats.count
        );
    }

    let mut chains: Vec<_> = analysis.chain_volumes.iter().collect();
    chains.sort_by(|a, b| b.1.total_cmp(a.1));
    info!("Sending-chain volume:");
    for (chain, volume) in chains.iter().take(10) {
        info!("  {:<20} ${:>14.2}", chain, volume);
    }

    info!("Top transactions:");
    for tx in &analysis.top_transactions {
        info!(
            "  ${:>12.2}  {} ({}) -> {} ({})  via {} [{}]",
            tx.volume, tx.from_symbol, tx.from_chain, tx.to_symbol, tx.to_chain, tx.route,
            tx.integrator
        );
    }

    Ok(())
}
