mod cli;
mod db;
mod probe;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use rowbisect_compute::{run_bisection, TracingReporter};
use rowbisect_core::config::load_dotenv;

use crate::cli::CliArgs;
use crate::probe::SqlRangeProbe;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();

    let config = args.resolve_config();
    config.validate().context("invalid configuration")?;
    config.log_summary();

    let target = &config.target;
    let table = target.require_table()?.to_string();
    let concurrency = config.bisect.resolved_concurrency();

    let pool = db::init_pool(target, concurrency)
        .await
        .context("failed to connect to the database")?;

    let seed = db::discover_seed(&pool, &table, &target.row_id_column)
        .await
        .with_context(|| format!("failed to read row id bounds of '{}'", table))?;

    let probe = Arc::new(SqlRangeProbe::new(pool.clone(), target, &table));
    let reporter = Arc::new(TracingReporter::new(table.as_str(), target.row_id_column.as_str()));

    let summary = run_bisection(probe, reporter, seed, &config.bisect).await;
    pool.close().await;

    info!(
        "Scanned {} rows of '{}' in {:.1}s: {} probes, {} broken rows",
        seed.width(),
        table,
        summary.elapsed.as_secs_f64(),
        summary.progress.finished,
        summary.progress.broken
    );
    Ok(())
}
