use std::time::Duration;

use rowbisect_core::{BisectError, RowRange, TargetConfig};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::info;

/// Open the connection pool shared by every probe.
pub async fn init_pool(config: &TargetConfig, concurrency: usize) -> Result<MySqlPool, BisectError> {
    let max_connections = config.resolved_max_connections(concurrency);
    info!(
        max_connections,
        "Connecting to {}",
        config.redacted_connection_string()
    );

    let pool = MySqlPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.connection_string())
        .await
        .map_err(|e| BisectError::Database(e.to_string()))?;

    info!("Connected: {}:{}", config.host, config.port);
    Ok(pool)
}

fn bounds_query(table: &str, column: &str) -> String {
    format!(
        "SELECT CAST(MIN({col}) AS SIGNED), CAST(MAX({col}) AS SIGNED) FROM {table}",
        col = column,
        table = table
    )
}

/// Turn the raw MIN/MAX of the row id column into the seed range `[min, max + 1)`.
fn seed_from_bounds(table: &str, min: Option<i64>, max: Option<i64>) -> Result<RowRange, BisectError> {
    let (Some(min), Some(max)) = (min, max) else {
        return Err(BisectError::EmptyTable(table.to_string()));
    };
    let to_row_id = |v: i64| {
        u64::try_from(v).map_err(|_| BisectError::Config(format!("negative row id {} in {}", v, table)))
    };
    RowRange::from_inclusive_bounds(to_row_id(min)?, to_row_id(max)?)
}

/// Read the row id bounds of `table` and build the range covering every row.
pub async fn discover_seed(pool: &MySqlPool, table: &str, column: &str) -> Result<RowRange, BisectError> {
    info!("Reading MIN({col}), MAX({col})", col = column);
    let (min, max): (Option<i64>, Option<i64>) = sqlx::query_as(&bounds_query(table, column))
        .fetch_one(pool)
        .await
        .map_err(|e| BisectError::Database(e.to_string()))?;

    info!("  - MIN({}.{}) = {:?}", table, column, min);
    info!("  - MAX({}.{}) = {:?}", table, column, max);
    seed_from_bounds(table, min, max)
}
