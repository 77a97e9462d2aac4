use async_trait::async_trait;
use futures::TryStreamExt;
use rowbisect_compute::RangeProbe;
use rowbisect_core::{ProbeError, RowRange, TargetConfig};
use sqlx::mysql::MySqlPool;

/// Probes a row id range by running one query over it.
///
/// Sent over the text protocol so `EXPLAIN ANALYZE` goes through unprepared.
pub struct SqlRangeProbe {
    pool: MySqlPool,
    /// Statement up to and excluding the WHERE clause.
    select: String,
    row_id_column: String,
}

impl SqlRangeProbe {
    /// `target` must have passed validation: its identifiers are spliced into SQL.
    pub fn new(pool: MySqlPool, target: &TargetConfig, table: &str) -> Self {
        let explain = if target.explain_analyze { "EXPLAIN ANALYZE " } else { "" };
        Self {
            pool,
            select: format!("{}SELECT {} FROM {}", explain, target.projection, table),
            row_id_column: target.row_id_column.clone(),
        }
    }

    pub fn query_for(&self, range: RowRange) -> String {
        format!(
            "{} WHERE {col} >= {} AND {col} < {}",
            self.select,
            range.start(),
            range.end(),
            col = self.row_id_column
        )
    }
}

#[async_trait]
impl RangeProbe for SqlRangeProbe {
    async fn probe(&self, range: RowRange) -> Result<(), ProbeError> {
        let sql = self.query_for(range);
        let mut rows = sqlx::raw_sql(&sql).fetch(&self.pool);
        first_row_outcome(rows.try_next().await)
    }
}

/// Only the first row matters: a query that errors or yields nothing is a fault.
fn first_row_outcome<R>(first: Result<Option<R>, sqlx::Error>) -> Result<(), ProbeError> {
    match first {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(ProbeError::EmptyResult),
        Err(e) => Err(ProbeError::Query(e.to_string())),
    }
}
