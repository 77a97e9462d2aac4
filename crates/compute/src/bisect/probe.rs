use async_trait::async_trait;
use rowbisect_core::{ProbeError, RowRange};

/// Tests whether every row in a range can be read back.
///
/// `Ok(())` means the query ran and produced at least one row. Any error,
/// including "no rows", is treated by the engine as a fault in the range.
/// Implementations are shared by all workers and must allow concurrent calls.
#[async_trait]
pub trait RangeProbe: Send + Sync {
    async fn probe(&self, range: RowRange) -> Result<(), ProbeError>;
}
