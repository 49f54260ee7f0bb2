//! Capability traits the estimation engine consumes.
//!
//! The engine holds one optional provider per signal family and treats `Err`
//! exactly like a missing signal: it logs and falls through to the next
//! estimation layer.
//!
//! Invariants:
//! - Calls MUST fail fast. Any deadline or retry policy belongs inside the
//!   implementation; the engine never waits on a second attempt.
//! - Implementations MUST be safe to share across threads (`Send + Sync`);
//!   batch estimation may fan out.

use std::collections::HashMap;

use costguard_core::prelude::{HistorySignal, PlanSignal, TableRef, TableStats};
use costguard_core::warehouse::WarehouseSize;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

pub type SignalResult<T> = std::result::Result<T, SignalError>;

/// Plans a statement without executing it.
pub trait PlanProvider: Send + Sync {
    /// `Ok(None)` when the backend holds no plan for this statement.
    fn explain(&self, sql: &str) -> SignalResult<Option<PlanSignal>>;
}

/// Aggregated wall-clock history for named jobs.
pub trait HistoryProvider: Send + Sync {
    /// Runs of `job_name` recorded inside the last `window_days` days.
    /// `Ok(None)` when the window holds no runs.
    fn history(&self, job_name: &str, window_days: u32) -> SignalResult<Option<HistorySignal>>;
}

/// Catalog row/byte counts.
pub trait TableStatsProvider: Send + Sync {
    /// Stats keyed by qualified table name. Tables the backend cannot
    /// resolve are absent from the map, never an error.
    fn table_stats(&self, refs: &[TableRef]) -> SignalResult<HashMap<String, TableStats>>;
}

/// Result-cache likelihood for a statement.
pub trait CacheProbabilityProvider: Send + Sync {
    /// Probability in 0.0..=1.0 that the result cache answers this query.
    fn cache_probability(&self, sql: &str) -> SignalResult<f64>;
}

/// Live warehouse sizing.
pub trait WarehouseSizeProvider: Send + Sync {
    fn current_size(&self, warehouse: &str) -> SignalResult<WarehouseSize>;
}
