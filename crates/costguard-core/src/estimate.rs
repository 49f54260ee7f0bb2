//! Estimate records and batch reports.
//!
//! The engine emits one `CostEstimate` per job and wraps a batch in a
//! `RunReport`; the report is what the CLI renders and what CI archives.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::warehouse::WarehouseSize;

/// Which estimation layer produced the time figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    /// Plan output (bytes scanned, pruning, scan shape).
    Plan,
    /// Historical runtimes for the same job.
    History,
    /// Table statistics or the pure-complexity floor.
    Heuristic,
}

/// The engine's verdict for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Job name.
    pub job: String,

    /// Estimated charge in currency units, cache discount applied.
    pub estimated_cost: f64,

    /// Raw predicted execution time, seconds.
    pub estimated_time_seconds: f64,

    /// Billed time after minimum-increment rounding. Always a positive
    /// multiple of 60 for computed estimates; zero only when `skipped`.
    pub billable_time_seconds: u64,

    /// Structural complexity score, 0..=100.
    pub complexity_score: u8,

    /// Size the cost was priced against.
    pub warehouse_size: WarehouseSize,

    /// Credit burn rate used for pricing.
    pub credits_per_hour: f64,

    /// Probability the result cache answers this query, 0.0..=1.0.
    pub cache_hit_probability: f64,

    /// Conservative what-if: cost with time inflated by complexity and no
    /// cache discount. Feeds the expensive-pattern flag only.
    pub scaled_cost: f64,

    /// Set when the job's shape warrants review regardless of its price.
    pub expensive_pattern: bool,

    /// Set when the job was excluded before estimation.
    pub skipped: bool,

    /// Provenance of the time figure; `None` when skipped.
    pub source: Option<EstimateSource>,
}

impl CostEstimate {
    /// Zero-valued record for a job excluded from estimation.
    pub fn skipped(job: impl Into<String>, warehouse_size: WarehouseSize) -> Self {
        Self {
            job: job.into(),
            estimated_cost: 0.0,
            estimated_time_seconds: 0.0,
            billable_time_seconds: 0,
            complexity_score: 0,
            warehouse_size,
            credits_per_hour: 0.0,
            cache_hit_probability: 0.0,
            scaled_cost: 0.0,
            expensive_pattern: false,
            skipped: true,
            source: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub Uuid);

/// A full batch of estimates with provenance and wall-clock bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub id: ReportId,

    /// Estimator version string for provenance.
    pub engine_version: String,

    /// Warehouse name the batch was priced against.
    pub warehouse: String,

    /// Sum of per-job estimated costs (skipped jobs contribute zero).
    pub total_cost: f64,

    pub estimates: Vec<CostEstimate>,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunReport {
    pub fn new(warehouse: impl Into<String>, started_ms: u64) -> Self {
        Self {
            id: ReportId(Uuid::new_v4()),
            engine_version: crate::VERSION.to_string(),
            warehouse: warehouse.into(),
            total_cost: 0.0,
            estimates: Vec::new(),
            started_ms,
            finished_ms: started_ms,
        }
    }

    /// Append one estimate and fold its cost into the total.
    pub fn record(&mut self, estimate: CostEstimate) {
        self.total_cost += estimate.estimated_cost;
        self.estimates.push(estimate);
    }

    pub fn finish(mut self, finished_ms: u64) -> Self {
        self.finished_ms = finished_ms;
        self
    }

    /// Estimates that were actually computed (not skipped).
    pub fn estimated(&self) -> impl Iterator<Item = &CostEstimate> {
        self.estimates.iter().filter(|e| !e.skipped)
    }
}
