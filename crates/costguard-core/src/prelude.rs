//! Convenient re-exports for downstream crates.

pub use crate::config::{wildcard_match, GuardConfig, JobOverride};
pub use crate::error::{Error, Result};
pub use crate::estimate::{CostEstimate, EstimateSource, ReportId, RunReport};
pub use crate::fingerprint::{fingerprint_sql, SqlFingerprint};
pub use crate::job::{DependencyRef, JobDescriptor};
pub use crate::signal::{HistorySignal, PlanSignal, TableRef, TableStats};
pub use crate::warehouse::WarehouseSize;
