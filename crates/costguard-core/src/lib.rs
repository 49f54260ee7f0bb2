#![forbid(unsafe_code)]
//! costguard-core: shared data model for pre-run cost estimation.
//!
//! Responsibilities:
//! - Job descriptors and compiled-manifest ingestion.
//! - Warehouse size/credit tables and signal structs (plans, history, stats).
//! - `GuardConfig` (defaults → project file → environment) with validation.
//! - Cost estimates, batch reports, and SQL fingerprints.
//!
//! **No estimation logic and no warehouse IO** here. The engine crate owns
//! the arithmetic; provider crates own the lookups.

pub mod config;
pub mod error;
pub mod estimate;
pub mod fingerprint;
pub mod job;
pub mod manifest;
pub mod prelude;
pub mod signal;
pub mod warehouse;

pub use config::{GuardConfig, JobOverride};
pub use error::{Error, Result};
pub use estimate::{CostEstimate, EstimateSource, ReportId, RunReport};
pub use fingerprint::{fingerprint_sql, SqlFingerprint};
pub use job::{DependencyRef, JobDescriptor};
pub use manifest::{jobs_from_manifest_str, load_manifest};
pub use signal::{HistorySignal, PlanSignal, TableRef, TableStats};
pub use warehouse::WarehouseSize;

/// Crate version, recorded in every `RunReport` for provenance.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
