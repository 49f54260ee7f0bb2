#![forbid(unsafe_code)]
//! costguard-warehouse: where estimation signals come from.
//!
//! Responsibilities:
//! - One narrow capability trait per signal family (plans, history, table
//!   stats, cache probability, warehouse size).
//! - Plan-text parsing into a `PlanSignal`.
//! - A scripted, file-backed implementation of every trait for offline
//!   estimation, demos, and tests.
//!
//! **No arithmetic** here. The engine crate decides what the signals mean;
//! wire-protocol clients for live warehouses live outside this workspace and
//! plug into the same traits.

pub mod explain;
pub mod scripted;
pub mod traits;

pub use explain::parse_explain_text;
pub use scripted::{probability_from_recent_runs, ScriptedWarehouse};
pub use traits::{
    CacheProbabilityProvider, HistoryProvider, PlanProvider, SignalError, SignalResult,
    TableStatsProvider, WarehouseSizeProvider,
};
