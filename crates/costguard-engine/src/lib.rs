#![forbid(unsafe_code)]
//! costguard-engine: what a statement will cost before it runs.
//!
//! Responsibilities:
//! - Score SQL shape into a 0..=100 complexity figure.
//! - Estimate execution time through three layers (plan output, run history,
//!   heuristics), falling through whenever a signal is missing.
//! - Quantize time into billable increments and price it, with a cache
//!   discount and a scaled what-if diagnostic.
//!
//! The estimate is a planning figure, not a prediction: every constant here
//! is deliberately conservative, because the flag that matters most is
//! "this job's shape will blow up on real data".

pub mod billing;
pub mod complexity;
pub mod discount;
pub mod engine;
pub mod sql;
pub mod time;

pub use billing::billable_seconds;
pub use complexity::complexity_score;
pub use discount::cache_multiplier;
pub use engine::{Engine, SignalProviders};
pub use sql::{SqlFeatures, SqlText};
pub use time::{floor_seconds, seconds_from_history, seconds_from_plan, seconds_from_tables};
