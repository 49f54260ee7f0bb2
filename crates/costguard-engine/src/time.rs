//! Three-layer execution time estimation.
//!
//! Layers in strict priority order: plan output, run history, heuristic.
//! A provider error or an uninformative signal falls through to the next
//! layer; the heuristic layer always produces a figure. Every path clamps
//! to at least one second.

use costguard_core::config::GuardConfig;
use costguard_core::estimate::EstimateSource;
use costguard_core::job::JobDescriptor;
use costguard_core::prelude::{HistorySignal, PlanSignal, TableStats};

use crate::engine::SignalProviders;
use crate::sql::SqlText;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Complexity score treated as "average"; scores are normalized against it
/// before they scale a throughput or a historical median.
const AVG_COMPLEXITY: f64 = 30.0;

/// Layer 1: derive seconds from a pre-execution plan signal.
pub fn seconds_from_plan(signal: &PlanSignal, score: u8, sql: &SqlText) -> f64 {
    let mb = signal.bytes_scanned as f64 / BYTES_PER_MB;
    let complexity_factor = (score as f64 / AVG_COMPLEXITY).max(1.0);
    let throughput = 15.0 / complexity_factor; // base 15 MB/s, slower when complex
    let mut seconds = mb / throughput;

    if score > 80 {
        seconds *= 10.0;
    } else if score > 50 {
        seconds *= 5.0;
    }

    let cross_joins = sql.cross_join_count();
    if cross_joins > 0 {
        seconds *= 100.0_f64.powi(cross_joins as i32);
        tracing::warn!(cross_joins, "cartesian product in planned statement");
    }

    if signal.full_table_scan {
        seconds *= 1.5;
    }
    if !signal.partition_pruning && signal.partitions_scanned > 100 {
        seconds *= 1.3;
    }

    seconds.max(1.0)
}

/// Layer 2: derive seconds from recorded run history.
///
/// Five or more runs in the window make the median trustworthy on its own.
/// Below that the median is rescaled by the statement's complexity relative
/// to [`AVG_COMPLEXITY`].
pub fn seconds_from_history(signal: &HistorySignal, score: u8) -> f64 {
    if signal.run_count >= 5 {
        return signal.median_seconds.max(1.0);
    }
    let complexity_factor = score as f64 / AVG_COMPLEXITY;
    (signal.median_seconds * complexity_factor).max(1.0)
}

/// Layer 3 with catalog stats: derive seconds from the combined row and byte
/// counts of the statement's source tables.
pub fn seconds_from_tables(totals: TableStats, score: u8, sql: &SqlText) -> f64 {
    let penalty = (score as f64 / AVG_COMPLEXITY).powf(1.5).max(1.0);
    let from_rows = totals.row_count as f64 / (2000.0 / penalty); // base 2000 rows/s
    let from_bytes = totals.bytes as f64 / BYTES_PER_MB / 10.0; // conservative 10 MB/s
    let mut seconds = from_rows.max(from_bytes);

    let cross_joins = sql.cross_join_count();
    if cross_joins > 0 {
        seconds *= 100.0_f64.powi(cross_joins as i32);
        tracing::warn!(cross_joins, "cartesian product dominates heuristic estimate");
    } else {
        let joins = sql.raw_join_count();
        if joins > 0 {
            seconds *= 1.5_f64.powi(joins as i32);
        }
    }

    if sql.has_group_by() {
        seconds *= 3.0;
    }
    seconds *= 1.0 + 5.0 * sql.window_count() as f64;
    if sql.has_distinct() {
        seconds *= 2.0;
    }
    seconds *= 1.0 + 0.5 * sql.order_by_count() as f64;

    seconds.max(1.0)
}

/// Layer 3 without catalog stats: a floor scaled from the complexity score,
/// nudged up when the text itself hints at a scan-heavy access path.
pub fn floor_seconds(score: u8, sql: &SqlText) -> f64 {
    let mut seconds = 5.0 * (score as f64 / AVG_COMPLEXITY);
    if sql.contains("SCAN") || sql.contains("FULL") {
        seconds *= 1.5;
    }
    seconds.max(1.0)
}

/// Run the layers for one job and report which one produced the figure.
pub(crate) fn estimate_seconds(
    job: &JobDescriptor,
    sql: &SqlText,
    score: u8,
    providers: &SignalProviders,
    cfg: &GuardConfig,
) -> (f64, EstimateSource) {
    if cfg.use_plan_estimates {
        if let Some(provider) = &providers.plan {
            match provider.explain(job.sql_text()) {
                Ok(Some(signal)) if signal.is_informative() => {
                    let seconds = seconds_from_plan(&signal, score, sql);
                    tracing::debug!(job = %job.name, seconds, "estimated from execution plan");
                    return (seconds, EstimateSource::Plan);
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(job = %job.name, %err, "plan signal unavailable");
                }
            }
        }
    }

    if cfg.use_history {
        if let Some(provider) = &providers.history {
            match provider.history(&job.name, cfg.history_days) {
                Ok(Some(signal)) if signal.has_runs() => {
                    let seconds = seconds_from_history(&signal, score);
                    tracing::debug!(job = %job.name, seconds, "estimated from run history");
                    return (seconds, EstimateSource::History);
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(job = %job.name, %err, "history signal unavailable");
                }
            }
        }
    }

    (
        heuristic_seconds(job, sql, score, providers),
        EstimateSource::Heuristic,
    )
}

fn heuristic_seconds(
    job: &JobDescriptor,
    sql: &SqlText,
    score: u8,
    providers: &SignalProviders,
) -> f64 {
    let refs = job.source_refs();
    if !refs.is_empty() {
        if let Some(provider) = &providers.tables {
            match provider.table_stats(&refs) {
                Ok(stats) => {
                    let totals = stats
                        .values()
                        .fold(TableStats::default(), |acc, s| acc.combine(*s));
                    if totals.row_count > 0 {
                        let seconds = seconds_from_tables(totals, score, sql);
                        tracing::debug!(job = %job.name, seconds, "estimated from table stats");
                        return seconds;
                    }
                }
                Err(err) => {
                    tracing::warn!(job = %job.name, %err, "could not get table statistics");
                }
            }
        }
    }
    floor_seconds(score, sql)
}
