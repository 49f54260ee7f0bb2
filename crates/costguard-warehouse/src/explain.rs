//! Plan-text scraping.
//!
//! Warehouses print `EXPLAIN` output as indented text, not structured rows.
//! This parser walks it line by line and pulls out the four facts the
//! estimator cares about: bytes, partitions, pruning, and scan shape.

use costguard_core::signal::PlanSignal;
use once_cell::sync::Lazy;
use regex::Regex;

static SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(?:MB|GB|KB|BYTES)").unwrap());

static PARTITIONS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*PARTITIONS").unwrap());

/// Parse raw plan text into a `PlanSignal`.
///
/// Size figures are only read from lines that talk about bytes or sizes; the
/// unit is decided per line (GB wins over MB wins over KB), and figures in
/// bare bytes are ignored as headers. Pruning matches `PRUNE`/`PRUNED`/
/// `PRUNING`, scan shape matches both `TABLE SCAN` and `TableScan` spellings.
pub fn parse_explain_text(text: &str) -> PlanSignal {
    let mut signal = PlanSignal::default();

    for line in text.lines() {
        let upper = line.to_uppercase();

        if upper.contains("BYTES") || upper.contains("SIZE") {
            for cap in SIZE_RE.captures_iter(&upper) {
                let value: f64 = match cap[1].parse() {
                    Ok(v) => v,
                    Err(_) => continue,
                };
                if upper.contains("GB") {
                    signal.bytes_scanned += (value * 1024.0 * 1024.0 * 1024.0) as u64;
                } else if upper.contains("MB") {
                    signal.bytes_scanned += (value * 1024.0 * 1024.0) as u64;
                } else if upper.contains("KB") {
                    signal.bytes_scanned += (value * 1024.0) as u64;
                }
            }
        }

        if upper.contains("PARTITION") && upper.contains("PRUN") {
            signal.partition_pruning = true;
        }

        if upper.contains("TABLE SCAN") || upper.contains("TABLESCAN") || upper.contains("FULL SCAN")
        {
            signal.full_table_scan = true;
        }

        for cap in PARTITIONS_RE.captures_iter(&upper) {
            if let Ok(n) = cap[1].parse::<u64>() {
                signal.partitions_scanned += n;
            }
        }
    }

    signal
}
