//! Warehouse signals consumed by the time estimator.
//!
//! Three independent signal families, in decreasing order of trust: plan
//! output (`PlanSignal`), run history (`HistorySignal`), and raw table stats
//! (`TableStats`). Providers return whichever they can; the estimator falls
//! through to the next family when a signal is missing or uninformative.

use serde::{Deserialize, Serialize};

/// Facts scraped from a query plan before execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSignal {
    /// Bytes the plan expects to scan.
    pub bytes_scanned: u64,
    /// Micro-partitions the plan expects to touch.
    pub partitions_scanned: u64,
    /// Whether the plan reports partition pruning.
    pub partition_pruning: bool,
    /// Whether the plan contains a full table scan.
    pub full_table_scan: bool,
}

impl PlanSignal {
    /// A plan that scans zero bytes tells us nothing; fall through.
    pub fn is_informative(&self) -> bool {
        self.bytes_scanned > 0
    }
}

/// Aggregated execution history for one job over a lookback window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySignal {
    /// Mean wall-clock seconds across recorded runs.
    pub avg_seconds: f64,
    /// Median wall-clock seconds across recorded runs.
    pub median_seconds: f64,
    /// Fastest recorded run, seconds.
    pub min_seconds: f64,
    /// Slowest recorded run, seconds.
    pub max_seconds: f64,
    /// Mean bytes scanned per run.
    pub avg_bytes_scanned: f64,
    /// Number of runs inside the window.
    pub run_count: u32,
}

impl HistorySignal {
    pub fn has_runs(&self) -> bool {
        self.run_count > 0
    }
}

/// Catalog statistics for one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    /// Rows in the table.
    pub row_count: u64,
    /// On-disk bytes.
    pub bytes: u64,
}

impl TableStats {
    /// Sum two stat records (used to total a job's source tables).
    pub fn combine(self, other: TableStats) -> TableStats {
        TableStats {
            row_count: self.row_count + other.row_count,
            bytes: self.bytes + other.bytes,
        }
    }
}

/// A fully qualified table reference, uppercased for stable lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub database: String,
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(database: &str, schema: &str, table: &str) -> Self {
        Self {
            database: database.to_uppercase(),
            schema: schema.to_uppercase(),
            table: table.to_uppercase(),
        }
    }

    /// Parse `db.schema.table`, `schema.table`, or a bare name, filling the
    /// missing parts from the defaults. Anything with more dots than a
    /// three-part name is treated as a bare name.
    pub fn parse(text: &str, default_database: &str, default_schema: &str) -> Self {
        let parts: Vec<&str> = text.split('.').collect();
        match parts.as_slice() {
            [db, schema, table] => Self::new(db, schema, table),
            [schema, table] => Self::new(default_database, schema, table),
            _ => Self::new(default_database, default_schema, text),
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}.{}", self.database, self.schema, self.table)
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.database, self.schema, self.table)
    }
}
