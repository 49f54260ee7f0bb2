//! Scripted providers: every signal family served from one YAML document.
//!
//! Offline estimation, CI, and tests feed the engine recorded signals instead
//! of live lookups. Statements are matched by fingerprint, so whitespace and
//! case differences between the script and the manifest SQL do not matter.
//!
//! Document shape:
//!
//! ```yaml
//! warehouses:
//!   TRANSFORM_WH: MEDIUM
//! explains:
//!   - sql: SELECT * FROM raw.users
//!     text: |
//!       TableScan on USERS, estimated size: 100 MB
//! history:
//!   - job: stg_users
//!     median_seconds: 40.0
//!     run_count: 10
//! tables:
//!   - table: ANALYTICS.RAW.USERS
//!     rows: 1000000
//!     bytes: 52428800
//! cache:
//!   - sql: SELECT * FROM raw.users
//!     recent_runs: 3
//! ```

use std::collections::HashMap;
use std::path::Path;

use costguard_core::fingerprint::{fingerprint_sql, SqlFingerprint};
use costguard_core::signal::{HistorySignal, PlanSignal, TableRef, TableStats};
use costguard_core::warehouse::WarehouseSize;
use serde::Deserialize;

use crate::explain::parse_explain_text;
use crate::traits::{
    CacheProbabilityProvider, HistoryProvider, PlanProvider, SignalError, SignalResult,
    TableStatsProvider, WarehouseSizeProvider,
};

/// Map a 24-hour repeat count onto a cache-hit probability tier.
pub fn probability_from_recent_runs(recent_runs: u32) -> f64 {
    match recent_runs {
        0 => 0.0,
        1 => 0.5,
        2 => 0.7,
        _ => 0.9,
    }
}

#[derive(Debug, Default, Deserialize)]
struct ScriptFile {
    #[serde(default)]
    warehouses: HashMap<String, String>,
    #[serde(default)]
    explains: Vec<ExplainEntry>,
    #[serde(default)]
    history: Vec<HistoryEntry>,
    #[serde(default)]
    tables: Vec<TableEntry>,
    #[serde(default)]
    cache: Vec<CacheEntry>,
}

#[derive(Debug, Deserialize)]
struct ExplainEntry {
    sql: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct HistoryEntry {
    job: String,
    #[serde(default)]
    avg_seconds: f64,
    #[serde(default)]
    median_seconds: f64,
    #[serde(default)]
    min_seconds: f64,
    #[serde(default)]
    max_seconds: f64,
    #[serde(default)]
    avg_bytes_scanned: f64,
    run_count: u32,
}

#[derive(Debug, Deserialize)]
struct TableEntry {
    table: String,
    rows: u64,
    bytes: u64,
}

#[derive(Debug, Deserialize)]
struct CacheEntry {
    sql: String,
    recent_runs: u32,
}

/// Implements all five provider traits from in-memory maps.
#[derive(Debug, Default, Clone)]
pub struct ScriptedWarehouse {
    warehouses: HashMap<String, WarehouseSize>,
    plans: HashMap<SqlFingerprint, PlanSignal>,
    history: HashMap<String, HistorySignal>,
    tables: HashMap<String, TableStats>,
    cache_runs: HashMap<SqlFingerprint, u32>,
}

impl ScriptedWarehouse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_yaml(text: &str) -> SignalResult<Self> {
        let file: ScriptFile = serde_yaml::from_str(text)
            .map_err(|e| SignalError::Malformed(format!("bad signals document: {e}")))?;

        let mut this = Self::default();
        for (name, label) in file.warehouses {
            let size = WarehouseSize::parse(&label).ok_or_else(|| {
                SignalError::Malformed(format!("unknown warehouse size '{label}' for '{name}'"))
            })?;
            this.warehouses.insert(name.to_uppercase(), size);
        }
        for entry in file.explains {
            this.add_plan_text(&entry.sql, &entry.text);
        }
        for entry in file.history {
            this.add_history(
                &entry.job,
                HistorySignal {
                    avg_seconds: entry.avg_seconds,
                    median_seconds: entry.median_seconds,
                    min_seconds: entry.min_seconds,
                    max_seconds: entry.max_seconds,
                    avg_bytes_scanned: entry.avg_bytes_scanned,
                    run_count: entry.run_count,
                },
            );
        }
        for entry in file.tables {
            this.add_table(
                &entry.table,
                TableStats {
                    row_count: entry.rows,
                    bytes: entry.bytes,
                },
            );
        }
        for entry in file.cache {
            this.add_cache_runs(&entry.sql, entry.recent_runs);
        }

        tracing::debug!(
            warehouses = this.warehouses.len(),
            plans = this.plans.len(),
            history = this.history.len(),
            tables = this.tables.len(),
            cache = this.cache_runs.len(),
            "scripted warehouse loaded"
        );
        Ok(this)
    }

    pub fn load(path: &Path) -> SignalResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SignalError::Unavailable(format!("cannot read {}: {e}", path.display())))?;
        Self::from_yaml(&text)
    }

    /// Record a plan for a statement (used by tests and incremental setup).
    pub fn add_plan_text(&mut self, sql: &str, explain_text: &str) {
        self.plans
            .insert(fingerprint_sql(sql), parse_explain_text(explain_text));
    }

    pub fn add_history(&mut self, job: &str, signal: HistorySignal) {
        self.history.insert(job.to_string(), signal);
    }

    pub fn add_table(&mut self, qualified_name: &str, stats: TableStats) {
        self.tables.insert(qualified_name.to_uppercase(), stats);
    }

    pub fn add_cache_runs(&mut self, sql: &str, recent_runs: u32) {
        self.cache_runs.insert(fingerprint_sql(sql), recent_runs);
    }

    pub fn add_warehouse(&mut self, name: &str, size: WarehouseSize) {
        self.warehouses.insert(name.to_uppercase(), size);
    }
}

impl PlanProvider for ScriptedWarehouse {
    fn explain(&self, sql: &str) -> SignalResult<Option<PlanSignal>> {
        Ok(self.plans.get(&fingerprint_sql(sql)).copied())
    }
}

impl HistoryProvider for ScriptedWarehouse {
    fn history(&self, job_name: &str, _window_days: u32) -> SignalResult<Option<HistorySignal>> {
        // The script is already windowed; zero-run entries read as no history.
        Ok(self
            .history
            .get(job_name)
            .copied()
            .filter(HistorySignal::has_runs))
    }
}

impl TableStatsProvider for ScriptedWarehouse {
    fn table_stats(&self, refs: &[TableRef]) -> SignalResult<HashMap<String, TableStats>> {
        let mut out = HashMap::new();
        for r in refs {
            let key = r.qualified_name();
            if let Some(stats) = self.tables.get(&key) {
                out.insert(key, *stats);
            }
        }
        Ok(out)
    }
}

impl CacheProbabilityProvider for ScriptedWarehouse {
    fn cache_probability(&self, sql: &str) -> SignalResult<f64> {
        let runs = self
            .cache_runs
            .get(&fingerprint_sql(sql))
            .copied()
            .unwrap_or(0);
        Ok(probability_from_recent_runs(runs))
    }
}

impl WarehouseSizeProvider for ScriptedWarehouse {
    fn current_size(&self, warehouse: &str) -> SignalResult<WarehouseSize> {
        self.warehouses
            .get(&warehouse.to_uppercase())
            .copied()
            .ok_or_else(|| {
                SignalError::Unavailable(format!("no scripted size for warehouse '{warehouse}'"))
            })
    }
}
