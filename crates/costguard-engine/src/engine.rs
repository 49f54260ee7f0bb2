//! The estimation engine: complexity, time, billing, and discount composed
//! into per-job estimates and batch reports.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use costguard_core::config::GuardConfig;
use costguard_core::error::Result;
use costguard_core::estimate::{CostEstimate, RunReport};
use costguard_core::job::JobDescriptor;
use costguard_core::warehouse::WarehouseSize;
use costguard_warehouse::scripted::ScriptedWarehouse;
use costguard_warehouse::traits::{
    CacheProbabilityProvider, HistoryProvider, PlanProvider, TableStatsProvider,
    WarehouseSizeProvider,
};

use crate::billing::billable_seconds;
use crate::complexity::complexity_score;
use crate::discount::cache_multiplier;
use crate::sql::SqlText;
use crate::time::estimate_seconds;

/// Optional signal providers, one per family. Missing providers simply push
/// estimation down to the heuristic layer and the configured defaults.
#[derive(Default, Clone)]
pub struct SignalProviders {
    pub plan: Option<Arc<dyn PlanProvider>>,
    pub history: Option<Arc<dyn HistoryProvider>>,
    pub tables: Option<Arc<dyn TableStatsProvider>>,
    pub cache: Option<Arc<dyn CacheProbabilityProvider>>,
    pub warehouse: Option<Arc<dyn WarehouseSizeProvider>>,
}

impl SignalProviders {
    /// No providers at all; every estimate comes from SQL text and config.
    pub fn offline() -> Self {
        Self::default()
    }

    /// Wire every family to one scripted warehouse.
    pub fn scripted(warehouse: Arc<ScriptedWarehouse>) -> Self {
        Self {
            plan: Some(warehouse.clone()),
            history: Some(warehouse.clone()),
            tables: Some(warehouse.clone()),
            cache: Some(warehouse.clone()),
            warehouse: Some(warehouse),
        }
    }
}

impl std::fmt::Debug for SignalProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalProviders")
            .field("plan", &self.plan.is_some())
            .field("history", &self.history.is_some())
            .field("tables", &self.tables.is_some())
            .field("cache", &self.cache.is_some())
            .field("warehouse", &self.warehouse.is_some())
            .finish()
    }
}

/// Pre-run cost estimator for a batch of SQL transformation jobs.
///
/// Construction validates the configuration; estimation itself never fails.
/// A job that cannot be estimated from live signals still gets a heuristic
/// figure, and a skipped job gets a zero-valued record.
#[derive(Debug)]
pub struct Engine {
    cfg: GuardConfig,
    warehouse: String,
    providers: SignalProviders,
}

impl Engine {
    pub fn new(
        cfg: GuardConfig,
        warehouse: impl Into<String>,
        providers: SignalProviders,
    ) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            warehouse: warehouse.into(),
            providers,
        })
    }

    /// Engine with no live signals; heuristics and config only.
    pub fn offline(cfg: GuardConfig, warehouse: impl Into<String>) -> Result<Self> {
        Self::new(cfg, warehouse, SignalProviders::offline())
    }

    pub fn config(&self) -> &GuardConfig {
        &self.cfg
    }

    pub fn warehouse(&self) -> &str {
        &self.warehouse
    }

    /// Estimate one job. Never fails; signal trouble degrades the estimate
    /// instead of aborting it.
    pub fn estimate_job(&self, job: &JobDescriptor) -> CostEstimate {
        if job.skip || self.cfg.should_skip(&job.name) {
            tracing::debug!(job = %job.name, "excluded from estimation");
            return CostEstimate::skipped(&job.name, self.cfg.warehouse_size);
        }

        let sql = SqlText::new(job.sql_text());
        let score = complexity_score(&sql);
        let cache_hit_probability = self.cache_probability(job, &sql);

        let (raw_seconds, source) = estimate_seconds(job, &sql, score, &self.providers, &self.cfg);

        let warehouse_size = self.resolve_size();
        let credits_per_hour = self
            .cfg
            .warehouse_credits_per_hour
            .unwrap_or_else(|| warehouse_size.credits_per_hour());

        let billable = billable_seconds(raw_seconds);
        let base_cost = billable as f64 / 3600.0 * credits_per_hour * self.cfg.cost_per_credit;
        let estimated_cost = base_cost * cache_multiplier(cache_hit_probability);

        // What-if figure: time inflated by complexity, priced without any
        // cache discount. Diagnostic only.
        let scaled_seconds = raw_seconds * (score as f64 / 20.0).max(1.0);
        let scaled_cost = billable_seconds(scaled_seconds) as f64 / 3600.0
            * credits_per_hour
            * self.cfg.cost_per_credit;

        let expensive_pattern = score > self.cfg.complexity_warning_threshold
            || scaled_cost > 10.0
            || sql.cross_join_count() > 0;

        tracing::debug!(
            job = %job.name,
            score,
            seconds = raw_seconds,
            cost = estimated_cost,
            source = ?source,
            "estimated job"
        );

        CostEstimate {
            job: job.name.clone(),
            estimated_cost,
            estimated_time_seconds: raw_seconds,
            billable_time_seconds: billable,
            complexity_score: score,
            warehouse_size,
            credits_per_hour,
            cache_hit_probability,
            scaled_cost,
            expensive_pattern,
            skipped: false,
            source: Some(source),
        }
    }

    /// Estimate every job in order. One report per batch; individual jobs
    /// never abort the run.
    pub fn estimate_batch(&self, jobs: &[JobDescriptor]) -> RunReport {
        let mut report = RunReport::new(&self.warehouse, now_millis());
        for job in jobs {
            report.record(self.estimate_job(job));
        }
        report.finish(now_millis())
    }

    fn cache_probability(&self, job: &JobDescriptor, sql: &SqlText) -> f64 {
        if !self.cfg.use_cache_detection || sql.is_empty() {
            return 0.0;
        }
        let Some(provider) = &self.providers.cache else {
            return 0.0;
        };
        match provider.cache_probability(job.sql_text()) {
            Ok(p) if p.is_nan() => 0.0,
            Ok(p) => p.clamp(0.0, 1.0),
            Err(err) => {
                tracing::debug!(job = %job.name, %err, "cache probability unavailable");
                0.0
            }
        }
    }

    fn resolve_size(&self) -> WarehouseSize {
        if let Some(provider) = &self.providers.warehouse {
            match provider.current_size(&self.warehouse) {
                Ok(size) => return size,
                Err(err) => {
                    tracing::debug!(warehouse = %self.warehouse, %err, "live size lookup failed");
                }
            }
        }
        self.cfg.warehouse_size
    }
}

// --- helpers ---

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
