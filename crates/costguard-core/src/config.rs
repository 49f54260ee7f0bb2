//! Estimator configuration that downstream crates can serialize/deserialize.
//!
//! Precedence, lowest to highest: built-in defaults, the project file
//! (`.costguard.yml`), environment variables, then whatever flags the CLI
//! applies on top.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::warehouse::WarehouseSize;

/// Project configuration file name, looked up in the project directory.
pub const CONFIG_FILE_NAME: &str = ".costguard.yml";

/// A per-pattern warning threshold. The first matching pattern wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOverride {
    /// Wildcard pattern over job names (`*` and `?`).
    pub pattern: String,
    /// Warning threshold in currency units for matching jobs.
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Price of one warehouse credit in currency units.
    pub cost_per_credit: f64,

    /// Per-job warning threshold in currency units (overridable per pattern).
    pub warning_threshold_per_job: f64,

    /// Warning threshold for the whole batch in currency units.
    pub warning_threshold_total_run: f64,

    /// Complexity score above which a job is flagged as an expensive pattern.
    pub complexity_warning_threshold: u8,

    /// Size assumed when no live size lookup is available or it fails.
    pub warehouse_size: WarehouseSize,

    /// Explicit credit rate. When set it takes precedence over the size table.
    pub warehouse_credits_per_hour: Option<f64>,

    /// Lookback window for historical run statistics, in days.
    pub history_days: u32,

    /// Consult plan providers (layer 1) when estimating time.
    pub use_plan_estimates: bool,

    /// Consult history providers (layer 2) when estimating time.
    pub use_history: bool,

    /// Look up cache-hit probability before pricing.
    pub use_cache_detection: bool,

    /// Wildcard patterns for jobs that are never estimated.
    pub skip_jobs: Vec<String>,

    /// Per-pattern warning thresholds, checked in order.
    pub job_overrides: Vec<JobOverride>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            cost_per_credit: 3.0,
            warning_threshold_per_job: 5.0,
            warning_threshold_total_run: 5.0,
            complexity_warning_threshold: 60,
            warehouse_size: WarehouseSize::Medium,
            warehouse_credits_per_hour: None,
            history_days: 30,
            use_plan_estimates: true,
            use_history: true,
            use_cache_detection: true,
            skip_jobs: Vec::new(),
            job_overrides: Vec::new(),
        }
    }
}

/// On-disk shape of `.costguard.yml`. Every key is optional; absent keys keep
/// whatever the config already holds.
#[derive(Debug, Default, Deserialize)]
struct GuardConfigFile {
    #[serde(default)]
    cost_per_credit: Option<f64>,
    #[serde(default)]
    warehouse_size: Option<WarehouseSize>,
    #[serde(default)]
    warehouse_credits_per_hour: Option<f64>,
    #[serde(default)]
    complexity_warning_threshold: Option<u8>,
    #[serde(default)]
    thresholds: ThresholdsFile,
    #[serde(default)]
    estimation: EstimationFile,
    #[serde(default)]
    job_overrides: Vec<JobOverride>,
    #[serde(default)]
    skip_jobs: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ThresholdsFile {
    #[serde(default)]
    per_job_warning: Option<f64>,
    #[serde(default)]
    total_run_warning: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct EstimationFile {
    #[serde(default)]
    use_plan_estimates: Option<bool>,
    #[serde(default)]
    use_history: Option<bool>,
    #[serde(default)]
    use_cache_detection: Option<bool>,
    #[serde(default)]
    history_days: Option<u32>,
}

impl GuardConfig {
    /// Parse a YAML document and merge it over the defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let file: GuardConfigFile = serde_yaml::from_str(text)?;
        let mut cfg = Self::default();
        cfg.merge_file(file);
        Ok(cfg)
    }

    /// Load a config file from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_yaml_str(&text)
    }

    /// Look for `.costguard.yml` in the project directory; defaults when absent.
    pub fn discover(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `COSTGUARD_COST_PER_CREDIT`: credit price in currency units
    /// - `COSTGUARD_WAREHOUSE_SIZE`: assumed warehouse size label
    /// - `COSTGUARD_CREDITS_PER_HOUR`: explicit credit rate override
    /// - `COSTGUARD_PER_JOB_THRESHOLD`: per-job warning threshold
    /// - `COSTGUARD_TOTAL_THRESHOLD`: total-run warning threshold
    /// - `COSTGUARD_COMPLEXITY_THRESHOLD`: expensive-pattern score threshold
    /// - `COSTGUARD_HISTORY_DAYS`: history lookback window in days
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    /// Apply environment variable overrides on top of the current values.
    pub fn apply_env(&mut self) {
        if let Ok(s) = std::env::var("COSTGUARD_COST_PER_CREDIT") {
            if let Ok(v) = s.parse::<f64>() {
                self.cost_per_credit = v;
            }
        }

        if let Ok(s) = std::env::var("COSTGUARD_WAREHOUSE_SIZE") {
            if let Some(v) = WarehouseSize::parse(&s) {
                self.warehouse_size = v;
            }
        }

        if let Ok(s) = std::env::var("COSTGUARD_CREDITS_PER_HOUR") {
            if let Ok(v) = s.parse::<f64>() {
                self.warehouse_credits_per_hour = Some(v);
            }
        }

        if let Ok(s) = std::env::var("COSTGUARD_PER_JOB_THRESHOLD") {
            if let Ok(v) = s.parse::<f64>() {
                self.warning_threshold_per_job = v;
            }
        }

        if let Ok(s) = std::env::var("COSTGUARD_TOTAL_THRESHOLD") {
            if let Ok(v) = s.parse::<f64>() {
                self.warning_threshold_total_run = v;
            }
        }

        if let Ok(s) = std::env::var("COSTGUARD_COMPLEXITY_THRESHOLD") {
            if let Ok(v) = s.parse::<u8>() {
                self.complexity_warning_threshold = v;
            }
        }

        if let Ok(s) = std::env::var("COSTGUARD_HISTORY_DAYS") {
            if let Ok(v) = s.parse::<u32>() {
                self.history_days = v;
            }
        }
    }

    fn merge_file(&mut self, file: GuardConfigFile) {
        if let Some(v) = file.cost_per_credit {
            self.cost_per_credit = v;
        }
        if let Some(v) = file.warehouse_size {
            self.warehouse_size = v;
        }
        if let Some(v) = file.warehouse_credits_per_hour {
            self.warehouse_credits_per_hour = Some(v);
        }
        if let Some(v) = file.complexity_warning_threshold {
            self.complexity_warning_threshold = v;
        }
        if let Some(v) = file.thresholds.per_job_warning {
            self.warning_threshold_per_job = v;
        }
        if let Some(v) = file.thresholds.total_run_warning {
            self.warning_threshold_total_run = v;
        }
        if let Some(v) = file.estimation.use_plan_estimates {
            self.use_plan_estimates = v;
        }
        if let Some(v) = file.estimation.use_history {
            self.use_history = v;
        }
        if let Some(v) = file.estimation.use_cache_detection {
            self.use_cache_detection = v;
        }
        if let Some(v) = file.estimation.history_days {
            self.history_days = v;
        }
        if !file.job_overrides.is_empty() {
            self.job_overrides = file.job_overrides;
        }
        if !file.skip_jobs.is_empty() {
            self.skip_jobs = file.skip_jobs;
        }
    }

    /// Reject configs that cannot produce a meaningful estimate.
    pub fn validate(&self) -> Result<()> {
        if !self.cost_per_credit.is_finite() || self.cost_per_credit < 0.0 {
            return Err(Error::Config(format!(
                "cost_per_credit must be finite and non-negative, got {}",
                self.cost_per_credit
            )));
        }
        if let Some(rate) = self.warehouse_credits_per_hour {
            if !rate.is_finite() || rate < 0.0 {
                return Err(Error::Config(format!(
                    "warehouse_credits_per_hour must be finite and non-negative, got {rate}"
                )));
            }
        }
        for (label, value) in [
            ("per-job", self.warning_threshold_per_job),
            ("total-run", self.warning_threshold_total_run),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "{label} warning threshold must be finite and non-negative, got {value}"
                )));
            }
        }
        if self.history_days == 0 {
            return Err(Error::Config("history_days must be at least 1".into()));
        }
        for ov in &self.job_overrides {
            if ov.pattern.is_empty() {
                return Err(Error::Config("job override with empty pattern".into()));
            }
            if !ov.threshold.is_finite() || ov.threshold < 0.0 {
                return Err(Error::Config(format!(
                    "override threshold for '{}' must be finite and non-negative, got {}",
                    ov.pattern, ov.threshold
                )));
            }
        }
        if self.skip_jobs.iter().any(|p| p.is_empty()) {
            return Err(Error::Config("empty skip pattern".into()));
        }
        Ok(())
    }

    /// Warning threshold for one job: first matching override, else the default.
    pub fn threshold_for(&self, job_name: &str) -> f64 {
        for ov in &self.job_overrides {
            if wildcard_match(&ov.pattern, job_name) {
                return ov.threshold;
            }
        }
        self.warning_threshold_per_job
    }

    /// Whether a job name matches any configured skip pattern.
    pub fn should_skip(&self, job_name: &str) -> bool {
        self.skip_jobs.iter().any(|p| wildcard_match(p, job_name))
    }
}

/// Shell-style wildcard match: `*` spans any run, `?` a single character.
/// Everything else is literal.
pub fn wildcard_match(pattern: &str, candidate: &str) -> bool {
    let mut re = String::with_capacity(pattern.len() + 2);
    re.push('^');
    let mut buf = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            _ => re.push_str(&regex::escape(ch.encode_utf8(&mut buf))),
        }
    }
    re.push('$');
    match regex::Regex::new(&re) {
        Ok(rx) => rx.is_match(candidate),
        // The escaped pattern always compiles; equality is the safe fallback.
        Err(_) => pattern == candidate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = GuardConfig::default();
        assert_eq!(cfg.cost_per_credit, 3.0);
        assert_eq!(cfg.warning_threshold_per_job, 5.0);
        assert_eq!(cfg.complexity_warning_threshold, 60);
        assert_eq!(cfg.warehouse_size, WarehouseSize::Medium);
        assert_eq!(cfg.history_days, 30);
        assert!(cfg.use_plan_estimates && cfg.use_history && cfg.use_cache_detection);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn yaml_overrides_defaults() {
        let cfg = GuardConfig::from_yaml_str(
            r#"
cost_per_credit: 4.5
warehouse_size: LARGE
thresholds:
  per_job_warning: 10.0
  total_run_warning: 50.0
estimation:
  use_history: false
  history_days: 7
"#,
        )
        .unwrap();
        assert_eq!(cfg.cost_per_credit, 4.5);
        assert_eq!(cfg.warehouse_size, WarehouseSize::Large);
        assert_eq!(cfg.warning_threshold_per_job, 10.0);
        assert_eq!(cfg.warning_threshold_total_run, 50.0);
        assert!(!cfg.use_history);
        assert!(cfg.use_plan_estimates);
        assert_eq!(cfg.history_days, 7);
        // Keys the file does not mention keep their defaults.
        assert_eq!(cfg.complexity_warning_threshold, 60);
    }

    #[test]
    fn empty_yaml_is_all_defaults() {
        let cfg = GuardConfig::from_yaml_str("").unwrap();
        assert_eq!(cfg.cost_per_credit, GuardConfig::default().cost_per_credit);
    }

    #[test]
    fn override_patterns_first_match_wins() {
        let cfg = GuardConfig::from_yaml_str(
            r#"
job_overrides:
  - pattern: fct_orders
    threshold: 1.0
  - pattern: "fct_*"
    threshold: 20.0
"#,
        )
        .unwrap();
        assert_eq!(cfg.threshold_for("fct_orders"), 1.0);
        assert_eq!(cfg.threshold_for("fct_revenue"), 20.0);
        assert_eq!(cfg.threshold_for("stg_users"), 5.0);
    }

    #[test]
    fn skip_patterns() {
        let cfg = GuardConfig::from_yaml_str(
            r#"
skip_jobs:
  - "tmp_*"
  - scratch
"#,
        )
        .unwrap();
        assert!(cfg.should_skip("tmp_backfill"));
        assert!(cfg.should_skip("scratch"));
        assert!(!cfg.should_skip("fct_orders"));
    }

    #[test]
    fn wildcard_semantics() {
        assert!(wildcard_match("*", "anything"));
        assert!(wildcard_match("stg_*", "stg_users"));
        assert!(!wildcard_match("stg_*", "fct_stg"));
        assert!(wildcard_match("a?c", "abc"));
        assert!(!wildcard_match("a?c", "abbc"));
        // Regex metacharacters in the pattern are literal.
        assert!(wildcard_match("a.b", "a.b"));
        assert!(!wildcard_match("a.b", "axb"));
    }

    #[test]
    fn validate_rejects_bad_rates() {
        let mut cfg = GuardConfig {
            cost_per_credit: -1.0,
            ..GuardConfig::default()
        };
        assert!(cfg.validate().is_err());

        cfg.cost_per_credit = f64::NAN;
        assert!(cfg.validate().is_err());

        cfg.cost_per_credit = 3.0;
        cfg.history_days = 0;
        assert!(cfg.validate().is_err());

        cfg.history_days = 30;
        cfg.job_overrides = vec![JobOverride {
            pattern: "fct_*".into(),
            threshold: f64::INFINITY,
        }];
        assert!(cfg.validate().is_err());
    }
}
