//! End-to-end estimation scenarios against the engine.

use costguard_core::config::GuardConfig;
use costguard_core::estimate::EstimateSource;
use costguard_core::job::{DependencyRef, JobDescriptor};
use costguard_core::signal::{HistorySignal, TableStats};
use costguard_core::warehouse::WarehouseSize;
use costguard_engine::{
    billable_seconds, cache_multiplier, complexity_score, Engine, SignalProviders, SqlText,
};
use costguard_warehouse::scripted::ScriptedWarehouse;
use std::sync::Arc;

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}

fn offline_engine() -> Engine {
    Engine::offline(GuardConfig::default(), "TRANSFORM_WH").expect("default config is valid")
}

fn scripted_engine(warehouse: ScriptedWarehouse) -> Engine {
    Engine::new(
        GuardConfig::default(),
        "TRANSFORM_WH",
        SignalProviders::scripted(Arc::new(warehouse)),
    )
    .expect("default config is valid")
}

/// A job that reads one physical source table, so the heuristic layer can
/// resolve catalog stats for it.
fn job_with_source(name: &str, sql: &str) -> JobDescriptor {
    JobDescriptor {
        database: "ANALYTICS".into(),
        depends_on: vec![DependencyRef::Source {
            schema: "RAW".into(),
            table: "EVENTS".into(),
        }],
        ..JobDescriptor::new(name, sql)
    }
}

#[test]
fn test_complexity_score_bounded_for_any_statement() {
    let statements = [
        "",
        "SELECT 1",
        "SELECT * FROM users",
        "not sql at all ???",
        "WITH a AS (SELECT DISTINCT COUNT(*), SUM(x), AVG(y), MAX(z), MIN(w) \
         FROM t1 JOIN t2 ON 1=1 JOIN t3 ON 1=1 JOIN t4 ON 1=1 JOIN t5 ON 1=1 GROUP BY g) \
         SELECT RANK() OVER (ORDER BY 1), RANK() OVER (ORDER BY 2), RANK() OVER (ORDER BY 3), \
         RANK() OVER (ORDER BY 4) FROM (SELECT * FROM (SELECT * FROM (SELECT * FROM \
         (SELECT * FROM a) q1) q2) q3) q4 ORDER BY 1",
    ];
    for sql in statements {
        let score = complexity_score(&SqlText::new(sql));
        assert!(score <= 100, "score {} out of range for {:?}", score, sql);
    }
}

#[test]
fn test_branchier_sql_never_scores_lower() {
    let plain = complexity_score(&SqlText::new("SELECT * FROM t"));
    let joined = complexity_score(&SqlText::new("SELECT * FROM t JOIN u ON t.id = u.id"));
    let grouped = complexity_score(&SqlText::new(
        "SELECT COUNT(*) FROM t JOIN u ON t.id = u.id GROUP BY t.x",
    ));
    assert!(plain <= joined);
    assert!(joined <= grouped);
}

#[test]
fn test_billing_quantization_examples() {
    assert_eq!(billable_seconds(5.0), 60);
    assert_eq!(billable_seconds(65.0), 120);
    assert_eq!(billable_seconds(120.0), 120);
}

#[test]
fn test_billing_quantization_is_monotonic_and_idempotent() {
    let mut previous = 0;
    for raw in [0.0, 0.5, 30.0, 59.999, 60.0, 60.001, 119.0, 3600.0] {
        let billed = billable_seconds(raw);
        assert!(billed >= previous);
        assert_eq!(billed % 60, 0);
        assert_eq!(billable_seconds(billed as f64), billed);
        previous = billed;
    }
}

#[test]
fn test_cache_discount_breakpoints_are_strict() {
    assert_eq!(cache_multiplier(0.81), 0.0);
    assert_eq!(cache_multiplier(0.8), 0.1);
    assert_eq!(cache_multiplier(0.51), 0.1);
    assert_eq!(cache_multiplier(0.5), 1.0);
    assert_eq!(cache_multiplier(0.0), 1.0);
}

#[test]
fn test_simple_select_on_medium_costs_twenty_cents() {
    let est = offline_engine().estimate_job(&JobDescriptor::new("users", "SELECT * FROM users"));
    assert_eq!(est.complexity_score, 10);
    assert!(close(est.estimated_time_seconds, 5.0 / 3.0));
    assert_eq!(est.billable_time_seconds, 60);
    assert_eq!(est.warehouse_size, WarehouseSize::Medium);
    assert!(close(est.estimated_cost, 0.20));
    assert_eq!(est.source, Some(EstimateSource::Heuristic));
}

#[test]
fn test_three_joins_with_group_by_scenario() {
    let sql = "SELECT a.x FROM a \
               JOIN b ON a.id = b.id \
               JOIN c ON a.id = c.id \
               JOIN d ON a.id = d.id \
               GROUP BY a.x";
    let est = offline_engine().estimate_job(&JobDescriptor::new("wide", sql));
    assert_eq!(est.complexity_score, 45);
    assert!(close(est.estimated_time_seconds, 7.5));
    assert_eq!(est.billable_time_seconds, 60);
    assert!(close(est.estimated_cost, 0.20));
}

#[test]
fn test_cartesian_product_dominates_with_table_stats() {
    let mut warehouse = ScriptedWarehouse::empty();
    warehouse.add_table(
        "ANALYTICS.RAW.EVENTS",
        TableStats {
            row_count: 100_000,
            bytes: 0,
        },
    );
    let engine = scripted_engine(warehouse);

    let plain = engine.estimate_job(&job_with_source(
        "plain",
        "SELECT * FROM analytics.raw.events a JOIN dims d ON a.id = d.id",
    ));
    let cross = engine.estimate_job(&job_with_source(
        "cross",
        "SELECT * FROM analytics.raw.events a CROSS JOIN dims d",
    ));

    assert!(cross.estimated_time_seconds >= 50.0 * plain.estimated_time_seconds);
    assert!(cross.expensive_pattern);
}

#[test]
fn test_trusted_history_overrides_heuristics() {
    let mut warehouse = ScriptedWarehouse::empty();
    warehouse.add_history(
        "daily_orders",
        HistorySignal {
            avg_seconds: 45.0,
            median_seconds: 40.0,
            min_seconds: 30.0,
            max_seconds: 80.0,
            avg_bytes_scanned: 0.0,
            run_count: 10,
        },
    );
    let engine = scripted_engine(warehouse);

    let est = engine.estimate_job(&JobDescriptor::new(
        "daily_orders",
        "SELECT * FROM orders JOIN users ON orders.user_id = users.id GROUP BY 1",
    ));
    assert_eq!(est.source, Some(EstimateSource::History));
    assert!(close(est.estimated_time_seconds, 40.0));
    assert_eq!(est.billable_time_seconds, 60);
}

#[test]
fn test_high_cache_probability_makes_run_free() {
    let sql = "SELECT * FROM dashboard_summary";
    let mut warehouse = ScriptedWarehouse::empty();
    warehouse.add_cache_runs(sql, 3);
    let engine = scripted_engine(warehouse);

    let est = engine.estimate_job(&JobDescriptor::new("dash", sql));
    assert!(close(est.cache_hit_probability, 0.9));
    assert_eq!(est.estimated_cost, 0.0);
    // The discount applies to cost, never to time.
    assert_eq!(est.billable_time_seconds, 60);
    assert!(est.scaled_cost > 0.0);
}

#[test]
fn test_moderate_cache_probability_discounts_to_a_tenth() {
    let sql = "SELECT * FROM weekly_summary";
    let mut warehouse = ScriptedWarehouse::empty();
    warehouse.add_cache_runs(sql, 2);
    let engine = scripted_engine(warehouse);

    let est = engine.estimate_job(&JobDescriptor::new("weekly", sql));
    assert!(close(est.cache_hit_probability, 0.7));
    assert!(close(est.estimated_cost, 0.02));
}

#[test]
fn test_estimation_toggles_disable_layers() {
    let mut warehouse = ScriptedWarehouse::empty();
    warehouse.add_history(
        "job_a",
        HistorySignal {
            median_seconds: 600.0,
            run_count: 10,
            ..HistorySignal::default()
        },
    );
    let cfg = GuardConfig {
        use_history: false,
        ..GuardConfig::default()
    };
    let engine = Engine::new(
        cfg,
        "TRANSFORM_WH",
        SignalProviders::scripted(Arc::new(warehouse)),
    )
    .expect("config is valid");

    let est = engine.estimate_job(&JobDescriptor::new("job_a", "SELECT * FROM t"));
    // History is present but disabled; the heuristic floor wins.
    assert_eq!(est.source, Some(EstimateSource::Heuristic));
    assert!(est.estimated_time_seconds < 600.0);
}

#[test]
fn test_skipped_jobs_are_zero_valued_in_reports() {
    let cfg = GuardConfig {
        skip_jobs: vec!["tmp_*".into()],
        ..GuardConfig::default()
    };
    let engine = Engine::offline(cfg, "WH").expect("config is valid");
    let jobs = vec![
        JobDescriptor::new("tmp_scratch", "SELECT * FROM a CROSS JOIN b"),
        JobDescriptor::new("real_job", "SELECT * FROM users"),
    ];
    let report = engine.estimate_batch(&jobs);

    assert_eq!(report.estimates.len(), 2);
    assert!(report.estimates[0].skipped);
    assert_eq!(report.estimates[0].billable_time_seconds, 0);
    assert!(!report.estimates[1].skipped);
    assert!(close(report.total_cost, report.estimates[1].estimated_cost));
    assert_eq!(report.estimated().count(), 1);
}

#[test]
fn test_larger_warehouse_costs_proportionally_more() {
    let mut small_cfg = GuardConfig::default();
    small_cfg.warehouse_size = WarehouseSize::XSmall;
    let mut large_cfg = GuardConfig::default();
    large_cfg.warehouse_size = WarehouseSize::XLarge;

    let job = JobDescriptor::new("users", "SELECT * FROM users");
    let small = Engine::offline(small_cfg, "WH").expect("valid").estimate_job(&job);
    let large = Engine::offline(large_cfg, "WH").expect("valid").estimate_job(&job);

    // 1 credit/hour vs 16 credits/hour over the same billable minute.
    assert!(close(large.estimated_cost, 16.0 * small.estimated_cost));
}
