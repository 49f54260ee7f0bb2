//! Manifest in, report out: the full offline pipeline.

use costguard_core::config::GuardConfig;
use costguard_core::manifest::jobs_from_manifest_str;
use costguard_engine::Engine;

const MANIFEST: &str = r#"{
    "nodes": {
        "model.analytics.stg_users": {
            "resource_type": "model",
            "name": "stg_users",
            "database": "analytics",
            "schema": "staging",
            "compiled_sql": "SELECT * FROM raw.users",
            "depends_on": {"nodes": ["source.analytics.raw.users"]}
        },
        "model.analytics.stg_orders": {
            "resource_type": "model",
            "name": "stg_orders",
            "database": "analytics",
            "schema": "staging",
            "compiled_sql": "SELECT * FROM raw.orders WHERE status != 'void'"
        },
        "model.analytics.fct_revenue": {
            "resource_type": "model",
            "name": "fct_revenue",
            "database": "analytics",
            "schema": "marts",
            "compiled_sql": "SELECT user_id, SUM(amount) FROM stg_orders o JOIN stg_users u ON o.user_id = u.id GROUP BY user_id",
            "depends_on": {"nodes": ["model.analytics.stg_orders", "model.analytics.stg_users"]}
        },
        "model.analytics.tmp_backfill": {
            "resource_type": "model",
            "name": "tmp_backfill",
            "database": "analytics",
            "schema": "scratch",
            "compiled_sql": "SELECT * FROM raw.orders CROSS JOIN raw.users",
            "config": {"meta": {"costguard_skip": true}}
        },
        "test.analytics.not_null_users_id": {
            "resource_type": "test",
            "name": "not_null_users_id"
        }
    }
}"#;

#[test]
fn test_manifest_to_report_offline() {
    let jobs = jobs_from_manifest_str(MANIFEST).expect("manifest parses");
    assert_eq!(jobs.len(), 4);

    let engine = Engine::offline(GuardConfig::default(), "TRANSFORM_WH").expect("valid config");
    let report = engine.estimate_batch(&jobs);

    assert_eq!(report.estimates.len(), 4);
    assert_eq!(report.warehouse, "TRANSFORM_WH");
    assert!(report.finished_ms >= report.started_ms);

    // Sorted by name, so the report order is stable across runs.
    let names: Vec<&str> = report.estimates.iter().map(|e| e.job.as_str()).collect();
    assert_eq!(
        names,
        vec!["fct_revenue", "stg_orders", "stg_users", "tmp_backfill"]
    );

    // The backfill opted out in the manifest; everything else is estimated.
    let skipped: Vec<&str> = report
        .estimates
        .iter()
        .filter(|e| e.skipped)
        .map(|e| e.job.as_str())
        .collect();
    assert_eq!(skipped, vec!["tmp_backfill"]);

    let sum: f64 = report
        .estimated()
        .map(|e| e.estimated_cost)
        .sum();
    assert!((report.total_cost - sum).abs() < 1e-9);
    assert!(report.total_cost > 0.0);

    for est in report.estimated() {
        assert!(est.estimated_time_seconds >= 1.0);
        assert_eq!(est.billable_time_seconds % 60, 0);
        assert!(est.billable_time_seconds >= 60);
        assert!(est.complexity_score >= 5);
    }

    // The revenue mart carries joins and an aggregate; it must not score
    // below the plain staging selects.
    let revenue = &report.estimates[0];
    let staging = &report.estimates[2];
    assert!(revenue.complexity_score > staging.complexity_score);
}

#[test]
fn test_report_json_round_trips() {
    let jobs = jobs_from_manifest_str(MANIFEST).expect("manifest parses");
    let engine = Engine::offline(GuardConfig::default(), "WH").expect("valid config");
    let report = engine.estimate_batch(&jobs);

    let json = serde_json::to_string_pretty(&report).expect("report serializes");
    let value: serde_json::Value = serde_json::from_str(&json).expect("round trip");

    assert!(value["id"].is_string());
    assert_eq!(value["warehouse"], "WH");
    assert_eq!(value["estimates"].as_array().map(Vec::len), Some(4));
    assert_eq!(value["estimates"][0]["source"], "heuristic");
    assert!(value["estimates"][0]["estimated_cost"].is_number());
    assert_eq!(value["engine_version"], costguard_core::VERSION);
}
