//! costguard CLI: estimate warehouse costs for SQL transformation jobs
//! before anything runs.

use clap::{Parser, Subcommand, ValueEnum};
use costguard_core::config::{wildcard_match, GuardConfig};
use costguard_core::estimate::{CostEstimate, RunReport};
use costguard_core::job::{DependencyRef, JobDescriptor};
use costguard_core::manifest::load_manifest;
use costguard_engine::{Engine, SignalProviders, SqlFeatures, SqlText};
use costguard_warehouse::scripted::ScriptedWarehouse;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "costguard")]
#[command(about = "Estimate warehouse costs for SQL transformation jobs before running them", long_about = None)]
struct Cli {
    /// Path to the compiled manifest JSON
    #[arg(long, global = true, default_value = "target/manifest.json")]
    manifest: PathBuf,

    /// Path to a config file (default: discover .costguard.yml in cwd)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Scripted warehouse signals YAML (plans, history, table stats, cache)
    #[arg(long, global = true)]
    signals: Option<PathBuf>,

    /// Warehouse name estimates are priced against
    #[arg(long, global = true, default_value = "COMPUTE_WH")]
    warehouse: String,

    /// Cost per credit in currency units (overrides config)
    #[arg(long, global = true)]
    cost_per_credit: Option<f64>,

    /// Cost threshold in currency units (overrides both config thresholds)
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate costs for every job in the manifest
    Estimate {
        /// Only estimate jobs matching this wildcard pattern
        #[arg(short, long)]
        select: Option<String>,

        /// Exclude jobs matching this wildcard pattern
        #[arg(long)]
        exclude: Option<String>,
    },

    /// Estimate and fail when any cost threshold is breached
    Check {
        /// Only check jobs matching this wildcard pattern
        #[arg(short, long)]
        select: Option<String>,

        /// Exclude jobs matching this wildcard pattern
        #[arg(long)]
        exclude: Option<String>,
    },

    /// Detailed cost and shape analysis for one job
    Analyze {
        /// Job name (exact match preferred, substring fallback)
        #[arg(short, long)]
        job: String,
    },

    /// Show the resolved configuration
    Config,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Estimate { select, exclude } => {
            run_estimate(&cli, select.as_deref(), exclude.as_deref())
        }
        Commands::Check { select, exclude } => {
            run_check(&cli, select.as_deref(), exclude.as_deref())
        }
        Commands::Analyze { job } => run_analyze(&cli, job),
        Commands::Config => run_config(&cli),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_estimate(
    cli: &Cli,
    select: Option<&str>,
    exclude: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = resolve_config(cli)?;
    let jobs = filter_jobs(load_manifest(&cli.manifest)?, select, exclude);
    let engine = build_engine(cli, cfg.clone())?;
    let report = engine.estimate_batch(&jobs);

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            if report.estimates.is_empty() {
                println!("No jobs matched");
                return Ok(());
            }
            print_breakdown(&cfg, &report);
            println!();
            print_projections(report.total_cost);
        }
    }
    Ok(())
}

fn run_check(
    cli: &Cli,
    select: Option<&str>,
    exclude: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = resolve_config(cli)?;
    let jobs = filter_jobs(load_manifest(&cli.manifest)?, select, exclude);
    let engine = build_engine(cli, cfg.clone())?;
    let report = engine.estimate_batch(&jobs);

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            print_breakdown(&cfg, &report);
        }
    }

    let warnings = threshold_warnings(&cfg, &report);
    if !warnings.is_empty() {
        eprintln!();
        for warning in &warnings {
            eprintln!("⚠ {}", warning);
        }
        std::process::exit(1);
    }

    if cli.format == OutputFormat::Text {
        println!();
        println!(
            "✓ Estimated cost (${:.2}) is within thresholds",
            report.total_cost
        );
    }
    Ok(())
}

fn run_analyze(cli: &Cli, job_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = resolve_config(cli)?;
    let jobs = load_manifest(&cli.manifest)?;

    let Some(job) = find_job(&jobs, job_name) else {
        eprintln!("Job '{}' not found", job_name);
        eprintln!("Available jobs:");
        for j in &jobs {
            eprintln!("  - {}", j.name);
        }
        std::process::exit(1);
    };

    let engine = build_engine(cli, cfg.clone())?;
    let estimate = engine.estimate_job(job);
    let features = SqlFeatures::extract(&SqlText::new(job.sql_text()));

    if cli.format == OutputFormat::Json {
        let doc = serde_json::json!({
            "estimate": estimate,
            "features": features,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("Cost Analysis: {}", job.name);
    println!("{}", "=".repeat(15 + job.name.len()));
    println!();

    println!("Job Information");
    println!("  Name:      {}", job.name);
    println!("  Database:  {}", or_na(&job.database));
    println!("  Schema:    {}", or_na(&job.schema));
    println!("  Alias:     {}", job.alias.as_deref().unwrap_or(&job.name));
    println!();

    println!("Cost Breakdown");
    println!("  Estimated Cost:    ${:.2}", estimate.estimated_cost);
    println!(
        "  Estimated Time:    {}",
        format_duration(estimate.estimated_time_seconds)
    );
    println!("  Billable Time:     {}s", estimate.billable_time_seconds);
    println!(
        "  Complexity Score:  {} ({})",
        estimate.complexity_score,
        complexity_label(estimate.complexity_score)
    );
    println!("  Warehouse Size:    {}", estimate.warehouse_size);
    println!("  Credits/Hour:      {}", estimate.credits_per_hour);
    println!("  Cost per Credit:   ${:.2}", cfg.cost_per_credit);
    println!(
        "  Cache Hit Prob.:   {:.0}%",
        estimate.cache_hit_probability * 100.0
    );
    if let Some(source) = &estimate.source {
        println!("  Source:            {:?}", source);
    }
    println!();

    println!("Query Analysis");
    println!("  SQL Length:        {} characters", features.length);
    println!("  JOINs:             {}", features.joins);
    println!("  CROSS JOINs:       {}", features.cross_joins);
    println!("  Window Functions:  {}", features.windows);
    println!("  CTEs (WITH):       {}", features.ctes);
    println!("  Subqueries:        {}", features.subqueries);
    println!("  GROUP BY:          {}", yes_no(features.group_by));
    println!("  DISTINCT:          {}", yes_no(features.distinct));
    println!("  ORDER BYs:         {}", features.order_bys);
    println!();

    if !job.depends_on.is_empty() {
        println!("Dependencies ({})", job.depends_on.len());
        for dep in &job.depends_on {
            match dep {
                DependencyRef::Source { schema, table } => {
                    println!("  - source: {}.{}", schema, table)
                }
                DependencyRef::Model { name } => println!("  - model:  {}", name),
            }
        }
        println!();
    }

    println!("Recommendations");
    let recs = recommendations(&estimate, &features, &cfg);
    if recs.is_empty() {
        println!("  ✓ No optimization issues detected");
    } else {
        for rec in &recs {
            println!("  - {}", rec);
        }
    }

    Ok(())
}

fn run_config(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = resolve_config(cli)?;

    if cli.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    println!("costguard configuration");
    println!();
    println!("  Cost per credit:       ${:.2}", cfg.cost_per_credit);
    println!(
        "  Per-job threshold:     ${:.2}",
        cfg.warning_threshold_per_job
    );
    println!(
        "  Total-run threshold:   ${:.2}",
        cfg.warning_threshold_total_run
    );
    println!(
        "  Complexity threshold:  {}",
        cfg.complexity_warning_threshold
    );
    println!("  Warehouse size:        {}", cfg.warehouse_size);
    match cfg.warehouse_credits_per_hour {
        Some(rate) => println!("  Credits/hour override: {}", rate),
        None => println!("  Credits/hour override: (none)"),
    }
    println!("  History window:        {} days", cfg.history_days);
    println!("  Plan estimates:        {}", cfg.use_plan_estimates);
    println!("  History estimates:     {}", cfg.use_history);
    println!("  Cache detection:       {}", cfg.use_cache_detection);
    if !cfg.skip_jobs.is_empty() {
        println!("  Skip patterns:         {}", cfg.skip_jobs.join(", "));
    }
    for ov in &cfg.job_overrides {
        println!("  Override {}:  ${:.2}", ov.pattern, ov.threshold);
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<GuardConfig, Box<dyn std::error::Error>> {
    let mut cfg = match &cli.config {
        Some(path) => GuardConfig::load(path)?,
        None => GuardConfig::discover(Path::new("."))?,
    };
    cfg.apply_env();
    apply_cli_overrides(&mut cfg, cli.cost_per_credit, cli.threshold);
    tracing::debug!(
        size = %cfg.warehouse_size,
        cost_per_credit = cfg.cost_per_credit,
        "resolved configuration"
    );
    Ok(cfg)
}

fn apply_cli_overrides(cfg: &mut GuardConfig, cost_per_credit: Option<f64>, threshold: Option<f64>) {
    if let Some(v) = cost_per_credit {
        cfg.cost_per_credit = v;
    }
    if let Some(v) = threshold {
        cfg.warning_threshold_per_job = v;
        cfg.warning_threshold_total_run = v;
    }
}

fn build_engine(cli: &Cli, cfg: GuardConfig) -> Result<Engine, Box<dyn std::error::Error>> {
    let providers = match &cli.signals {
        Some(path) => {
            let scripted = ScriptedWarehouse::load(path)?;
            SignalProviders::scripted(Arc::new(scripted))
        }
        None => SignalProviders::offline(),
    };
    Ok(Engine::new(cfg, cli.warehouse.as_str(), providers)?)
}

fn filter_jobs(
    mut jobs: Vec<JobDescriptor>,
    select: Option<&str>,
    exclude: Option<&str>,
) -> Vec<JobDescriptor> {
    if let Some(pattern) = select {
        jobs.retain(|j| wildcard_match(pattern, &j.name));
    }
    if let Some(pattern) = exclude {
        jobs.retain(|j| !wildcard_match(pattern, &j.name));
    }
    jobs
}

fn find_job<'a>(jobs: &'a [JobDescriptor], name: &str) -> Option<&'a JobDescriptor> {
    jobs.iter()
        .find(|j| j.name == name)
        .or_else(|| jobs.iter().find(|j| j.name.contains(name)))
}

fn threshold_warnings(cfg: &GuardConfig, report: &RunReport) -> Vec<String> {
    let mut warnings = Vec::new();

    if report.total_cost > cfg.warning_threshold_total_run {
        warnings.push(format!(
            "Total estimated cost (${:.2}) exceeds threshold (${:.2})",
            report.total_cost, cfg.warning_threshold_total_run
        ));
    }

    let over: Vec<&CostEstimate> = report
        .estimated()
        .filter(|e| e.estimated_cost > cfg.threshold_for(&e.job))
        .collect();
    if !over.is_empty() {
        warnings.push(format!(
            "{} job(s) exceed their per-job threshold",
            over.len()
        ));
    }

    warnings
}

fn print_breakdown(cfg: &GuardConfig, report: &RunReport) {
    println!("Cost Estimate Breakdown");
    println!("=======================");
    println!();
    println!(
        "{:<32} {:>10} {:>10} {:>11} {:>7}",
        "Job", "Est. Cost", "Est. Time", "Complexity", "Status"
    );
    println!("{}", "-".repeat(74));

    for est in &report.estimates {
        if est.skipped {
            println!(
                "{:<32} {:>10} {:>10} {:>11} {:>7}",
                est.job, "-", "-", "-", "skip"
            );
            continue;
        }

        let threshold = cfg.threshold_for(&est.job);
        let status = if est.estimated_cost > threshold {
            "⚠"
        } else if est.expensive_pattern {
            "!"
        } else if est.estimated_cost > threshold * 0.7 {
            "○"
        } else {
            "✓"
        };

        println!(
            "{:<32} {:>10} {:>10} {:>11} {:>7}",
            est.job,
            format!("${:.2}", est.estimated_cost),
            format!("{:.1}s", est.estimated_time_seconds),
            complexity_label(est.complexity_score),
            status
        );
    }

    println!("{}", "-".repeat(74));
    println!(
        "{:<32} {:>10}",
        "TOTAL",
        format!("${:.2}", report.total_cost)
    );
}

/// Projections assume the whole batch runs once per day unless the row
/// says otherwise.
fn print_projections(total_cost: f64) {
    println!("Long-Term Cost Projections");
    println!("==========================");
    println!();
    println!("{:<16} {:>14} {:>18}", "Frequency", "Cost", "Annual");
    println!(
        "{:<16} {:>14} {:>18}",
        "Per Run",
        format!("${:.2}", total_cost),
        "-"
    );
    println!(
        "{:<16} {:>14} {:>18}",
        "Daily (1x)",
        format!("${:.2}", total_cost),
        format!("${:.2}/year", total_cost * 365.0)
    );
    println!(
        "{:<16} {:>14} {:>18}",
        "Twice Daily",
        format!("${:.2}/day", total_cost * 2.0),
        format!("${:.2}/year", total_cost * 2.0 * 365.0)
    );
    println!(
        "{:<16} {:>14} {:>18}",
        "Hourly (24x)",
        format!("${:.2}/day", total_cost * 24.0),
        format!("${:.2}/year", total_cost * 24.0 * 365.0)
    );
    println!(
        "{:<16} {:>14} {:>18}",
        "Weekly",
        format!("${:.2}", total_cost * 7.0),
        format!("${:.2}/year", total_cost * 7.0 * 52.0)
    );
    println!(
        "{:<16} {:>14} {:>18}",
        "Monthly",
        format!("${:.2}", total_cost * 30.0),
        format!("${:.2}/year", total_cost * 30.0 * 12.0)
    );

    if total_cost > 10.0 {
        // Rough size comparison: an X-SMALL burns an eighth of the credits.
        let smaller = total_cost / 8.0;
        let annual_savings = (total_cost - smaller) * 365.0;
        println!();
        println!(
            "Potential annual savings on X-SMALL: ${:.2} (${:.2} → ${:.2} per run)",
            annual_savings, total_cost, smaller
        );
    }
}

fn recommendations(
    estimate: &CostEstimate,
    features: &SqlFeatures,
    cfg: &GuardConfig,
) -> Vec<String> {
    let mut recs = Vec::new();

    if estimate.estimated_cost > cfg.threshold_for(&estimate.job) {
        recs.push("High cost detected. Consider optimizing this job.".to_string());
    }
    if features.cross_joins > 0 {
        recs.push(format!(
            "{} CROSS JOIN(s). Verify the cartesian product is intended.",
            features.cross_joins
        ));
    }
    if features.windows > 10 {
        recs.push(format!(
            "{} window functions. Consider materializing intermediate results.",
            features.windows
        ));
    }
    if features.joins > 5 {
        recs.push(format!(
            "{} joins. Verify every join is necessary.",
            features.joins
        ));
    }
    if estimate.complexity_score > 80 {
        recs.push("Very complex query. Consider splitting it into smaller jobs.".to_string());
    }
    if estimate.estimated_time_seconds > 3600.0 {
        recs.push("Estimated runtime over an hour. Consider incremental builds.".to_string());
    }

    recs
}

fn complexity_label(score: u8) -> &'static str {
    if score > 80 {
        "High"
    } else if score > 50 {
        "Med"
    } else {
        "Low"
    }
}

fn format_duration(seconds: f64) -> String {
    if seconds >= 3600.0 {
        format!("{:.1} hours", seconds / 3600.0)
    } else if seconds >= 60.0 {
        format!("{:.1} minutes", seconds / 60.0)
    } else {
        format!("{:.1} seconds", seconds)
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use costguard_core::warehouse::WarehouseSize;

    fn job(name: &str) -> JobDescriptor {
        JobDescriptor::new(name, "SELECT 1")
    }

    #[test]
    fn cli_overrides_take_precedence() {
        let mut cfg = GuardConfig::default();
        apply_cli_overrides(&mut cfg, Some(5.0), Some(2.5));
        assert_eq!(cfg.cost_per_credit, 5.0);
        assert_eq!(cfg.warning_threshold_per_job, 2.5);
        assert_eq!(cfg.warning_threshold_total_run, 2.5);

        // Absent flags leave the config untouched.
        apply_cli_overrides(&mut cfg, None, None);
        assert_eq!(cfg.cost_per_credit, 5.0);
    }

    #[test]
    fn filter_jobs_applies_select_then_exclude() {
        let jobs = vec![job("stg_orders"), job("stg_users"), job("fct_revenue")];
        let kept = filter_jobs(jobs.clone(), Some("stg_*"), None);
        assert_eq!(kept.len(), 2);

        let kept = filter_jobs(jobs.clone(), Some("stg_*"), Some("*users"));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "stg_orders");

        let kept = filter_jobs(jobs, None, None);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn find_job_prefers_exact_match() {
        let jobs = vec![job("orders_daily"), job("orders")];
        assert_eq!(find_job(&jobs, "orders").unwrap().name, "orders");
        assert_eq!(find_job(&jobs, "daily").unwrap().name, "orders_daily");
        assert!(find_job(&jobs, "missing").is_none());
    }

    #[test]
    fn threshold_warnings_cover_total_and_per_job() {
        let cfg = GuardConfig::default();
        let mut report = RunReport::new("WH", 0);
        let mut est = CostEstimate::skipped("cheap", WarehouseSize::Medium);
        est.skipped = false;
        est.estimated_cost = 1.0;
        report.record(est.clone());
        assert!(threshold_warnings(&cfg, &report).is_empty());

        est.job = "pricey".into();
        est.estimated_cost = 6.0;
        report.record(est);
        let warnings = threshold_warnings(&cfg, &report);
        // Total 7.0 > 5.0 and one job over 5.0.
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn recommendations_fire_per_rule() {
        let cfg = GuardConfig::default();
        let mut est = CostEstimate::skipped("j", WarehouseSize::Medium);
        est.skipped = false;
        let features = SqlFeatures::default();
        assert!(recommendations(&est, &features, &cfg).is_empty());

        est.estimated_cost = 9.0;
        est.complexity_score = 85;
        est.estimated_time_seconds = 4000.0;
        let features = SqlFeatures {
            cross_joins: 1,
            windows: 11,
            joins: 6,
            ..SqlFeatures::default()
        };
        assert_eq!(recommendations(&est, &features, &cfg).len(), 6);
    }

    #[test]
    fn duration_formatting_tiers() {
        assert_eq!(format_duration(5.5), "5.5 seconds");
        assert_eq!(format_duration(90.0), "1.5 minutes");
        assert_eq!(format_duration(5400.0), "1.5 hours");
    }

    #[test]
    fn complexity_labels() {
        assert_eq!(complexity_label(10), "Low");
        assert_eq!(complexity_label(51), "Med");
        assert_eq!(complexity_label(81), "High");
    }
}
