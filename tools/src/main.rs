//! risk-runner: headless batch runner for the complaint risk model.
//!
//! Usage:
//!   risk-runner seed      --db risk.db --seed 42 --customers 200 --as-of 2024-06-30
//!   risk-runner recompute --db risk.db --as-of 2024-06-30 --data-dir ./data
//!   risk-runner summary   --db risk.db --period MONTHLY --now 2024-06-30
//!   risk-runner report    --db risk.db [--as-of 2024-06-30]
//!   risk-runner export    --db risk.db

use anyhow::{Context, Result};
use chrono::NaiveDate;
use complaint_risk_core::{
    config::RiskConfig,
    engine::RiskEngine,
    error::parse_date,
    store::RiskStore,
    synthetic::{SyntheticDataset, SyntheticSpec},
};
use std::env;
use std::io::{self, Write};

const USAGE: &str = "usage: risk-runner <seed|recompute|summary|report|export> --db PATH [options]";

#[derive(serde::Serialize)]
struct ReportBundle {
    channels: Vec<complaint_risk_core::report::ChannelPerformance>,
    agents:   Vec<complaint_risk_core::report::AgentPerformance>,
    pareto:   Vec<complaint_risk_core::report::ParetoRow>,
    cohorts:  Vec<complaint_risk_core::report::TenureCohort>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");
    if !matches!(command, "seed" | "recompute" | "summary" | "report" | "export") {
        if command != "help" {
            log::warn!("Unknown command: {command}");
        }
        println!("{USAGE}");
        return Ok(());
    }
    let db = db_path(&args)?;

    let config = match flag_value(&args, "--data-dir") {
        Some(dir) => RiskConfig::load(dir)?,
        None => RiskConfig::default(),
    };

    let store = RiskStore::open(db).with_context(|| format!("opening {db}"))?;
    store.migrate()?;
    let engine = RiskEngine::new(config, store);

    match command {
        "seed" => {
            let seed = parse_arg(&args, "--seed", 42u64);
            let spec = SyntheticSpec {
                customers: parse_arg(&args, "--customers", SyntheticSpec::default().customers),
                agents: parse_arg(&args, "--agents", SyntheticSpec::default().agents),
                ..SyntheticSpec::default()
            };
            let as_of = date_arg(&args, "--as-of")?;
            let data = SyntheticDataset::generate(seed, &spec, as_of, &engine.config);
            engine.store.insert_dataset(&data)?;
            println!("seeded {db}");
            println!("  seed:       {seed}");
            println!("  customers:  {}", data.customers.len());
            println!("  agents:     {}", data.agents.len());
            println!("  complaints: {}", data.complaints.len());
        }
        "recompute" => {
            let as_of = date_arg(&args, "--as-of")?;
            let run = engine.recompute(as_of)?;
            print_run_summary(&engine, &run)?;
        }
        "summary" => {
            let period = flag_value(&args, "--period").unwrap_or("WEEKLY");
            let now = date_arg(&args, "--now")?;
            let summary = engine.period_summary_for(period, now)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        "report" => {
            // Cohorts read stored profiles; --as-of rescores first.
            if flag_value(&args, "--as-of").is_some() {
                engine.recompute(date_arg(&args, "--as-of")?)?;
            }
            let bundle = ReportBundle {
                channels: engine.channel_report()?,
                agents:   engine.agent_report()?,
                pareto:   engine.pareto_report()?,
                cohorts:  engine.cohort_report()?,
            };
            println!("{}", serde_json::to_string_pretty(&bundle)?);
        }
        "export" => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for line in engine.export_json_lines()? {
                writeln!(out, "{line}")?;
            }
            out.flush()?;
        }
        other => anyhow::bail!("Unknown command: {other}"),
    }

    Ok(())
}

fn print_run_summary(engine: &RiskEngine, run: &complaint_risk_core::store::ScoringRun) -> Result<()> {
    let profiles = engine.profiles()?;
    let threshold = engine.config.model.high_risk_threshold;
    let high = profiles
        .iter()
        .filter(|p| p.normalized_risk_score >= threshold)
        .count();

    println!("=== SCORING RUN ===");
    println!("  run_id:     {}", run.run_id);
    println!("  as_of:      {}", run.as_of);
    println!("  model:      v{}", run.model_version);
    println!("  customers:  {}", run.customers);
    println!("  high risk:  {high} (normalised >= {threshold:.2})");
    if let Some(range) = run.range {
        println!("  raw range:  {:.4} .. {:.4}", range.min_raw, range.max_raw);
    }

    println!();
    println!("=== TOP 10 ===");
    let mut ranked: Vec<_> = profiles.iter().collect();
    ranked.sort_by(|a, b| {
        b.normalized_risk_score
            .partial_cmp(&a.normalized_risk_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.customer_id.cmp(&b.customer_id))
    });
    for p in ranked.iter().take(10) {
        println!(
            "  {} | {:>8} | score {:.2} | raw {:.3} | {} complaints | {}",
            p.customer_id,
            p.segment,
            p.display_score(),
            p.raw_risk_score,
            p.complaint_count,
            p.tenure_bucket.label(),
        );
    }
    Ok(())
}

/// The SQLite path. Required: an implicit in-memory store would discard the work.
fn db_path(args: &[String]) -> Result<&str> {
    flag_value(args, "--db").ok_or_else(|| anyhow::anyhow!("--db PATH is required\n{USAGE}"))
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    flag_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Date flag, defaulting to today.
fn date_arg(args: &[String], flag: &str) -> Result<NaiveDate> {
    match flag_value(args, flag) {
        Some(v) => Ok(parse_date(v)?),
        None => Ok(chrono::Local::now().date_naive()),
    }
}
