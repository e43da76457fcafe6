#![deny(warnings)]

//! Headless replay harness: load a scenario, run it and print the KPI line
//! together with the state digest.

use anyhow::{Context, Result};
use loco_core::TerrainQuery;
use loco_runtime::{default_scenario, init_world, run_months, ScenarioFile};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    scenario: Option<String>,
    years: Option<u32>,
    months: Option<u32>,
    json: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scenario" => args.scenario = it.next(),
            "--years" => args.years = it.next().and_then(|s| s.parse().ok()),
            "--months" => args.months = it.next().and_then(|s| s.parse().ok()),
            "--json" => args.json = true,
            _ => {}
        }
    }
    args
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    info!(
        scenario = ?args.scenario,
        years = ?args.years,
        months = ?args.months,
        git_sha = env!("GIT_SHA"),
        build_date = env!("BUILD_DATE"),
        "starting CLI"
    );

    let scenario = match &args.scenario {
        Some(path) => {
            ScenarioFile::load(path).with_context(|| format!("loading scenario {path}"))?
        }
        None => default_scenario().context("parsing built-in scenario")?,
    };
    let months = args
        .months
        .unwrap_or_else(|| args.years.unwrap_or(1).saturating_mul(12));

    let sim = init_world(&scenario).context("initialising world")?;
    println!(
        "World OK | map: {}x{} | industries: {} | companies: {} | towns: {} | start digest: {:08x}",
        sim.env.terrain.map_columns(),
        sim.env.terrain.map_rows(),
        sim.world.industries.count(),
        sim.world.companies.companies().count(),
        scenario.towns.len(),
        sim.digest()?
    );

    let snap = run_months(sim, months).context("running simulation")?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snap)?);
    }
    println!(
        "KPI | months: {} | date: {}-{:02}-{:02} | companies: {} (ai {}) | industries: {} | delivered: {} | player cash: {} | inflation: {} | digest: {:08x}",
        snap.months_run,
        snap.date.year,
        snap.date.month.number(),
        snap.date.day,
        snap.companies,
        snap.ai_companies,
        snap.industries,
        snap.cargo_delivered,
        snap.player_cash,
        snap.inflation_factor,
        snap.digest
    );

    Ok(())
}
