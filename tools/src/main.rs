//! rota-runner: headless shift materializer.
//!
//! Usage:
//!   rota-runner --db roster.db --import fixture.json --employee E123
//!   rota-runner --db roster.db --schedule sched-2024 --start 2024-01-01 --end 2024-03-31

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rotaplan_core::{
    clock::Clock,
    config::GeneratorConfig,
    materializer::{GenerationRequest, GenerationResult, GenerationTarget, ShiftMaterializer},
    roster::{Assignment, Position, WorkGroup},
    schedule::ScheduleDefinition,
    store::RosterStore,
};
use std::env;
use std::path::Path;

/// Roster snapshot as exported by the admin import.
#[derive(serde::Deserialize, Default)]
#[serde(default)]
struct RosterFixture {
    positions:   Vec<Position>,
    work_groups: Vec<WorkGroup>,
    assignments: Vec<Assignment>,
    schedules:   Vec<ScheduleDefinition>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let data_dir = flag_value(&args, "--data-dir").unwrap_or("./data");
    let json_output = args.iter().any(|a| a == "--json");

    let target = match (flag_value(&args, "--employee"), flag_value(&args, "--schedule")) {
        (Some(employee), None) => GenerationTarget::Employee(employee.to_string()),
        (None, Some(schedule)) => GenerationTarget::Schedule(schedule.to_string()),
        _ => bail!("exactly one of --employee or --schedule is required"),
    };
    let request = GenerationRequest {
        target,
        start_date: parse_date(&args, "--start")?,
        end_date:   parse_date(&args, "--end")?,
    };

    let config = if Path::new(data_dir).join("generator.json").exists() {
        GeneratorConfig::load(data_dir)?
    } else {
        log::info!("no generator.json in {data_dir}, using defaults");
        GeneratorConfig::default()
    };

    let store = RosterStore::open(db)?;
    store.migrate()?;

    if let Some(fixture) = flag_value(&args, "--import") {
        import_fixture(&store, fixture)?;
    }

    let materializer = ShiftMaterializer::new(&store, &config, Clock::System);
    let result = materializer.generate(&request);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(db, &result);
    }

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

fn import_fixture(store: &RosterStore, path: &str) -> Result<()> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
    let fixture: RosterFixture =
        serde_json::from_str(&content).with_context(|| format!("Cannot parse {path}"))?;

    for p in &fixture.positions {
        store.insert_position(p)?;
    }
    for wg in &fixture.work_groups {
        store.insert_work_group(wg)?;
    }
    for a in &fixture.assignments {
        store.insert_assignment(a)?;
    }
    for s in &fixture.schedules {
        store.insert_schedule(s)?;
    }
    log::info!(
        "imported {} position(s), {} work group(s), {} assignment(s), {} schedule(s) from {path}",
        fixture.positions.len(),
        fixture.work_groups.len(),
        fixture.assignments.len(),
        fixture.schedules.len(),
    );
    Ok(())
}

fn print_summary(db: &str, result: &GenerationResult) {
    let range = match (result.start_date, result.end_date) {
        (Some(start), Some(end)) => format!("{start} .. {end}"),
        _ => "-".to_string(),
    };
    println!("=== GENERATION SUMMARY ===");
    println!("  run_id:      {}", result.run_id);
    println!("  db:          {db}");
    println!("  range:       {range}");
    println!("  success:     {}", result.success);
    println!("  generated:   {}", result.generated_count);
    println!("  skipped:     {}", result.skipped_count);
    println!("  failed:      {}", result.failed_count);
    println!("  no template: {}", result.missing_template_count);
    println!("  message:     {}", result.message);

    if result.employees.len() > 1 {
        println!();
        println!("=== PER EMPLOYEE ===");
        for o in &result.employees {
            let status = if o.success { "ok  " } else { "FAIL" };
            println!("  {status} {:<16} {}", o.employee_id, o.message);
        }
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_date(args: &[String], flag: &str) -> Result<Option<NaiveDate>> {
    flag_value(args, flag)
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("{flag} expects YYYY-MM-DD, got '{raw}'"))
        })
        .transpose()
}
