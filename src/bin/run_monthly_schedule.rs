// Dev utility: generate one month of schedule for the demo studio seeded by
// seed_demo_db, then print the coverage report and per-employee hours.
//
// Usage:
//   cargo run --bin run_monthly_schedule -- [db_path] [YYYY-MM] [--overwrite]
//
// Defaults: db_path = <data dir>/shift-scheduler/schedule.db, month = next month.
// --overwrite clears previously generated assignments for the studio/month.

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, Local, NaiveDate};
use std::collections::BTreeMap;

use shift_scheduler::api::ScheduleApi;
use shift_scheduler::db::default_db_path;
use shift_scheduler::engine::timeline;
use shift_scheduler::logging;

const COMPANY_ID: &str = "demo-company";
const STUDIO_ID: &str = "demo-studio";

fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let overwrite = args.iter().any(|arg| arg == "--overwrite");
    let positional: Vec<&String> = args.iter().filter(|arg| !arg.starts_with("--")).collect();

    let db_path = positional
        .first()
        .map(|s| s.to_string())
        .unwrap_or_else(|| default_db_path().to_string_lossy().into_owned());

    let (month_start, month_end) = match positional.get(1) {
        Some(arg) => parse_month(arg)?,
        None => next_month_bounds(Local::now().date_naive()),
    };

    let api = ScheduleApi::new(&db_path)
        .with_context(|| format!("cannot open database at {}", db_path))?;

    let outcome =
        api.generate_month_schedule(COMPANY_ID, STUDIO_ID, month_start, month_end, overwrite)?;

    println!(
        "run_id={} demand={} assigned={} unfilled={}",
        outcome.run_id, outcome.demand_count, outcome.assigned_count, outcome.unfilled_count
    );
    println!();

    let coverage = api.get_run_coverage(&outcome.run_id)?;

    println!(
        "{:<12} {:<15} {:<13} {:>4} {:>4} {:>5}  {}",
        "date", "shift", "time", "req", "got", "miss", "assigned"
    );
    let mut minutes_by_name: BTreeMap<String, i64> = BTreeMap::new();
    for row in &coverage {
        let duration = (row.end_minute - row.start_minute) as i64;
        for name in &row.assigned_employees {
            *minutes_by_name.entry(name.clone()).or_insert(0) += duration;
        }

        println!(
            "{:<12} {:<15} {:<13} {:>4} {:>4} {:>5}  {}",
            row.shift_date.to_string(),
            row.label,
            format!(
                "{}-{}",
                timeline::format_minutes(row.start_minute),
                timeline::format_minutes(row.end_minute)
            ),
            row.required_count,
            row.assigned_count,
            (row.required_count - row.assigned_count).max(0),
            row.assigned_employees.join(", "),
        );
    }

    println!();
    println!("Weekly-equivalent hours per employee:");
    for (name, minutes) in &minutes_by_name {
        println!(
            "  {:<10} {:>6.1}h",
            name,
            timeline::weekly_equivalent_hours(*minutes)
        );
    }

    if outcome.unfilled_count > 0 {
        eprintln!(
            "{} slots remain unfilled; inspect the audit records for rejection reasons",
            outcome.unfilled_count
        );
    }

    Ok(())
}

fn parse_month(arg: &str) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::parse_from_str(&format!("{}-01", arg), "%Y-%m-%d")
        .with_context(|| format!("month must be YYYY-MM, got {}", arg))?;
    Ok((start, last_day_of_month(start)))
}

fn next_month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first_of_next = last_day_of_month(today) + Duration::days(1);
    (first_of_next, last_day_of_month(first_of_next))
}

fn last_day_of_month(day: NaiveDate) -> NaiveDate {
    let (year, month) = if day.month() == 12 {
        (day.year() + 1, 1)
    } else {
        (day.year(), day.month() + 1)
    };
    // 1st of the following month always exists
    NaiveDate::from_ymd_opt(year, month, 1).unwrap() - Duration::days(1)
}
