// Dev utility: reset the database and seed a demo studio with one month of
// shift demand plus a mixed full-time / part-time workforce.
//
// Usage:
//   cargo run --bin seed_demo_db -- [db_path] [YYYY-MM]
//
// Defaults: db_path = <data dir>/shift-scheduler/schedule.db, month = next month.
// The previous database file (if any) is backed up next to it before the reset.

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, Local, NaiveDate};
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use shift_scheduler::db::{default_db_path, init_schema, open_sqlite_connection};
use shift_scheduler::domain::employee::{
    DateRangeBlock, Employee, EmployeeAvailability, EmployeeRule, EmployeeUnavailability,
};
use shift_scheduler::domain::shift::ShiftDemand;
use shift_scheduler::engine::timeline;
use shift_scheduler::repository::{ShiftDemandRepository, WorkforceRepository};

const COMPANY_ID: &str = "demo-company";
const STUDIO_ID: &str = "demo-studio";

// Weekly demand template, expanded over the target month.
// day_of_week: 0 = Sunday .. 6 = Saturday.
struct ShiftTemplate {
    days: &'static [u8],
    label: &'static str,
    start_minute: i32,
    end_minute: i32,
    required: i64,
}

const SHIFT_TEMPLATES: [ShiftTemplate; 6] = [
    // Mon-Fri
    ShiftTemplate { days: &[1, 2, 3, 4, 5], label: "AM_0425_1225", start_minute: 265, end_minute: 745, required: 1 },
    ShiftTemplate { days: &[1, 2, 3, 4, 5], label: "AM_0530_1330", start_minute: 330, end_minute: 810, required: 1 },
    ShiftTemplate { days: &[1, 2, 3, 4, 5], label: "PM_1230_2030", start_minute: 750, end_minute: 1230, required: 2 },
    // Saturday
    ShiftTemplate { days: &[6], label: "SAT_0530_1230", start_minute: 330, end_minute: 750, required: 1 },
    ShiftTemplate { days: &[6], label: "SAT_0800_1400", start_minute: 480, end_minute: 840, required: 1 },
    // Sunday
    ShiftTemplate { days: &[0], label: "SUN_0745_1330", start_minute: 465, end_minute: 810, required: 2 },
];

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let db_path = args
        .next()
        .unwrap_or_else(|| default_db_path().to_string_lossy().into_owned());

    let (month_start, month_end) = match args.next() {
        Some(arg) => parse_month(&arg)?,
        None => next_month_bounds(Local::now().date_naive()),
    };

    if let Some(parent) = Path::new(&db_path).parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create data dir {}", parent.display()))?;
    }
    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let shared = Arc::new(Mutex::new(conn));

    seed_workforce(shared.clone(), month_start)?;
    let demand_rows = seed_demand(shared.clone(), month_start, month_end)?;

    eprintln!(
        "Seeded {} demand rows for {} .. {} at {}",
        demand_rows, month_start, month_end, db_path
    );
    print_quick_counts(shared)?;

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

fn backup_and_reset_db(db_path: &str) -> Result<()> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

// ==========================================
// 员工与规则种子数据
// ==========================================
// Mixed workforce so every rule type and hard constraint shows up in the
// audit trail: four full-timers, four part-timers, one inactive employee.
fn seed_workforce(conn: Arc<Mutex<Connection>>, month_start: NaiveDate) -> Result<()> {
    let workforce = WorkforceRepository::from_connection(conn);

    let employees = [
        ("e01", "王晨", true),
        ("e02", "李娜", true),
        ("e03", "张伟", true),
        ("e04", "刘洋", true),
        ("e05", "陈静", true),
        ("e06", "杨帆", true),
        ("e07", "赵磊", true),
        ("e08", "孙悦", true),
        ("e09", "周婷", false), // inactive, must never be scheduled
    ];
    for (employee_id, name, is_active) in employees {
        workforce.upsert_employee(&Employee {
            employee_id: employee_id.to_string(),
            company_id: COMPANY_ID.to_string(),
            name: name.to_string(),
            is_active,
        })?;
    }

    // rule_type / value_json payloads
    let rules = [
        ("e01", "EMPLOYMENT_TYPE", r#"{"type": "full_time"}"#),
        ("e02", "EMPLOYMENT_TYPE", r#"{"type": "full_time"}"#),
        ("e03", "EMPLOYMENT_TYPE", r#"{"type": "full_time"}"#),
        ("e04", "EMPLOYMENT_TYPE", r#"{"type": "full_time"}"#),
        ("e05", "EMPLOYMENT_TYPE", r#"{"type": "part_time"}"#),
        ("e06", "EMPLOYMENT_TYPE", r#"{"type": "part_time"}"#),
        ("e07", "EMPLOYMENT_TYPE", r#"{"type": "part_time"}"#),
        ("e08", "EMPLOYMENT_TYPE", r#"{"type": "part_time"}"#),
        ("e02", "WEEKEND_PREFERENCE", r#"{"preference": "saturday"}"#),
        ("e03", "WEEKEND_PREFERENCE", r#"{"preference": "sunday"}"#),
        ("e05", "WEEKEND_PREFERENCE", r#"{"preference": "saturday"}"#),
        ("e06", "WEEKEND_PREFERENCE", r#"{"preference": "either"}"#),
        ("e07", "HARD_NO_CONSTRAINTS", r#"{"note": "不上晚班"}"#),
    ];
    for (employee_id, rule_type, value_json) in rules {
        workforce.insert_rule(&EmployeeRule {
            rule_id: Uuid::new_v4().to_string(),
            employee_id: employee_id.to_string(),
            rule_type: rule_type.to_string(),
            value_json: value_json.to_string(),
        })?;
    }

    // Ideal weekly hours for the part-timers
    for (employee_id, hours) in [("e05", 20.0), ("e06", 16.0), ("e07", 12.0), ("e08", 24.0)] {
        workforce.insert_rule(&EmployeeRule {
            rule_id: Uuid::new_v4().to_string(),
            employee_id: employee_id.to_string(),
            rule_type: "IDEAL_HOURS_WEEKLY".to_string(),
            value_json: format!(r#"{{"hours": {}}}"#, hours),
        })?;
    }

    // Availability windows. Employees without any window are free at all times;
    // employees with windows are rejected outside them.
    // e05: weekdays + Saturday, early hours only (no PM shift, no Sunday)
    for dow in [1u8, 2, 3, 4, 5, 6] {
        workforce.insert_availability(&EmployeeAvailability {
            availability_id: Uuid::new_v4().to_string(),
            employee_id: "e05".to_string(),
            day_of_week: dow,
            start_minute: 240,
            end_minute: 900,
        })?;
    }
    // e06: weekend only
    for (dow, start_minute, end_minute) in [(6u8, 300, 900), (0u8, 420, 900)] {
        workforce.insert_availability(&EmployeeAvailability {
            availability_id: Uuid::new_v4().to_string(),
            employee_id: "e06".to_string(),
            day_of_week: dow,
            start_minute,
            end_minute,
        })?;
    }

    // e04 studies on Wednesday evenings
    workforce.insert_unavailability(&EmployeeUnavailability {
        unavailability_id: Uuid::new_v4().to_string(),
        employee_id: "e04".to_string(),
        day_of_week: 3,
        start_minute: 900,
        end_minute: 1440,
        reason: Some("夜校".to_string()),
    })?;

    // e02 takes PTO mid-month, e03 has one approved day off
    workforce.insert_pto(&DateRangeBlock {
        block_id: Uuid::new_v4().to_string(),
        employee_id: "e02".to_string(),
        start_date: month_start + Duration::days(9),
        end_date: month_start + Duration::days(11),
        note: Some("年假".to_string()),
    })?;
    workforce.insert_time_off(&DateRangeBlock {
        block_id: Uuid::new_v4().to_string(),
        employee_id: "e03".to_string(),
        start_date: month_start + Duration::days(17),
        end_date: month_start + Duration::days(17),
        note: Some("已批事假".to_string()),
    })?;

    Ok(())
}

// ==========================================
// 需求班次种子数据 (周模板按月展开)
// ==========================================
fn seed_demand(
    conn: Arc<Mutex<Connection>>,
    month_start: NaiveDate,
    month_end: NaiveDate,
) -> Result<usize> {
    let demand_repo = ShiftDemandRepository::from_connection(conn);

    let mut rows = Vec::new();
    for date in timeline::expand_date_range(month_start, month_end) {
        let dow = timeline::day_of_week(date);
        for template in &SHIFT_TEMPLATES {
            if !template.days.contains(&dow) {
                continue;
            }
            rows.push(ShiftDemand {
                shift_date: date,
                day_of_week: dow,
                label: template.label.to_string(),
                start_minute: template.start_minute,
                end_minute: template.end_minute,
                required_count: template.required,
            });
        }
    }

    let inserted = demand_repo.batch_insert(COMPANY_ID, STUDIO_ID, &rows)?;
    Ok(inserted)
}

fn print_quick_counts(conn: Arc<Mutex<Connection>>) -> Result<()> {
    let conn = conn.lock().unwrap();
    let tables = [
        "employees",
        "employee_rules",
        "employee_availability",
        "employee_unavailability",
        "employee_pto",
        "employee_time_off",
        "shift_instances",
    ];

    eprintln!("Row counts:");
    for table in tables {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        eprintln!("  {:<26} {}", table, count);
    }
    Ok(())
}
