// ==========================================
// 门店月度排班引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 集中建表语句，测试与种子工具共用同一份 schema
// ==========================================

use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 默认数据库路径: <系统数据目录>/shift-scheduler/schedule.db
///
/// 目录不存在时由调用方负责创建（种子工具会创建）。
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shift-scheduler")
        .join("schedule.db")
}

/// 初始化数据库 schema（幂等，CREATE TABLE IF NOT EXISTS）
///
/// # 约定
/// - 日期列一律 TEXT，格式 %Y-%m-%d
/// - 时刻列一律 INTEGER，表示当日 0 点起的分钟数（end_minute <= 1440）
/// - 主键一律 UUID v4 文本
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- 员工主表
        CREATE TABLE IF NOT EXISTS employees (
            employee_id TEXT PRIMARY KEY,
            company_id TEXT NOT NULL,
            name TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        -- 员工规则 (雇佣类型/周末偏好/理想周工时/硬性禁忌, JSON 负载)
        CREATE TABLE IF NOT EXISTS employee_rules (
            rule_id TEXT PRIMARY KEY,
            employee_id TEXT NOT NULL REFERENCES employees(employee_id) ON DELETE CASCADE,
            rule_type TEXT NOT NULL,
            value_json TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_employee_rules_employee
            ON employee_rules(employee_id);

        -- 每周可用时段 (day_of_week: 0=周日 .. 6=周六)
        CREATE TABLE IF NOT EXISTS employee_availability (
            availability_id TEXT PRIMARY KEY,
            employee_id TEXT NOT NULL REFERENCES employees(employee_id) ON DELETE CASCADE,
            day_of_week INTEGER NOT NULL,
            start_minute INTEGER NOT NULL,
            end_minute INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_employee_availability_employee
            ON employee_availability(employee_id, day_of_week);

        -- 每周不可用时段
        CREATE TABLE IF NOT EXISTS employee_unavailability (
            unavailability_id TEXT PRIMARY KEY,
            employee_id TEXT NOT NULL REFERENCES employees(employee_id) ON DELETE CASCADE,
            day_of_week INTEGER NOT NULL,
            start_minute INTEGER NOT NULL,
            end_minute INTEGER NOT NULL,
            reason TEXT
        );

        -- 带薪假 (闭区间日期段)
        CREATE TABLE IF NOT EXISTS employee_pto (
            pto_id TEXT PRIMARY KEY,
            employee_id TEXT NOT NULL REFERENCES employees(employee_id) ON DELETE CASCADE,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            note TEXT
        );

        -- 已批准请假 (闭区间日期段)
        CREATE TABLE IF NOT EXISTS employee_time_off (
            time_off_id TEXT PRIMARY KEY,
            employee_id TEXT NOT NULL REFERENCES employees(employee_id) ON DELETE CASCADE,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            note TEXT
        );

        -- 排班需求 (某日期某时段需要 required_count 人)
        CREATE TABLE IF NOT EXISTS shift_instances (
            shift_instance_id TEXT PRIMARY KEY,
            company_id TEXT NOT NULL,
            studio_id TEXT NOT NULL,
            shift_date TEXT NOT NULL,
            day_of_week INTEGER NOT NULL,
            label TEXT NOT NULL,
            start_minute INTEGER NOT NULL,
            end_minute INTEGER NOT NULL,
            required_count INTEGER NOT NULL DEFAULT 1
        );
        CREATE INDEX IF NOT EXISTS idx_shift_instances_studio_date
            ON shift_instances(studio_id, shift_date);

        -- 排班运行 (一次生成 = 一行)
        CREATE TABLE IF NOT EXISTS schedule_runs (
            schedule_run_id TEXT PRIMARY KEY,
            company_id TEXT NOT NULL,
            studio_id TEXT NOT NULL,
            month_start TEXT NOT NULL,
            month_end TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- 排班结果 (员工 x 班次)
        CREATE TABLE IF NOT EXISTS scheduled_shifts (
            scheduled_shift_id TEXT PRIMARY KEY,
            schedule_run_id TEXT NOT NULL REFERENCES schedule_runs(schedule_run_id) ON DELETE CASCADE,
            employee_id TEXT NOT NULL REFERENCES employees(employee_id),
            studio_id TEXT NOT NULL,
            shift_date TEXT NOT NULL,
            day_of_week INTEGER NOT NULL,
            label TEXT NOT NULL,
            start_minute INTEGER NOT NULL,
            end_minute INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_scheduled_shifts_run
            ON scheduled_shifts(schedule_run_id);
        CREATE INDEX IF NOT EXISTS idx_scheduled_shifts_studio_date
            ON scheduled_shifts(studio_id, shift_date);

        -- 审计: 每 (班次, 员工) 一行, 记录合格性与打分细节
        CREATE TABLE IF NOT EXISTS schedule_audit_candidate (
            audit_candidate_id TEXT PRIMARY KEY,
            schedule_run_id TEXT NOT NULL REFERENCES schedule_runs(schedule_run_id) ON DELETE CASCADE,
            shift_date TEXT NOT NULL,
            label TEXT NOT NULL,
            start_minute INTEGER NOT NULL,
            end_minute INTEGER NOT NULL,
            employee_id TEXT NOT NULL,
            eligible INTEGER NOT NULL,
            rejection_reason TEXT,
            details TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(schedule_run_id, shift_date, label, start_minute, end_minute, employee_id)
        );
        CREATE INDEX IF NOT EXISTS idx_audit_candidate_run
            ON schedule_audit_candidate(schedule_run_id);

        -- 审计: 每班次一行, 记录覆盖缺口与拒绝直方图
        CREATE TABLE IF NOT EXISTS schedule_audit_shift (
            audit_shift_id TEXT PRIMARY KEY,
            schedule_run_id TEXT NOT NULL REFERENCES schedule_runs(schedule_run_id) ON DELETE CASCADE,
            shift_date TEXT NOT NULL,
            label TEXT NOT NULL,
            start_minute INTEGER NOT NULL,
            end_minute INTEGER NOT NULL,
            required_count INTEGER NOT NULL,
            assigned_count INTEGER NOT NULL,
            candidate_count INTEGER NOT NULL,
            missing_count INTEGER NOT NULL,
            rejection_summary TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(schedule_run_id, shift_date, label, start_minute, end_minute)
        );
        CREATE INDEX IF NOT EXISTS idx_audit_shift_run
            ON schedule_audit_shift(schedule_run_id);

        -- 全局配置 (scope_id = 'global')
        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_init_schema_idempotent() {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();
        let conn = open_sqlite_connection(&db_path).unwrap();

        init_schema(&conn).unwrap();
        // 再次执行不报错
        init_schema(&conn).unwrap();

        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(table_count >= 12, "建表数量不足: {}", table_count);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();
        let conn = open_sqlite_connection(&db_path).unwrap();

        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }
}
