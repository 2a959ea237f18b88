// ==========================================
// 门店月度排班引擎 - 排班运行仓储
// ==========================================
// 职责: schedule_runs / scheduled_shifts 表的数据访问
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{AssignedShift, RunSummary, ScheduleRun};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// ScheduleRunRepository - 排班运行仓储
// ==========================================
/// 排班运行仓储
/// 职责: 运行记录的创建/查询, 分配结果的批量写入与读取
pub struct ScheduleRunRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleRunRepository {
    /// 创建新的 ScheduleRunRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建运行记录（运行ID在此铸造一次）
    ///
    /// # 返回
    /// - Ok(ScheduleRun): 已持久化的运行记录
    pub fn create_run(
        &self,
        company_id: &str,
        studio_id: &str,
        month_start: NaiveDate,
        month_end: NaiveDate,
    ) -> RepositoryResult<ScheduleRun> {
        let run = ScheduleRun {
            schedule_run_id: Uuid::new_v4().to_string(),
            company_id: company_id.to_string(),
            studio_id: studio_id.to_string(),
            month_start,
            month_end,
            created_at: chrono::Local::now().naive_local(),
        };

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO schedule_runs (
                schedule_run_id, company_id, studio_id, month_start, month_end, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                run.schedule_run_id,
                run.company_id,
                run.studio_id,
                run.month_start.to_string(),
                run.month_end.to_string(),
                run.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(run)
    }

    /// 按ID查询运行记录
    pub fn find_run(&self, run_id: &str) -> RepositoryResult<Option<ScheduleRun>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT schedule_run_id, company_id, studio_id, month_start, month_end, created_at
            FROM schedule_runs
            WHERE schedule_run_id = ?1
            "#,
        )?;

        let result = stmt.query_row(params![run_id], |row| {
            Ok(ScheduleRun {
                schedule_run_id: row.get(0)?,
                company_id: row.get(1)?,
                studio_id: row.get(2)?,
                month_start: parse_date(&row.get::<_, String>(3)?),
                month_end: parse_date(&row.get::<_, String>(4)?),
                created_at: parse_datetime(&row.get::<_, String>(5)?),
            })
        });

        match result {
            Ok(run) => Ok(Some(run)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询公司的运行列表（最新在前, 附带分配班次数）
    pub fn list_runs(&self, company_id: &str) -> RepositoryResult<Vec<RunSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT r.schedule_run_id, r.studio_id, r.month_start, r.month_end, r.created_at,
                   (SELECT COUNT(*) FROM scheduled_shifts s
                     WHERE s.schedule_run_id = r.schedule_run_id) AS shift_count
            FROM schedule_runs r
            WHERE r.company_id = ?1
            ORDER BY r.created_at DESC, r.schedule_run_id DESC
            "#,
        )?;

        let runs = stmt
            .query_map(params![company_id], |row| {
                Ok(RunSummary {
                    schedule_run_id: row.get(0)?,
                    studio_id: row.get(1)?,
                    month_start: parse_date(&row.get::<_, String>(2)?),
                    month_end: parse_date(&row.get::<_, String>(3)?),
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    shift_count: row.get(5)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(runs)
    }

    /// 删除门店在日期区间内的已排班次（overwrite 重排前清场, 跨运行）
    ///
    /// # 返回
    /// - Ok(usize): 删除的记录数
    pub fn delete_assignments_for_range(
        &self,
        studio_id: &str,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count = conn.execute(
            "DELETE FROM scheduled_shifts WHERE studio_id = ?1 AND shift_date >= ?2 AND shift_date <= ?3",
            params![studio_id, range_start.to_string(), range_end.to_string()],
        )?;
        Ok(count)
    }

    /// 批量写入分配结果（事务, 每行铸造 UUID）
    ///
    /// # 返回
    /// - Ok(usize): 成功插入的记录数
    pub fn batch_insert_assignments(
        &self,
        run_id: &str,
        studio_id: &str,
        assignments: &[AssignedShift],
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for shift in assignments {
            tx.execute(
                r#"
                INSERT INTO scheduled_shifts (
                    scheduled_shift_id, schedule_run_id, employee_id, studio_id,
                    shift_date, day_of_week, label, start_minute, end_minute
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    Uuid::new_v4().to_string(),
                    run_id,
                    shift.employee_id,
                    studio_id,
                    shift.shift_date.to_string(),
                    shift.day_of_week,
                    shift.label,
                    shift.start_minute,
                    shift.end_minute,
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 查询运行的全部分配结果
    pub fn find_assignments_for_run(&self, run_id: &str) -> RepositoryResult<Vec<AssignedShift>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT employee_id, shift_date, day_of_week, label, start_minute, end_minute
            FROM scheduled_shifts
            WHERE schedule_run_id = ?1
            ORDER BY shift_date ASC, start_minute ASC, end_minute ASC, label ASC, employee_id ASC
            "#,
        )?;

        let assignments = stmt
            .query_map(params![run_id], map_assigned_shift)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(assignments)
    }

    /// 查询运行内某员工的分配结果（按日期/开始时刻升序）
    pub fn find_assignments_for_employee(
        &self,
        run_id: &str,
        employee_id: &str,
    ) -> RepositoryResult<Vec<AssignedShift>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT employee_id, shift_date, day_of_week, label, start_minute, end_minute
            FROM scheduled_shifts
            WHERE schedule_run_id = ?1 AND employee_id = ?2
            ORDER BY shift_date ASC, start_minute ASC
            "#,
        )?;

        let assignments = stmt
            .query_map(params![run_id, employee_id], map_assigned_shift)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(assignments)
    }

    /// 查询运行的分配结果及员工姓名（覆盖视图拼装用）
    pub fn find_assignments_with_names(
        &self,
        run_id: &str,
    ) -> RepositoryResult<Vec<(AssignedShift, String)>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.employee_id, s.shift_date, s.day_of_week, s.label,
                   s.start_minute, s.end_minute, e.name
            FROM scheduled_shifts s
            JOIN employees e ON e.employee_id = s.employee_id
            WHERE s.schedule_run_id = ?1
            ORDER BY s.shift_date ASC, s.start_minute ASC, s.end_minute ASC, s.label ASC, e.name ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((
                    AssignedShift {
                        employee_id: row.get(0)?,
                        shift_date: parse_date(&row.get::<_, String>(1)?),
                        day_of_week: row.get(2)?,
                        label: row.get(3)?,
                        start_minute: row.get(4)?,
                        end_minute: row.get(5)?,
                    },
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(rows)
    }
}

// ==========================================
// 辅助函数
// ==========================================

fn map_assigned_shift(row: &rusqlite::Row<'_>) -> SqliteResult<AssignedShift> {
    Ok(AssignedShift {
        employee_id: row.get(0)?,
        shift_date: parse_date(&row.get::<_, String>(1)?),
        day_of_week: row.get(2)?,
        label: row.get(3)?,
        start_minute: row.get(4)?,
        end_minute: row.get(5)?,
    })
}

/// 解析日期文本, 格式错误回落纪元起点
fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
}

/// 解析时间戳文本, 格式错误回落默认值
fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::engine::timeline::day_of_week;
    use tempfile::NamedTempFile;

    fn test_repo() -> (NamedTempFile, Arc<Mutex<Connection>>, ScheduleRunRepository) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();
        let conn = open_sqlite_connection(&db_path).unwrap();
        init_schema(&conn).unwrap();
        let shared = Arc::new(Mutex::new(conn));
        let repo = ScheduleRunRepository::from_connection(Arc::clone(&shared));
        (temp_file, shared, repo)
    }

    fn seed_employee(conn: &Arc<Mutex<Connection>>, id: &str, name: &str) {
        let guard = conn.lock().unwrap();
        guard
            .execute(
                "INSERT INTO employees (employee_id, company_id, name, is_active) VALUES (?1, 'c1', ?2, 1)",
                params![id, name],
            )
            .unwrap();
    }

    fn assigned(eid: &str, date: &str, label: &str, start: i32, end: i32) -> AssignedShift {
        let shift_date: NaiveDate = date.parse().unwrap();
        AssignedShift {
            employee_id: eid.to_string(),
            shift_date,
            day_of_week: day_of_week(shift_date),
            label: label.to_string(),
            start_minute: start,
            end_minute: end,
        }
    }

    #[test]
    fn test_create_and_find_run() {
        let (_file, _conn, repo) = test_repo();
        let run = repo
            .create_run("c1", "s1", "2025-03-01".parse().unwrap(), "2025-03-31".parse().unwrap())
            .unwrap();

        let found = repo.find_run(&run.schedule_run_id).unwrap().unwrap();
        assert_eq!(found.company_id, "c1");
        assert_eq!(found.month_start.to_string(), "2025-03-01");

        assert!(repo.find_run("missing").unwrap().is_none());
    }

    #[test]
    fn test_assignments_round_trip_and_order() {
        let (_file, conn, repo) = test_repo();
        seed_employee(&conn, "e1", "甲");
        seed_employee(&conn, "e2", "乙");
        let run = repo
            .create_run("c1", "s1", "2025-03-01".parse().unwrap(), "2025-03-31".parse().unwrap())
            .unwrap();

        let rows = vec![
            assigned("e2", "2025-03-04", "AM", 265, 745),
            assigned("e1", "2025-03-03", "PM", 750, 1230),
            assigned("e1", "2025-03-03", "AM", 265, 745),
        ];
        let inserted = repo
            .batch_insert_assignments(&run.schedule_run_id, "s1", &rows)
            .unwrap();
        assert_eq!(inserted, 3);

        let found = repo.find_assignments_for_run(&run.schedule_run_id).unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].shift_date.to_string(), "2025-03-03");
        assert_eq!(found[0].label, "AM");

        let mine = repo
            .find_assignments_for_employee(&run.schedule_run_id, "e1")
            .unwrap();
        assert_eq!(mine.len(), 2);
    }

    #[test]
    fn test_delete_assignments_for_range_spans_runs() {
        let (_file, conn, repo) = test_repo();
        seed_employee(&conn, "e1", "甲");
        let run1 = repo
            .create_run("c1", "s1", "2025-03-01".parse().unwrap(), "2025-03-31".parse().unwrap())
            .unwrap();
        let run2 = repo
            .create_run("c1", "s1", "2025-03-01".parse().unwrap(), "2025-03-31".parse().unwrap())
            .unwrap();
        repo.batch_insert_assignments(&run1.schedule_run_id, "s1", &[assigned("e1", "2025-03-03", "AM", 265, 745)])
            .unwrap();
        repo.batch_insert_assignments(&run2.schedule_run_id, "s1", &[assigned("e1", "2025-03-04", "AM", 265, 745)])
            .unwrap();

        let deleted = repo
            .delete_assignments_for_range("s1", "2025-03-01".parse().unwrap(), "2025-03-31".parse().unwrap())
            .unwrap();
        assert_eq!(deleted, 2);
    }

    #[test]
    fn test_list_runs_newest_first_with_counts() {
        let (_file, conn, repo) = test_repo();
        seed_employee(&conn, "e1", "甲");
        let run1 = repo
            .create_run("c1", "s1", "2025-03-01".parse().unwrap(), "2025-03-31".parse().unwrap())
            .unwrap();
        repo.batch_insert_assignments(&run1.schedule_run_id, "s1", &[assigned("e1", "2025-03-03", "AM", 265, 745)])
            .unwrap();
        let _run2 = repo
            .create_run("c1", "s1", "2025-04-01".parse().unwrap(), "2025-04-30".parse().unwrap())
            .unwrap();

        let runs = repo.list_runs("c1").unwrap();
        assert_eq!(runs.len(), 2);
        let first_counts: Vec<i64> = runs.iter().map(|r| r.shift_count).collect();
        assert!(first_counts.contains(&1));
        assert!(first_counts.contains(&0));
    }
}
