// ==========================================
// 门店月度排班引擎 - 排班审计仓储
// ==========================================
// 职责: schedule_audit_candidate / schedule_audit_shift 表的数据访问
// 唯一键冲突走覆盖语义, 同一 (run, 班次) 幂等重写
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::audit::{AuditCandidateRecord, AuditShiftRecord, CandidateDetails};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// ScheduleAuditRepository - 审计仓储
// ==========================================
/// 审计仓储
/// 职责: 候选资格明细与班次覆盖汇总的持久化
/// 用途: 排班结果的可解释性查询 ("为什么没排上某人")
pub struct ScheduleAuditRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleAuditRepository {
    /// 创建新的 ScheduleAuditRepository 实例
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

    /// 批量写入候选审计（INSERT OR REPLACE, 事务）
    ///
    /// # 说明
    /// - 唯一键 (run, 日期, 标签, 开始, 结束, 员工) 冲突时整行覆盖
    ///
    /// # 返回
    /// - Ok(usize): 写入的记录数
    pub fn batch_upsert_candidates(
        &self,
        records: &[AuditCandidateRecord],
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for record in records {
            let details_json = serde_json::to_string(&record.details)?;
            tx.execute(
                r#"
                INSERT OR REPLACE INTO schedule_audit_candidate (
                    audit_candidate_id, schedule_run_id,
                    shift_date, label, start_minute, end_minute,
                    employee_id, eligible, rejection_reason, details
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    Uuid::new_v4().to_string(),
                    record.schedule_run_id,
                    record.shift_date.to_string(),
                    record.label,
                    record.start_minute,
                    record.end_minute,
                    record.employee_id,
                    record.eligible,
                    record.rejection_reason,
                    details_json,
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 批量写入班次覆盖审计（INSERT OR REPLACE, 事务）
    pub fn batch_upsert_shift_audits(
        &self,
        records: &[AuditShiftRecord],
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for record in records {
            let summary_json = serde_json::to_string(&record.rejection_summary)?;
            tx.execute(
                r#"
                INSERT OR REPLACE INTO schedule_audit_shift (
                    audit_shift_id, schedule_run_id,
                    shift_date, label, start_minute, end_minute,
                    required_count, assigned_count, candidate_count, missing_count,
                    rejection_summary
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
                params![
                    Uuid::new_v4().to_string(),
                    record.schedule_run_id,
                    record.shift_date.to_string(),
                    record.label,
                    record.start_minute,
                    record.end_minute,
                    record.required_count,
                    record.assigned_count,
                    record.candidate_count,
                    record.missing_count,
                    summary_json,
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 查询单个班次的全部候选审计（合格者在前）
    pub fn find_candidates_for_shift(
        &self,
        run_id: &str,
        shift_date: NaiveDate,
        label: &str,
        start_minute: i32,
        end_minute: i32,
    ) -> RepositoryResult<Vec<AuditCandidateRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT schedule_run_id, shift_date, label, start_minute, end_minute,
                   employee_id, eligible, rejection_reason, details
            FROM schedule_audit_candidate
            WHERE schedule_run_id = ?1 AND shift_date = ?2 AND label = ?3
              AND start_minute = ?4 AND end_minute = ?5
            ORDER BY eligible DESC, employee_id ASC
            "#,
        )?;

        // details 列先取原文, 出闭包后再做严格 JSON 解析
        let raw_rows = stmt
            .query_map(
                params![run_id, shift_date.to_string(), label, start_minute, end_minute],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i32>(3)?,
                        row.get::<_, i32>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, bool>(6)?,
                        row.get::<_, Option<String>>(7)?,
                        row.get::<_, String>(8)?,
                    ))
                },
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut records = Vec::with_capacity(raw_rows.len());
        for (run, date, label, start, end, eid, eligible, rejection, details_raw) in raw_rows {
            let details: CandidateDetails = serde_json::from_str(&details_raw)?;
            records.push(AuditCandidateRecord {
                schedule_run_id: run,
                shift_date: parse_date(&date),
                label,
                start_minute: start,
                end_minute: end,
                employee_id: eid,
                eligible,
                rejection_reason: rejection,
                details,
            });
        }

        Ok(records)
    }

    /// 查询运行的全部班次覆盖审计（按日期/时段升序）
    pub fn find_shift_audits(&self, run_id: &str) -> RepositoryResult<Vec<AuditShiftRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT schedule_run_id, shift_date, label, start_minute, end_minute,
                   required_count, assigned_count, candidate_count, missing_count,
                   rejection_summary
            FROM schedule_audit_shift
            WHERE schedule_run_id = ?1
            ORDER BY shift_date ASC, start_minute ASC, end_minute ASC, label ASC
            "#,
        )?;

        let records = stmt
            .query_map(params![run_id], |row| {
                let summary_raw = row.get::<_, String>(9)?;
                Ok(AuditShiftRecord {
                    schedule_run_id: row.get(0)?,
                    shift_date: parse_date(&row.get::<_, String>(1)?),
                    label: row.get(2)?,
                    start_minute: row.get(3)?,
                    end_minute: row.get(4)?,
                    required_count: row.get(5)?,
                    assigned_count: row.get(6)?,
                    candidate_count: row.get(7)?,
                    missing_count: row.get(8)?,
                    rejection_summary: serde_json::from_str::<BTreeMap<String, i64>>(&summary_raw)
                        .unwrap_or_default(),
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(records)
    }

    /// 统计运行的候选审计行数（完整性校验用: 应为 |需求| x |员工|）
    pub fn count_candidates_for_run(&self, run_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM schedule_audit_candidate WHERE schedule_run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// 解析日期文本, 格式错误回落纪元起点
fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use tempfile::NamedTempFile;

    fn test_repo() -> (NamedTempFile, ScheduleAuditRepository, Arc<Mutex<Connection>>) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();
        let conn = open_sqlite_connection(&db_path).unwrap();
        init_schema(&conn).unwrap();
        let shared = Arc::new(Mutex::new(conn));
        let repo = ScheduleAuditRepository::from_connection(Arc::clone(&shared));
        (temp_file, repo, shared)
    }

    fn seed_run(conn: &Arc<Mutex<Connection>>, run_id: &str) {
        let guard = conn.lock().unwrap();
        guard
            .execute(
                "INSERT INTO schedule_runs (schedule_run_id, company_id, studio_id, month_start, month_end)
                 VALUES (?1, 'c1', 's1', '2025-03-01', '2025-03-31')",
                params![run_id],
            )
            .unwrap();
    }

    fn candidate(run: &str, eid: &str, eligible: bool) -> AuditCandidateRecord {
        AuditCandidateRecord {
            schedule_run_id: run.to_string(),
            shift_date: "2025-03-03".parse().unwrap(),
            label: "AM".to_string(),
            start_minute: 265,
            end_minute: 745,
            employee_id: eid.to_string(),
            eligible,
            rejection_reason: if eligible { None } else { Some("pto".to_string()) },
            details: CandidateDetails {
                selected: eligible,
                minutes_so_far: 0,
                hard_reasons: if eligible { vec![] } else { vec!["pto".to_string()] },
                score: if eligible { 88.5 } else { 0.0 },
                soft_reasons: vec![],
            },
        }
    }

    #[test]
    fn test_candidate_upsert_round_trip() {
        let (_file, repo, conn) = test_repo();
        seed_run(&conn, "run-1");

        let records = vec![candidate("run-1", "e1", true), candidate("run-1", "e2", false)];
        assert_eq!(repo.batch_upsert_candidates(&records).unwrap(), 2);

        let found = repo
            .find_candidates_for_shift("run-1", "2025-03-03".parse().unwrap(), "AM", 265, 745)
            .unwrap();
        assert_eq!(found.len(), 2);
        // 合格者在前
        assert!(found[0].eligible);
        assert_eq!(found[0].employee_id, "e1");
        assert_eq!(found[1].rejection_reason.as_deref(), Some("pto"));
        assert_eq!(found[1].details.hard_reasons, vec!["pto".to_string()]);
    }

    #[test]
    fn test_candidate_rerun_overwrites_same_key() {
        let (_file, repo, conn) = test_repo();
        seed_run(&conn, "run-1");

        repo.batch_upsert_candidates(&[candidate("run-1", "e1", true)]).unwrap();
        // 同键重写 (如重复生成同一运行的审计)
        let mut updated = candidate("run-1", "e1", true);
        updated.details.score = 42.0;
        repo.batch_upsert_candidates(&[updated]).unwrap();

        assert_eq!(repo.count_candidates_for_run("run-1").unwrap(), 1);
        let found = repo
            .find_candidates_for_shift("run-1", "2025-03-03".parse().unwrap(), "AM", 265, 745)
            .unwrap();
        assert_eq!(found[0].details.score, 42.0);
    }

    #[test]
    fn test_shift_audit_round_trip() {
        let (_file, repo, conn) = test_repo();
        seed_run(&conn, "run-1");

        let mut summary = BTreeMap::new();
        summary.insert("pto".to_string(), 2i64);
        summary.insert("no_availability_coverage".to_string(), 3i64);

        let record = AuditShiftRecord {
            schedule_run_id: "run-1".to_string(),
            shift_date: "2025-03-03".parse().unwrap(),
            label: "AM".to_string(),
            start_minute: 265,
            end_minute: 745,
            required_count: 2,
            assigned_count: 1,
            candidate_count: 1,
            missing_count: 1,
            rejection_summary: summary,
        };
        assert_eq!(repo.batch_upsert_shift_audits(&[record]).unwrap(), 1);

        let found = repo.find_shift_audits("run-1").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].assigned_count + found[0].missing_count, found[0].required_count);
        assert_eq!(found[0].rejection_summary.get("pto"), Some(&2));
    }
}
