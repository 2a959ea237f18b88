// ==========================================
// 门店月度排班引擎 - 员工数据仓储
// ==========================================
// 职责: employees / employee_rules / employee_availability /
//       employee_unavailability / employee_pto / employee_time_off 的数据访问
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::employee::{
    DateRangeBlock, Employee, EmployeeAvailability, EmployeeRule, EmployeeUnavailability,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// WorkforceRepository - 员工仓储
// ==========================================
/// 员工仓储
/// 职责: 排班引擎的员工侧输入 (主数据 + 规则 + 可用性 + 假期)
/// 用途: 生成器按公司加载全量, 种子工具写入演示数据
pub struct WorkforceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkforceRepository {
    /// 创建新的 WorkforceRepository 实例
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

    // ==========================================
    // 写入 (种子/管理侧)
    // ==========================================

    /// 插入或覆盖员工（INSERT OR REPLACE, 主键 employee_id）
    pub fn upsert_employee(&self, employee: &Employee) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO employees (employee_id, company_id, name, is_active)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                employee.employee_id,
                employee.company_id,
                employee.name,
                employee.is_active,
            ],
        )?;
        Ok(())
    }

    /// 插入员工规则
    pub fn insert_rule(&self, rule: &EmployeeRule) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO employee_rules (rule_id, employee_id, rule_type, value_json)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![rule.rule_id, rule.employee_id, rule.rule_type, rule.value_json],
        )?;
        Ok(())
    }

    /// 插入每周可用时段
    pub fn insert_availability(&self, window: &EmployeeAvailability) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO employee_availability
                (availability_id, employee_id, day_of_week, start_minute, end_minute)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                window.availability_id,
                window.employee_id,
                window.day_of_week,
                window.start_minute,
                window.end_minute,
            ],
        )?;
        Ok(())
    }

    /// 插入每周不可用时段
    pub fn insert_unavailability(&self, window: &EmployeeUnavailability) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO employee_unavailability
                (unavailability_id, employee_id, day_of_week, start_minute, end_minute, reason)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                window.unavailability_id,
                window.employee_id,
                window.day_of_week,
                window.start_minute,
                window.end_minute,
                window.reason,
            ],
        )?;
        Ok(())
    }

    /// 插入带薪假日期段
    pub fn insert_pto(&self, block: &DateRangeBlock) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO employee_pto (pto_id, employee_id, start_date, end_date, note)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                block.block_id,
                block.employee_id,
                block.start_date.to_string(),
                block.end_date.to_string(),
                block.note,
            ],
        )?;
        Ok(())
    }

    /// 插入已批准请假日期段
    pub fn insert_time_off(&self, block: &DateRangeBlock) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO employee_time_off
                (time_off_id, employee_id, start_date, end_date, note)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                block.block_id,
                block.employee_id,
                block.start_date.to_string(),
                block.end_date.to_string(),
                block.note,
            ],
        )?;
        Ok(())
    }

    // ==========================================
    // 读取 (生成器输入)
    // ==========================================

    /// 查询公司的在职员工
    ///
    /// # 返回
    /// - Ok(Vec<Employee>): 按 employee_id 升序 (保证遍历顺序确定)
    pub fn find_active_employees(&self, company_id: &str) -> RepositoryResult<Vec<Employee>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT employee_id, company_id, name, is_active
            FROM employees
            WHERE company_id = ?1 AND is_active = 1
            ORDER BY employee_id ASC
            "#,
        )?;

        let employees = stmt
            .query_map(params![company_id], |row| {
                Ok(Employee {
                    employee_id: row.get(0)?,
                    company_id: row.get(1)?,
                    name: row.get(2)?,
                    is_active: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(employees)
    }

    /// 查询公司在职员工的全部规则
    pub fn find_rules_for_company(&self, company_id: &str) -> RepositoryResult<Vec<EmployeeRule>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT r.rule_id, r.employee_id, r.rule_type, r.value_json
            FROM employee_rules r
            JOIN employees e ON e.employee_id = r.employee_id
            WHERE e.company_id = ?1 AND e.is_active = 1
            ORDER BY r.employee_id ASC, r.rule_type ASC
            "#,
        )?;

        let rules = stmt
            .query_map(params![company_id], |row| {
                Ok(EmployeeRule {
                    rule_id: row.get(0)?,
                    employee_id: row.get(1)?,
                    rule_type: row.get(2)?,
                    value_json: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(rules)
    }

    /// 查询公司在职员工的每周可用时段
    pub fn find_availability_for_company(
        &self,
        company_id: &str,
    ) -> RepositoryResult<Vec<EmployeeAvailability>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT a.availability_id, a.employee_id, a.day_of_week, a.start_minute, a.end_minute
            FROM employee_availability a
            JOIN employees e ON e.employee_id = a.employee_id
            WHERE e.company_id = ?1 AND e.is_active = 1
            ORDER BY a.employee_id ASC, a.day_of_week ASC, a.start_minute ASC
            "#,
        )?;

        let windows = stmt
            .query_map(params![company_id], |row| {
                Ok(EmployeeAvailability {
                    availability_id: row.get(0)?,
                    employee_id: row.get(1)?,
                    day_of_week: row.get(2)?,
                    start_minute: row.get(3)?,
                    end_minute: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(windows)
    }

    /// 查询公司在职员工的每周不可用时段
    pub fn find_unavailability_for_company(
        &self,
        company_id: &str,
    ) -> RepositoryResult<Vec<EmployeeUnavailability>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT u.unavailability_id, u.employee_id, u.day_of_week,
                   u.start_minute, u.end_minute, u.reason
            FROM employee_unavailability u
            JOIN employees e ON e.employee_id = u.employee_id
            WHERE e.company_id = ?1 AND e.is_active = 1
            ORDER BY u.employee_id ASC, u.day_of_week ASC, u.start_minute ASC
            "#,
        )?;

        let windows = stmt
            .query_map(params![company_id], |row| {
                Ok(EmployeeUnavailability {
                    unavailability_id: row.get(0)?,
                    employee_id: row.get(1)?,
                    day_of_week: row.get(2)?,
                    start_minute: row.get(3)?,
                    end_minute: row.get(4)?,
                    reason: row.get(5)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(windows)
    }

    /// 查询与日期区间相交的带薪假段
    ///
    /// # 参数
    /// - range_start / range_end: 闭区间, 相交判定 start_date <= range_end AND end_date >= range_start
    pub fn find_pto_in_range(
        &self,
        company_id: &str,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> RepositoryResult<Vec<DateRangeBlock>> {
        self.find_blocks_in_range("employee_pto", "pto_id", company_id, range_start, range_end)
    }

    /// 查询与日期区间相交的已批准请假段
    pub fn find_time_off_in_range(
        &self,
        company_id: &str,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> RepositoryResult<Vec<DateRangeBlock>> {
        self.find_blocks_in_range(
            "employee_time_off",
            "time_off_id",
            company_id,
            range_start,
            range_end,
        )
    }

    /// 日期段表的通用区间查询（pto 与 time_off 结构一致）
    fn find_blocks_in_range(
        &self,
        table: &str,
        id_column: &str,
        company_id: &str,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> RepositoryResult<Vec<DateRangeBlock>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT b.{id_column}, b.employee_id, b.start_date, b.end_date, b.note
            FROM {table} b
            JOIN employees e ON e.employee_id = b.employee_id
            WHERE e.company_id = ?1 AND e.is_active = 1
              AND b.start_date <= ?2 AND b.end_date >= ?3
            ORDER BY b.employee_id ASC, b.start_date ASC
            "#,
        );
        let mut stmt = conn.prepare(&sql)?;

        let blocks = stmt
            .query_map(
                params![company_id, range_end.to_string(), range_start.to_string()],
                map_date_range_block,
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(blocks)
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 行映射: 日期段 (pto / time_off 共用)
fn map_date_range_block(row: &Row<'_>) -> SqliteResult<DateRangeBlock> {
    Ok(DateRangeBlock {
        block_id: row.get(0)?,
        employee_id: row.get(1)?,
        start_date: parse_date(&row.get::<_, String>(2)?),
        end_date: parse_date(&row.get::<_, String>(3)?),
        note: row.get(4)?,
    })
}

/// 解析日期文本, 格式错误回落纪元起点
fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
}
