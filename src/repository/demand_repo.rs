// ==========================================
// 门店月度排班引擎 - 班次需求仓储
// ==========================================
// 职责: shift_instances 表的数据访问
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::ShiftDemand;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// ShiftDemandRepository - 班次需求仓储
// ==========================================
/// 班次需求仓储
/// 职责: 已具体化的逐日需求行 (date + label + 时段 + 人数)
pub struct ShiftDemandRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ShiftDemandRepository {
    /// 创建新的 ShiftDemandRepository 实例
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

    /// 批量插入需求行（事务, 每行铸造 UUID）
    ///
    /// # 返回
    /// - Ok(usize): 成功插入的记录数
    pub fn batch_insert(
        &self,
        company_id: &str,
        studio_id: &str,
        demands: &[ShiftDemand],
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for demand in demands {
            tx.execute(
                r#"
                INSERT INTO shift_instances (
                    shift_instance_id, company_id, studio_id,
                    shift_date, day_of_week, label,
                    start_minute, end_minute, required_count
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    Uuid::new_v4().to_string(),
                    company_id,
                    studio_id,
                    demand.shift_date.to_string(),
                    demand.day_of_week,
                    demand.label,
                    demand.start_minute,
                    demand.end_minute,
                    demand.required_count,
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 查询门店在日期区间内的需求行
    ///
    /// # 返回
    /// - Ok(Vec<ShiftDemand>): 按 (日期, 开始时刻, 结束时刻, 标签) 升序,
    ///   保证贪心遍历与稀缺度排序的并列顺序确定
    pub fn find_demand_for_range(
        &self,
        studio_id: &str,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> RepositoryResult<Vec<ShiftDemand>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT shift_date, day_of_week, label, start_minute, end_minute, required_count
            FROM shift_instances
            WHERE studio_id = ?1 AND shift_date >= ?2 AND shift_date <= ?3
            ORDER BY shift_date ASC, start_minute ASC, end_minute ASC, label ASC
            "#,
        )?;

        let demands = stmt
            .query_map(
                params![studio_id, range_start.to_string(), range_end.to_string()],
                |row| {
                    Ok(ShiftDemand {
                        shift_date: parse_date(&row.get::<_, String>(0)?),
                        day_of_week: row.get(1)?,
                        label: row.get(2)?,
                        start_minute: row.get(3)?,
                        end_minute: row.get(4)?,
                        required_count: row.get(5)?,
                    })
                },
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(demands)
    }

    /// 删除门店在日期区间内的需求行（种子工具重建月份用）
    pub fn delete_for_range(
        &self,
        studio_id: &str,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count = conn.execute(
            "DELETE FROM shift_instances WHERE studio_id = ?1 AND shift_date >= ?2 AND shift_date <= ?3",
            params![studio_id, range_start.to_string(), range_end.to_string()],
        )?;
        Ok(count)
    }
}

/// 解析日期文本, 格式错误回落纪元起点
fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
}
