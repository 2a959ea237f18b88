// ==========================================
// 门店月度排班引擎 - 排班 API
// ==========================================
// 职责: 对外业务接口, 封装排班生成与读侧聚合查询
// 架构: API 层 → Engine 层 (ScheduleGenerator) → Repository 层
// ==========================================

use crate::api::error::ScheduleResult;
use crate::db::open_sqlite_connection;
use crate::domain::audit::{AuditCandidateRecord, ShiftCoverageRow};
use crate::domain::run::{RunSummary, ScheduleRunOutcome};
use crate::domain::shift::AssignedShift;
use crate::engine::generator::ScheduleGenerator;
use crate::repository::{RepositoryResult, ScheduleAuditRepository, ScheduleRunRepository};
use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// ScheduleApi - 排班 API
// ==========================================

/// 排班API
///
/// 职责：
/// 1. 排班生成入口 (委托 ScheduleGenerator)
/// 2. 覆盖视图/候选审计/员工班表等读侧查询
pub struct ScheduleApi {
    /// 排班生成器 (贪心 → 修复 → 周末均衡 → 随机优化)
    generator: ScheduleGenerator,
    /// 运行与排班结果 Repository
    run_repo: ScheduleRunRepository,
    /// 审计记录 Repository
    audit_repo: ScheduleAuditRepository,
}

impl ScheduleApi {
    /// 打开数据库并创建 API 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 API 实例 (与生成器共享同一连接)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        Ok(Self {
            generator: ScheduleGenerator::from_connection(conn.clone())?,
            run_repo: ScheduleRunRepository::from_connection(conn.clone()),
            audit_repo: ScheduleAuditRepository::from_connection(conn),
        })
    }

    // ==========================================
    // 排班生成接口
    // ==========================================

    /// 生成一个月的完整排班
    ///
    /// 随机互换优化阶段使用系统熵源; 需要可复现结果时
    /// 直接调用 ScheduleGenerator 并注入固定种子的随机源
    ///
    /// # 参数
    /// - company_id: 公司ID (员工按公司加载)
    /// - studio_id: 门店ID (需求与排班结果按门店隔离)
    /// - month_start/month_end: 排班区间 (含两端)
    /// - overwrite: 是否清理该门店该区间内的旧排班
    ///
    /// # 返回
    /// - Ok(ScheduleRunOutcome): 运行ID与需求/分配/缺口计数
    /// - Err(ScheduleError): 前置校验或持久化错误
    pub fn generate_month_schedule(
        &self,
        company_id: &str,
        studio_id: &str,
        month_start: NaiveDate,
        month_end: NaiveDate,
        overwrite: bool,
    ) -> ScheduleResult<ScheduleRunOutcome> {
        let mut rng = ChaCha8Rng::from_entropy();
        self.generator.generate_month_schedule(
            company_id,
            studio_id,
            month_start,
            month_end,
            overwrite,
            &mut rng,
        )
    }

    // ==========================================
    // 读侧查询接口
    // ==========================================

    /// 查询运行的班次覆盖视图（按日期/时段升序）
    ///
    /// 计数与违规直方图来自贪心阶段的审计快照;
    /// assigned_count 与 assigned_employees 反映修复/回填之后的最终名单
    ///
    /// # 参数
    /// - run_id: 运行ID
    ///
    /// # 返回
    /// 每需求班次一行覆盖视图
    pub fn get_run_coverage(&self, run_id: &str) -> ScheduleResult<Vec<ShiftCoverageRow>> {
        let audits = self.audit_repo.find_shift_audits(run_id)?;
        let named = self.run_repo.find_assignments_with_names(run_id)?;

        // 最终名单按槽位键分组 (同日同时段不同标签是不同槽位)
        let mut names_by_slot: HashMap<(NaiveDate, String, i32, i32), Vec<String>> = HashMap::new();
        for (assignment, name) in named {
            names_by_slot
                .entry((
                    assignment.shift_date,
                    assignment.label.clone(),
                    assignment.start_minute,
                    assignment.end_minute,
                ))
                .or_default()
                .push(name);
        }

        let rows = audits
            .into_iter()
            .map(|audit| {
                let key = (
                    audit.shift_date,
                    audit.label.clone(),
                    audit.start_minute,
                    audit.end_minute,
                );
                let assigned_employees = names_by_slot.remove(&key).unwrap_or_default();
                ShiftCoverageRow {
                    shift_date: audit.shift_date,
                    label: audit.label,
                    start_minute: audit.start_minute,
                    end_minute: audit.end_minute,
                    required_count: audit.required_count,
                    assigned_count: assigned_employees.len() as i64,
                    candidate_count: audit.candidate_count,
                    missing_count: audit.missing_count,
                    assigned_employees,
                    rejection_summary: audit.rejection_summary,
                }
            })
            .collect();

        Ok(rows)
    }

    /// 查询单个班次的候选审计（合格者在前, 同组按员工ID升序）
    ///
    /// # 参数
    /// - run_id: 运行ID
    /// - shift_date/label/start_minute/end_minute: 槽位键
    ///
    /// # 返回
    /// 该班次每个员工一条候选记录
    pub fn get_shift_audit(
        &self,
        run_id: &str,
        shift_date: NaiveDate,
        label: &str,
        start_minute: i32,
        end_minute: i32,
    ) -> ScheduleResult<Vec<AuditCandidateRecord>> {
        let records = self.audit_repo.find_candidates_for_shift(
            run_id,
            shift_date,
            label,
            start_minute,
            end_minute,
        )?;
        Ok(records)
    }

    /// 查询某员工在一次运行中的全部班次（按日期/开始时刻升序）
    ///
    /// # 参数
    /// - run_id: 运行ID
    /// - employee_id: 员工ID
    pub fn get_employee_schedule(
        &self,
        run_id: &str,
        employee_id: &str,
    ) -> ScheduleResult<Vec<AssignedShift>> {
        let assignments = self
            .run_repo
            .find_assignments_for_employee(run_id, employee_id)?;
        Ok(assignments)
    }

    /// 查询公司的运行列表（新→旧, 含每次运行的排班行数）
    ///
    /// # 参数
    /// - company_id: 公司ID
    pub fn list_runs(&self, company_id: &str) -> ScheduleResult<Vec<RunSummary>> {
        let runs = self.run_repo.list_runs(company_id)?;
        Ok(runs)
    }
}

// ==========================================
// 单元测试
// ==========================================
