// ==========================================
// 门店月度排班引擎 - 排班生成器
// ==========================================
// 职责: 串联贪心构建、工时修复、周末均衡、随机优化四个阶段,
//       并负责运行记录、排班结果与审计记录的持久化
// 红线: 前置校验未通过时不落任何行; 审计记录与决策同源
// ==========================================

use crate::api::error::ScheduleError;
use crate::config::ConfigManager;
use crate::db::open_sqlite_connection;
use crate::domain::run::ScheduleRunOutcome;
use crate::engine::constraint_index::ConstraintIndex;
use crate::engine::greedy::GreedyBuilder;
use crate::engine::optimizer::SwapOptimizer;
use crate::engine::profile::ProfileBuilder;
use crate::engine::repair::RepairEngine;
use crate::engine::state::ScheduleState;
use crate::engine::weekend::WeekendBalancer;
use crate::repository::{
    RepositoryResult, ScheduleAuditRepository, ScheduleRunRepository, ShiftDemandRepository,
    WorkforceRepository,
};
use chrono::NaiveDate;
use rand::Rng;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

// ==========================================
// ScheduleGenerator - 排班生成器
// ==========================================

pub struct ScheduleGenerator {
    workforce_repo: WorkforceRepository,
    demand_repo: ShiftDemandRepository,
    run_repo: ScheduleRunRepository,
    audit_repo: ScheduleAuditRepository,
    config: ConfigManager,
}

impl ScheduleGenerator {
    /// 打开数据库并创建生成器
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建生成器 (所有仓储共享同一连接)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        Ok(Self {
            workforce_repo: WorkforceRepository::from_connection(conn.clone()),
            demand_repo: ShiftDemandRepository::from_connection(conn.clone()),
            run_repo: ScheduleRunRepository::from_connection(conn.clone()),
            audit_repo: ScheduleAuditRepository::from_connection(conn.clone()),
            config: ConfigManager::from_connection(conn)?,
        })
    }

    /// 生成一个月的完整排班
    ///
    /// # 规则
    /// - 区间、需求、员工三项前置校验全部通过后才创建运行记录
    /// - overwrite 只清理该门店该区间内的旧排班, 审计历史保留
    /// - 分配顺序: 贪心构建 -> 工时修复/缺口回填 -> 周末均衡 -> 随机优化
    /// - 候选与班次审计来自贪心阶段的评估现场; 缺口按最终排班表统计
    ///   (修复遍可能已补上贪心期的缺口)
    ///
    /// # 参数
    /// - rng: 随机互换优化使用的随机源, 由调用方注入以便复现
    ///
    /// # 返回
    /// 运行ID与需求/分配/缺口计数
    #[instrument(skip(self, rng), fields(
        company_id = %company_id,
        studio_id = %studio_id,
        month_start = %month_start,
        month_end = %month_end,
        overwrite = overwrite,
    ))]
    pub fn generate_month_schedule(
        &self,
        company_id: &str,
        studio_id: &str,
        month_start: NaiveDate,
        month_end: NaiveDate,
        overwrite: bool,
        rng: &mut impl Rng,
    ) -> Result<ScheduleRunOutcome, ScheduleError> {
        info!("开始生成月度排班");

        // ==========================================
        // 步骤1: 校验排班区间
        // ==========================================
        debug!("步骤1: 校验排班区间");

        if month_end < month_start {
            return Err(ScheduleError::InvalidRange {
                month_start,
                month_end,
            });
        }

        // ==========================================
        // 步骤2: 加载需求班次
        // ==========================================
        debug!("步骤2: 加载需求班次");

        let demand = self
            .demand_repo
            .find_demand_for_range(studio_id, month_start, month_end)?;
        if demand.is_empty() {
            return Err(ScheduleError::NoDemand {
                studio_id: studio_id.to_string(),
                month_start,
                month_end,
            });
        }

        info!(demand_count = demand.len(), "需求班次加载完成");

        // ==========================================
        // 步骤3: 加载员工与约束数据
        // ==========================================
        debug!("步骤3: 加载员工与约束数据");

        let employees = self.workforce_repo.find_active_employees(company_id)?;
        if employees.is_empty() {
            return Err(ScheduleError::NoEligibleWorkforce {
                company_id: company_id.to_string(),
            });
        }

        let rules = self.workforce_repo.find_rules_for_company(company_id)?;
        let availability = self
            .workforce_repo
            .find_availability_for_company(company_id)?;
        let unavailability = self
            .workforce_repo
            .find_unavailability_for_company(company_id)?;
        let pto = self
            .workforce_repo
            .find_pto_in_range(company_id, month_start, month_end)?;
        let time_off = self
            .workforce_repo
            .find_time_off_in_range(company_id, month_start, month_end)?;

        info!(
            employee_count = employees.len(),
            rule_count = rules.len(),
            availability_count = availability.len(),
            unavailability_count = unavailability.len(),
            pto_count = pto.len(),
            time_off_count = time_off.len(),
            "员工与约束数据加载完成"
        );

        // ==========================================
        // 步骤4: 创建排班运行记录
        // ==========================================
        debug!("步骤4: 创建排班运行记录");

        let run = self
            .run_repo
            .create_run(company_id, studio_id, month_start, month_end)
            .map_err(ScheduleError::RunCreationFailure)?;
        let run_id = run.schedule_run_id.clone();

        info!(run_id = %run_id, "排班运行记录创建完成");

        // ==========================================
        // 步骤5: 覆盖模式清理旧排班
        // ==========================================
        if overwrite {
            debug!("步骤5: 覆盖模式清理旧排班");

            let deleted = self
                .run_repo
                .delete_assignments_for_range(studio_id, month_start, month_end)?;

            info!(deleted_count = deleted, "旧排班清理完成");
        }

        // ==========================================
        // 步骤6: 构建员工画像、硬约束索引与配置快照
        // ==========================================
        debug!("步骤6: 构建员工画像、硬约束索引与配置快照");

        let profiles = ProfileBuilder::build(&employees, &rules);
        let index = ConstraintIndex::build(&availability, &unavailability, &pto, &time_off);
        let weights = self.config.get_scheduler_weights()?;
        let limits = self.config.get_pass_limits()?;
        let mut state = ScheduleState::new();

        // ==========================================
        // 步骤7: 贪心构建初始排班
        // ==========================================
        debug!("步骤7: 贪心构建初始排班");

        let audits = GreedyBuilder::run(
            &run_id,
            &demand,
            &employees,
            &profiles,
            &index,
            &mut state,
            &weights,
        );

        info!(assigned_count = state.len(), "贪心构建完成");

        // ==========================================
        // 步骤8: 工时修复与缺口回填
        // ==========================================
        debug!("步骤8: 工时修复与缺口回填");

        let repair_swaps =
            RepairEngine::repair_hour_deficits(&profiles, &index, &mut state, limits.max_repair_swaps);
        let backfilled = RepairEngine::fill_unfilled_slots(&demand, &profiles, &index, &mut state);

        info!(
            repair_swaps = repair_swaps,
            backfilled = backfilled,
            "工时修复与缺口回填完成"
        );

        // ==========================================
        // 步骤9: 周末偏好互换与周末覆盖保障
        // ==========================================
        debug!("步骤9: 周末偏好互换与周末覆盖保障");

        let preference_swaps = WeekendBalancer::swap_for_preferences(
            &profiles,
            &index,
            &mut state,
            limits.max_preference_swaps,
        );
        let weekend_backfills =
            WeekendBalancer::ensure_weekend_coverage(&demand, &profiles, &index, &mut state);

        info!(
            preference_swaps = preference_swaps,
            weekend_backfills = weekend_backfills,
            "周末均衡完成"
        );

        // ==========================================
        // 步骤10: 随机互换优化
        // ==========================================
        debug!("步骤10: 随机互换优化");

        let improved_swaps = SwapOptimizer::optimize(
            &profiles,
            &index,
            &mut state,
            &weights,
            limits.optimization_swap_attempts,
            rng,
        );

        info!(improved_swaps = improved_swaps, "随机互换优化完成");

        // ==========================================
        // 步骤11: 持久化排班与审计记录
        // ==========================================
        debug!("步骤11: 持久化排班与审计记录");

        let inserted = self
            .run_repo
            .batch_insert_assignments(&run_id, studio_id, state.assignments())?;
        let candidate_rows = self
            .audit_repo
            .batch_upsert_candidates(&audits.candidate_audits)?;
        let shift_rows = self
            .audit_repo
            .batch_upsert_shift_audits(&audits.shift_audits)?;

        let unfilled_count: i64 = demand
            .iter()
            .map(|shift| {
                let assigned = state.assigned_count_for_slot(
                    shift.shift_date,
                    &shift.label,
                    shift.start_minute,
                    shift.end_minute,
                );
                (shift.required_count - assigned).max(0)
            })
            .sum();

        let outcome = ScheduleRunOutcome {
            run_id,
            demand_count: demand.len() as i64,
            assigned_count: state.len() as i64,
            unfilled_count,
        };

        info!(
            run_id = %outcome.run_id,
            inserted_count = inserted,
            candidate_rows = candidate_rows,
            shift_rows = shift_rows,
            assigned_count = outcome.assigned_count,
            unfilled_count = outcome.unfilled_count,
            "月度排班生成完成"
        );

        Ok(outcome)
    }
}

// ==========================================
// 单元测试
// ==========================================
