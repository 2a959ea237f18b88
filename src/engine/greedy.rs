// ==========================================
// 门店月度排班引擎 - 贪心分配构建器
// ==========================================
// 职责: 按稀缺度顺序为每个需求班次挑选得分最高的合格员工
// 审计: 评估一次, 记录一次 —— 候选审计与选择决策出自同一次评估,
//       提交后不再重算 (提交会改变状态, 重算会失真)
// ==========================================

use crate::config::SchedulerWeights;
use crate::domain::audit::{AuditCandidateRecord, AuditShiftRecord, CandidateDetails};
use crate::domain::employee::EmployeeProfile;
use crate::domain::types::{HardRule, SoftReason};
use crate::domain::{AssignedShift, Employee, ShiftDemand};
use crate::engine::constraint_index::ConstraintIndex;
use crate::engine::scorer::SoftScorer;
use crate::engine::state::ScheduleState;
use crate::engine::validator::HardConstraintValidator;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

// ==========================================
// 内部评估结果 (一名员工对一个班次)
// ==========================================
struct CandidateEvaluation {
    employee_id: String,
    eligible: bool,
    hard_reasons: Vec<HardRule>,
    score: f64,
    soft_reasons: Vec<SoftReason>,
    minutes_so_far: i64,
}

// ==========================================
// GreedyOutcome - 贪心阶段产出的审计记录
// ==========================================
pub struct GreedyOutcome {
    pub candidate_audits: Vec<AuditCandidateRecord>,
    pub shift_audits: Vec<AuditShiftRecord>,
}

// ==========================================
// GreedyBuilder - 贪心分配
// ==========================================
pub struct GreedyBuilder;

impl GreedyBuilder {
    /// 执行贪心分配
    ///
    /// # 规则
    /// 1. 预统计每个班次的合格候选数, 候选少的班次先排 (稳定排序, 并列保持加载顺序)
    /// 2. 逐班次: 对全部员工各做一次硬约束校验;
    ///    合格者按当时已累计分钟数打分, 不合格者的全部违规标签计入直方图
    /// 3. 候选按 (得分降序, 员工ID升序) 排序, 取前 required_count 名提交
    /// 4. 审计记录直接采用本次评估結果: 每 (班次, 员工) 一条候选记录,
    ///    每班次一条覆盖汇总
    ///
    /// # 返回
    /// 审计记录束 (由调用方持久化); 分配结果写入 state
    pub fn run(
        run_id: &str,
        demand: &[ShiftDemand],
        employees: &[Employee],
        profiles: &HashMap<String, EmployeeProfile>,
        index: &ConstraintIndex,
        state: &mut ScheduleState,
        weights: &SchedulerWeights,
    ) -> GreedyOutcome {
        // 步骤 1: 稀缺度预统计 (相对当前状态, 进入时为空)
        let mut order: Vec<(usize, usize)> = demand
            .iter()
            .enumerate()
            .map(|(idx, shift)| {
                let count = employees
                    .iter()
                    .filter(|employee| {
                        let (ok, _) = HardConstraintValidator::is_eligible(
                            &employee.employee_id,
                            shift.shift_date,
                            shift.day_of_week,
                            shift.start_minute,
                            shift.end_minute,
                            index,
                            state,
                        );
                        ok
                    })
                    .count();
                (idx, count)
            })
            .collect();
        order.sort_by_key(|(_, count)| *count);

        let mut candidate_audits: Vec<AuditCandidateRecord> = Vec::new();
        let mut shift_audits: Vec<AuditShiftRecord> = Vec::new();

        // 步骤 2-4: 逐班次评估、选择、提交、记审计
        for (shift_idx, _) in order {
            let shift = &demand[shift_idx];
            let mut evaluations: Vec<CandidateEvaluation> = Vec::with_capacity(employees.len());
            let mut rejection_summary: BTreeMap<String, i64> = BTreeMap::new();

            for employee in employees {
                let eid = employee.employee_id.as_str();
                let minutes_so_far = state.minutes_of(eid);
                let (eligible, hard_reasons) = HardConstraintValidator::is_eligible(
                    eid,
                    shift.shift_date,
                    shift.day_of_week,
                    shift.start_minute,
                    shift.end_minute,
                    index,
                    state,
                );

                let (score, soft_reasons) = if eligible {
                    match profiles.get(eid) {
                        Some(profile) => SoftScorer::score(
                            profile,
                            shift.shift_date,
                            shift.day_of_week,
                            &shift.label,
                            shift.start_minute,
                            shift.end_minute,
                            minutes_so_far,
                            state,
                            weights,
                        ),
                        None => (0.0, Vec::new()),
                    }
                } else {
                    for reason in &hard_reasons {
                        *rejection_summary.entry(reason.to_string()).or_insert(0) += 1;
                    }
                    (0.0, Vec::new())
                };

                evaluations.push(CandidateEvaluation {
                    employee_id: eid.to_string(),
                    eligible,
                    hard_reasons,
                    score,
                    soft_reasons,
                    minutes_so_far,
                });
            }

            // 候选排序: 得分降序, 员工ID升序兜底保证确定性
            let mut ranked: Vec<&CandidateEvaluation> =
                evaluations.iter().filter(|e| e.eligible).collect();
            ranked.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.employee_id.cmp(&b.employee_id))
            });

            let needed = shift.required_count.max(0) as usize;
            let selected: HashSet<String> = ranked
                .iter()
                .take(needed)
                .map(|e| e.employee_id.clone())
                .collect();

            for eid in ranked.iter().take(needed).map(|e| e.employee_id.clone()) {
                state.commit(AssignedShift {
                    employee_id: eid,
                    shift_date: shift.shift_date,
                    day_of_week: shift.day_of_week,
                    label: shift.label.clone(),
                    start_minute: shift.start_minute,
                    end_minute: shift.end_minute,
                });
            }

            let assigned_count = selected.len() as i64;
            let candidate_count = ranked.len() as i64;
            debug!(
                shift_date = %shift.shift_date,
                label = %shift.label,
                required = shift.required_count,
                candidates = candidate_count,
                assigned = assigned_count,
                "班次分配完成"
            );

            // 候选审计: 评估即记录
            for eval in &evaluations {
                candidate_audits.push(AuditCandidateRecord {
                    schedule_run_id: run_id.to_string(),
                    shift_date: shift.shift_date,
                    label: shift.label.clone(),
                    start_minute: shift.start_minute,
                    end_minute: shift.end_minute,
                    employee_id: eval.employee_id.clone(),
                    eligible: eval.eligible,
                    rejection_reason: eval.hard_reasons.first().map(ToString::to_string),
                    details: CandidateDetails {
                        selected: selected.contains(&eval.employee_id),
                        minutes_so_far: eval.minutes_so_far,
                        hard_reasons: eval.hard_reasons.iter().map(ToString::to_string).collect(),
                        score: eval.score,
                        soft_reasons: eval.soft_reasons.iter().map(ToString::to_string).collect(),
                    },
                });
            }

            shift_audits.push(AuditShiftRecord {
                schedule_run_id: run_id.to_string(),
                shift_date: shift.shift_date,
                label: shift.label.clone(),
                start_minute: shift.start_minute,
                end_minute: shift.end_minute,
                required_count: shift.required_count,
                assigned_count,
                candidate_count,
                missing_count: (shift.required_count - assigned_count).max(0),
                rejection_summary,
            });
        }

        GreedyOutcome {
            candidate_audits,
            shift_audits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::employee::{DateRangeBlock, EmployeeAvailability, EmployeeRule};
    use crate::engine::profile::ProfileBuilder;
    use crate::engine::timeline::day_of_week;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn employee(id: &str) -> Employee {
        Employee {
            employee_id: id.to_string(),
            company_id: "c1".to_string(),
            name: format!("员工-{}", id),
            is_active: true,
        }
    }

    fn rule(id: &str, eid: &str, rule_type: &str, value: &str) -> EmployeeRule {
        EmployeeRule {
            rule_id: id.to_string(),
            employee_id: eid.to_string(),
            rule_type: rule_type.to_string(),
            value_json: value.to_string(),
        }
    }

    fn avail(eid: &str, dow: u8, start: i32, end: i32) -> EmployeeAvailability {
        EmployeeAvailability {
            availability_id: format!("a-{}-{}", eid, dow),
            employee_id: eid.to_string(),
            day_of_week: dow,
            start_minute: start,
            end_minute: end,
        }
    }

    fn demand_row(date: &str, label: &str, start: i32, end: i32, required: i64) -> ShiftDemand {
        let shift_date = d(date);
        ShiftDemand {
            shift_date,
            day_of_week: day_of_week(shift_date),
            label: label.to_string(),
            start_minute: start,
            end_minute: end,
            required_count: required,
        }
    }

    // ==========================================
    // 测试 1: 稀缺班次优先
    // ==========================================

    #[test]
    fn test_scarce_shift_filled_first() {
        // 2025-03-03 为周一。e1 全天可用; e2 只能覆盖早班时段。
        // AM 与 PM 间隔不足 12 小时, 同一人无法兼任。
        // 加载顺序 AM 在前; 稀缺度排序应让 PM (仅 e1 合格) 先排,
        // 从而 AM 落到 e2, 两班都有人。
        let employees = vec![employee("e1"), employee("e2")];
        let availability = vec![
            avail("e1", 1, 0, 1440),
            avail("e2", 1, 240, 800),
        ];
        let profiles = ProfileBuilder::build(&employees, &[]);
        let index = ConstraintIndex::build(&availability, &[], &[], &[]);
        let mut state = ScheduleState::new();

        let demand = vec![
            demand_row("2025-03-03", "AM", 265, 745, 1),
            demand_row("2025-03-03", "PM", 750, 1230, 1),
        ];

        GreedyBuilder::run(
            "run-1",
            &demand,
            &employees,
            &profiles,
            &index,
            &mut state,
            &SchedulerWeights::default(),
        );

        assert_eq!(state.len(), 2, "两班都应有人");
        let pm = state
            .assignments()
            .iter()
            .find(|a| a.label == "PM")
            .unwrap();
        let am = state
            .assignments()
            .iter()
            .find(|a| a.label == "AM")
            .unwrap();
        assert_eq!(pm.employee_id, "e1");
        assert_eq!(am.employee_id, "e2");
    }

    // ==========================================
    // 测试 2: 二选一与审计选中标记
    // ==========================================

    #[test]
    fn test_two_eligible_one_slot_audit() {
        // e1 为全职, 分数远高于无规则的 e2; 单人班次应选 e1
        let employees = vec![employee("e1"), employee("e2")];
        let rules = vec![rule("r1", "e1", "EMPLOYMENT_TYPE", r#"{"type":"full_time"}"#)];
        let availability = vec![avail("e1", 1, 0, 1440), avail("e2", 1, 0, 1440)];
        let profiles = ProfileBuilder::build(&employees, &rules);
        let index = ConstraintIndex::build(&availability, &[], &[], &[]);
        let mut state = ScheduleState::new();

        let demand = vec![demand_row("2025-03-03", "AM", 265, 745, 1)];
        let outcome = GreedyBuilder::run(
            "run-1",
            &demand,
            &employees,
            &profiles,
            &index,
            &mut state,
            &SchedulerWeights::default(),
        );

        assert_eq!(state.len(), 1);
        assert_eq!(state.assignments()[0].employee_id, "e1");

        // 每员工一条候选记录
        assert_eq!(outcome.candidate_audits.len(), 2);
        let e1_audit = outcome
            .candidate_audits
            .iter()
            .find(|a| a.employee_id == "e1")
            .unwrap();
        let e2_audit = outcome
            .candidate_audits
            .iter()
            .find(|a| a.employee_id == "e2")
            .unwrap();
        assert!(e1_audit.eligible && e1_audit.details.selected);
        assert!(e2_audit.eligible && !e2_audit.details.selected);
        assert!(e1_audit.details.score > e2_audit.details.score);

        let shift_audit = &outcome.shift_audits[0];
        assert_eq!(shift_audit.required_count, 1);
        assert_eq!(shift_audit.assigned_count, 1);
        assert_eq!(shift_audit.candidate_count, 2);
        assert_eq!(shift_audit.missing_count, 0);
    }

    // ==========================================
    // 测试 3: 拒绝原因与直方图
    // ==========================================

    #[test]
    fn test_rejection_reason_and_summary() {
        let employees = vec![employee("e1"), employee("e2")];
        let availability = vec![avail("e1", 1, 0, 1440), avail("e2", 1, 0, 1440)];
        let pto = vec![DateRangeBlock {
            block_id: "p1".to_string(),
            employee_id: "e2".to_string(),
            start_date: d("2025-03-03"),
            end_date: d("2025-03-03"),
            note: None,
        }];
        let profiles = ProfileBuilder::build(&employees, &[]);
        let index = ConstraintIndex::build(&availability, &[], &pto, &[]);
        let mut state = ScheduleState::new();

        let demand = vec![demand_row("2025-03-03", "AM", 265, 745, 2)];
        let outcome = GreedyBuilder::run(
            "run-1",
            &demand,
            &employees,
            &profiles,
            &index,
            &mut state,
            &SchedulerWeights::default(),
        );

        let e2_audit = outcome
            .candidate_audits
            .iter()
            .find(|a| a.employee_id == "e2")
            .unwrap();
        assert!(!e2_audit.eligible);
        assert_eq!(e2_audit.rejection_reason.as_deref(), Some("pto"));
        assert_eq!(e2_audit.details.score, 0.0);

        let shift_audit = &outcome.shift_audits[0];
        assert_eq!(shift_audit.rejection_summary.get("pto"), Some(&1));
        // 需求 2 人只有 1 人合格
        assert_eq!(shift_audit.assigned_count, 1);
        assert_eq!(shift_audit.missing_count, 1);
        assert_eq!(
            shift_audit.assigned_count + shift_audit.missing_count,
            shift_audit.required_count
        );
    }

    // ==========================================
    // 测试 4: 审计完整性
    // ==========================================

    #[test]
    fn test_audit_rows_cover_demand_times_employees() {
        let employees = vec![employee("e1"), employee("e2"), employee("e3")];
        let availability: Vec<EmployeeAvailability> = employees
            .iter()
            .flat_map(|e| (0u8..7).map(move |dow| avail(&e.employee_id, dow, 0, 1440)))
            .collect();
        let profiles = ProfileBuilder::build(&employees, &[]);
        let index = ConstraintIndex::build(&availability, &[], &[], &[]);
        let mut state = ScheduleState::new();

        let demand = vec![
            demand_row("2025-03-03", "AM", 265, 745, 1),
            demand_row("2025-03-04", "AM", 265, 745, 1),
            demand_row("2025-03-05", "PM", 750, 1230, 2),
        ];
        let outcome = GreedyBuilder::run(
            "run-1",
            &demand,
            &employees,
            &profiles,
            &index,
            &mut state,
            &SchedulerWeights::default(),
        );

        assert_eq!(outcome.candidate_audits.len(), demand.len() * employees.len());
        assert_eq!(outcome.shift_audits.len(), demand.len());
    }
}
