// ==========================================
// 门店月度排班引擎 - 工时修复
// ==========================================
// 职责: 贪心分配后的两道修复
//   1. 欠时全职 ← 超时兼职: 把兼职的班次改派给全职
//   2. 缺口回填: 人数未达标的班次补欠时全职
// 红线: 任何改派/回填前必须通过硬约束校验;
//       修复只改排班表, 不追加审计快照
// ==========================================

use crate::domain::employee::EmployeeProfile;
use crate::domain::{AssignedShift, ShiftDemand};
use crate::engine::constraint_index::ConstraintIndex;
use crate::engine::scorer::FT_MIN_HOURS_PER_WEEK;
use crate::engine::state::ScheduleState;
use crate::engine::timeline::{weekly_equivalent_hours, WEEKS_PER_MONTH};
use crate::engine::validator::HardConstraintValidator;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// 全职周工时回填上限 (修复不把任何人推过该线)
const FT_MAX_HOURS_PER_WEEK: f64 = 40.0;

/// 兼职让渡下限: 改派后不得低于理想周工时的该比例
const PT_FLOOR_RATIO: f64 = 0.7;

// ==========================================
// RepairEngine - 工时修复器
// ==========================================
pub struct RepairEngine;

impl RepairEngine {
    /// 欠时全职与超时兼职之间的班次改派
    ///
    /// # 规则
    /// - 欠时全职 (周均 < 30h) 按缺口降序, 超时兼职 (周均 > 理想值) 按超额降序
    /// - 每对 (全职, 兼职) 尝试兼职名下班次, 时长长者优先
    /// - 改派成立须同时满足:
    ///   全职通过硬约束校验、兼职改派后不低于理想值的 70%、
    ///   全职改派后工时严格增加且不超过 40h/周
    /// - 一对之间最多改派一班; 全局改派次数受 max_swaps 限制
    ///
    /// # 返回
    /// 实际改派次数
    pub fn repair_hour_deficits(
        profiles: &HashMap<String, EmployeeProfile>,
        index: &ConstraintIndex,
        state: &mut ScheduleState,
        max_swaps: usize,
    ) -> usize {
        let ft_under = Self::ft_deficits(profiles, state);
        let pt_over = Self::pt_overages(profiles, state);
        if ft_under.is_empty() || pt_over.is_empty() {
            return 0;
        }

        let mut swaps = 0usize;
        'pairs: for (ft_id, deficit) in &ft_under {
            for (pt_id, _) in &pt_over {
                if swaps >= max_swaps {
                    break 'pairs;
                }

                // 兼职名下班次, 时长降序 (先让渡长班以尽快补缺)
                let mut shift_idxs: Vec<usize> = state
                    .assignments()
                    .iter()
                    .enumerate()
                    .filter(|(_, a)| a.employee_id == *pt_id)
                    .map(|(i, _)| i)
                    .collect();
                shift_idxs
                    .sort_by_key(|&i| std::cmp::Reverse(state.assignments()[i].duration_minutes()));

                for &i in &shift_idxs {
                    let shift = state.assignments()[i].clone();
                    let (ok, _) = HardConstraintValidator::is_eligible(
                        ft_id,
                        shift.shift_date,
                        shift.day_of_week,
                        shift.start_minute,
                        shift.end_minute,
                        index,
                        state,
                    );
                    if !ok {
                        continue;
                    }

                    let duration = i64::from(shift.duration_minutes());
                    let pt_after = weekly_equivalent_hours(state.minutes_of(pt_id) - duration);
                    let ft_current = weekly_equivalent_hours(state.minutes_of(ft_id));
                    let ft_after = weekly_equivalent_hours(state.minutes_of(ft_id) + duration);

                    let ideal = profiles
                        .get(pt_id)
                        .and_then(|p| p.ideal_hours_weekly)
                        .unwrap_or(0.0);
                    if pt_after < ideal * PT_FLOOR_RATIO {
                        continue;
                    }
                    if ft_after <= ft_current {
                        continue;
                    }
                    if ft_after > FT_MAX_HOURS_PER_WEEK {
                        continue;
                    }

                    state.reassign(i, ft_id);
                    swaps += 1;
                    debug!(
                        from = %pt_id,
                        to = %ft_id,
                        shift_date = %shift.shift_date,
                        label = %shift.label,
                        deficit_hours = format!("{:.1}", deficit),
                        "改派班次补全职工时缺口"
                    );
                    break;
                }
            }
        }
        swaps
    }

    /// 缺口班次回填欠时全职
    ///
    /// # 规则
    /// - 按需求加载顺序扫描, 缺口 = 需求人数 - 当前已分配人数
    /// - 候选为欠时全职 (缺口降序); 通过硬约束校验且
    ///   回填后不超过 40h/周 才提交
    /// - 某员工回填后周均达到 30h 即退出候选名单
    ///
    /// # 返回
    /// 实际回填班次数
    pub fn fill_unfilled_slots(
        demand: &[ShiftDemand],
        profiles: &HashMap<String, EmployeeProfile>,
        index: &ConstraintIndex,
        state: &mut ScheduleState,
    ) -> usize {
        let mut ft_ids: Vec<String> = Self::ft_deficits(profiles, state)
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        let mut filled = 0usize;
        for shift in demand {
            let mut unassigned = shift.required_count
                - state.assigned_count_for_slot(
                    shift.shift_date,
                    &shift.label,
                    shift.start_minute,
                    shift.end_minute,
                );
            if unassigned <= 0 {
                continue;
            }

            let mut idx = 0;
            while idx < ft_ids.len() && unassigned > 0 {
                let eid = ft_ids[idx].clone();
                let (ok, _) = HardConstraintValidator::is_eligible(
                    &eid,
                    shift.shift_date,
                    shift.day_of_week,
                    shift.start_minute,
                    shift.end_minute,
                    index,
                    state,
                );
                if ok {
                    let duration = i64::from(shift.duration_minutes());
                    let after = weekly_equivalent_hours(state.minutes_of(&eid) + duration);
                    if after <= FT_MAX_HOURS_PER_WEEK {
                        state.commit(AssignedShift {
                            employee_id: eid.clone(),
                            shift_date: shift.shift_date,
                            day_of_week: shift.day_of_week,
                            label: shift.label.clone(),
                            start_minute: shift.start_minute,
                            end_minute: shift.end_minute,
                        });
                        unassigned -= 1;
                        filled += 1;
                        debug!(
                            employee_id = %eid,
                            shift_date = %shift.shift_date,
                            label = %shift.label,
                            "回填缺口班次"
                        );
                        // 达标者退出回填名单
                        if weekly_equivalent_hours(state.minutes_of(&eid))
                            >= FT_MIN_HOURS_PER_WEEK
                        {
                            ft_ids.remove(idx);
                            continue;
                        }
                    }
                }
                idx += 1;
            }
        }
        filled
    }

    // ===== 内部: 候选名单 =====

    /// 欠时全职: (员工ID, 月缺口小时), 缺口降序, 并列按员工ID
    fn ft_deficits(
        profiles: &HashMap<String, EmployeeProfile>,
        state: &ScheduleState,
    ) -> Vec<(String, f64)> {
        let mut list: Vec<(String, f64)> = profiles
            .values()
            .filter(|p| p.is_full_time())
            .filter_map(|p| {
                let weekly = weekly_equivalent_hours(state.minutes_of(&p.employee_id));
                if weekly < FT_MIN_HOURS_PER_WEEK {
                    Some((
                        p.employee_id.clone(),
                        (FT_MIN_HOURS_PER_WEEK - weekly) * WEEKS_PER_MONTH,
                    ))
                } else {
                    None
                }
            })
            .collect();
        list.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        list
    }

    /// 超时兼职: (员工ID, 月超额小时), 超额降序, 并列按员工ID
    ///
    /// # 说明
    /// 理想周工时缺失或为 0 的兼职不参与让渡
    fn pt_overages(
        profiles: &HashMap<String, EmployeeProfile>,
        state: &ScheduleState,
    ) -> Vec<(String, f64)> {
        let mut list: Vec<(String, f64)> = profiles
            .values()
            .filter(|p| p.is_part_time())
            .filter_map(|p| match p.ideal_hours_weekly {
                Some(ideal) if ideal > 0.0 => {
                    let weekly = weekly_equivalent_hours(state.minutes_of(&p.employee_id));
                    if weekly > ideal {
                        Some((p.employee_id.clone(), (weekly - ideal) * WEEKS_PER_MONTH))
                    } else {
                        None
                    }
                }
                _ => None,
            })
            .collect();
        list.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        list
    }
}
