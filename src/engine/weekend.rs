// ==========================================
// 门店月度排班引擎 - 周末均衡
// ==========================================
// 职责: 周末班次的两道均衡
//   1. 偏好互换: 想周六排了周日 × 想周日排了周六, 两两对调
//   2. 覆盖兜底: 整月无周末班的员工补一个有缺口的周末班
// 红线: 互换/补班都必须通过硬约束校验;
//       互换不得让任何全职跌破 30h/周
// ==========================================

use crate::domain::employee::EmployeeProfile;
use crate::domain::types::WeekendPreference;
use crate::domain::{AssignedShift, ShiftDemand};
use crate::engine::constraint_index::ConstraintIndex;
use crate::engine::scorer::FT_MIN_HOURS_PER_WEEK;
use crate::engine::state::ScheduleState;
use crate::engine::timeline::{is_saturday, is_sunday, weekly_equivalent_hours};
use crate::engine::validator::HardConstraintValidator;
use std::collections::HashMap;
use tracing::debug;

// ==========================================
// WeekendBalancer - 周末均衡器
// ==========================================
pub struct WeekendBalancer;

impl WeekendBalancer {
    /// 周末偏好互换
    ///
    /// # 规则
    /// - 只考虑周末班且偏好为具体某天 (周六/周日) 却排错天的员工
    /// - 互换条件: 两人偏好互补 (甲想周六排了周日, 乙想周日排了周六),
    ///   且双方接收对方班次都通过硬约束校验 (以当前排班表为准)
    /// - 全职互换后周均不得低于 30h (班次时长不同会产生净变化)
    /// - 反复整表扫描直到一轮无互换或达到次数上限
    ///
    /// # 返回
    /// 实际互换次数
    pub fn swap_for_preferences(
        profiles: &HashMap<String, EmployeeProfile>,
        index: &ConstraintIndex,
        state: &mut ScheduleState,
        max_swaps: usize,
    ) -> usize {
        let mut swaps = 0usize;
        for _ in 0..max_swaps {
            if swaps >= max_swaps {
                break;
            }
            let mut swapped = false;

            for i in 0..state.len() {
                let a_i = state.assignments()[i].clone();
                if !a_i.is_weekend() {
                    continue;
                }
                let Some(p1) = profiles.get(&a_i.employee_id) else {
                    continue;
                };
                if !p1.weekend_preference.is_specific() {
                    continue;
                }
                let pref1 = p1.weekend_preference;
                let matches1 = (pref1 == WeekendPreference::Saturday
                    && is_saturday(a_i.day_of_week))
                    || (pref1 == WeekendPreference::Sunday && is_sunday(a_i.day_of_week));
                if matches1 {
                    continue;
                }

                for j in (i + 1)..state.len() {
                    let a_j = state.assignments()[j].clone();
                    if !a_j.is_weekend() {
                        continue;
                    }
                    let Some(p2) = profiles.get(&a_j.employee_id) else {
                        continue;
                    };
                    if !p2.weekend_preference.is_specific() {
                        continue;
                    }
                    let pref2 = p2.weekend_preference;

                    // 互补错位: 对调后双方都落在偏好那天
                    let cross = (pref1 == WeekendPreference::Saturday
                        && is_sunday(a_i.day_of_week)
                        && pref2 == WeekendPreference::Sunday
                        && is_saturday(a_j.day_of_week))
                        || (pref1 == WeekendPreference::Sunday
                            && is_saturday(a_i.day_of_week)
                            && pref2 == WeekendPreference::Saturday
                            && is_sunday(a_j.day_of_week));
                    if !cross {
                        continue;
                    }

                    let (ok1, _) = HardConstraintValidator::is_eligible(
                        &a_i.employee_id,
                        a_j.shift_date,
                        a_j.day_of_week,
                        a_j.start_minute,
                        a_j.end_minute,
                        index,
                        state,
                    );
                    let (ok2, _) = HardConstraintValidator::is_eligible(
                        &a_j.employee_id,
                        a_i.shift_date,
                        a_i.day_of_week,
                        a_i.start_minute,
                        a_i.end_minute,
                        index,
                        state,
                    );
                    if !(ok1 && ok2) {
                        continue;
                    }

                    // 班次时长不同, 互换有净工时变化
                    let dur_i = i64::from(a_i.duration_minutes());
                    let dur_j = i64::from(a_j.duration_minutes());
                    let e1_after = weekly_equivalent_hours(
                        state.minutes_of(&a_i.employee_id) - dur_i + dur_j,
                    );
                    let e2_after = weekly_equivalent_hours(
                        state.minutes_of(&a_j.employee_id) - dur_j + dur_i,
                    );
                    if p1.is_full_time() && e1_after < FT_MIN_HOURS_PER_WEEK {
                        continue;
                    }
                    if p2.is_full_time() && e2_after < FT_MIN_HOURS_PER_WEEK {
                        continue;
                    }

                    state.swap_employees(i, j);
                    swaps += 1;
                    swapped = true;
                    debug!(
                        employee_a = %a_i.employee_id,
                        employee_b = %a_j.employee_id,
                        date_a = %a_i.shift_date,
                        date_b = %a_j.shift_date,
                        "周末偏好互换"
                    );
                    break;
                }
            }

            if !swapped {
                break;
            }
        }
        swaps
    }

    /// 周末覆盖兜底
    ///
    /// # 规则
    /// - 员工按ID顺序逐一检查; 已有周末班的跳过
    /// - 按需求加载顺序找第一个有缺口且通过硬约束校验的周末班补上
    /// - 每人最多补一班; 无缺口或校验全拒则保持无周末班
    ///
    /// # 返回
    /// 实际补班次数
    pub fn ensure_weekend_coverage(
        demand: &[ShiftDemand],
        profiles: &HashMap<String, EmployeeProfile>,
        index: &ConstraintIndex,
        state: &mut ScheduleState,
    ) -> usize {
        let mut employee_ids: Vec<&String> = profiles.keys().collect();
        employee_ids.sort();

        let mut backfills = 0usize;
        for eid in employee_ids {
            if state.has_weekend_shift(eid) {
                continue;
            }

            for shift in demand {
                if !shift.is_weekend() {
                    continue;
                }
                let assigned = state.assigned_count_for_slot(
                    shift.shift_date,
                    &shift.label,
                    shift.start_minute,
                    shift.end_minute,
                );
                if assigned >= shift.required_count {
                    continue;
                }
                let (ok, _) = HardConstraintValidator::is_eligible(
                    eid,
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

                state.commit(AssignedShift {
                    employee_id: eid.clone(),
                    shift_date: shift.shift_date,
                    day_of_week: shift.day_of_week,
                    label: shift.label.clone(),
                    start_minute: shift.start_minute,
                    end_minute: shift.end_minute,
                });
                backfills += 1;
                debug!(
                    employee_id = %eid,
                    shift_date = %shift.shift_date,
                    label = %shift.label,
                    "补周末班"
                );
                break;
            }
        }
        backfills
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::employee::{DateRangeBlock, EmployeeAvailability};
    use crate::domain::types::EmploymentType;
    use crate::engine::timeline::day_of_week;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn profile(
        eid: &str,
        employment: EmploymentType,
        pref: WeekendPreference,
    ) -> EmployeeProfile {
        let mut p = EmployeeProfile::new(eid);
        p.employment_type = employment;
        p.weekend_preference = pref;
        p
    }

    fn profile_map(entries: Vec<EmployeeProfile>) -> HashMap<String, EmployeeProfile> {
        entries
            .into_iter()
            .map(|p| (p.employee_id.clone(), p))
            .collect()
    }

    fn all_week_avail(eids: &[&str]) -> Vec<EmployeeAvailability> {
        eids.iter()
            .flat_map(|eid| {
                (0u8..7).map(move |dow| EmployeeAvailability {
                    availability_id: format!("a-{}-{}", eid, dow),
                    employee_id: eid.to_string(),
                    day_of_week: dow,
                    start_minute: 0,
                    end_minute: 1440,
                })
            })
            .collect()
    }

    fn assigned(eid: &str, date: &str, label: &str, start: i32, end: i32) -> AssignedShift {
        let date_parsed = d(date);
        AssignedShift {
            employee_id: eid.to_string(),
            shift_date: date_parsed,
            day_of_week: day_of_week(date_parsed),
            label: label.to_string(),
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
    // 测试 1: 互补错位对调
    // ==========================================

    #[test]
    fn test_complementary_mismatch_swapped() {
        // 2025-03-08 周六 / 2025-03-09 周日
        // e1 想周日却排了周六, e2 想周六却排了周日
        let profiles = profile_map(vec![
            profile("e1", EmploymentType::Unknown, WeekendPreference::Sunday),
            profile("e2", EmploymentType::Unknown, WeekendPreference::Saturday),
        ]);
        let index = ConstraintIndex::build(&all_week_avail(&["e1", "e2"]), &[], &[], &[]);
        let mut state = ScheduleState::new();
        state.commit(assigned("e1", "2025-03-08", "SAT_0530_1230", 330, 750));
        state.commit(assigned("e2", "2025-03-09", "SUN_0745_1330", 465, 810));

        let swaps = WeekendBalancer::swap_for_preferences(&profiles, &index, &mut state, 50);

        assert_eq!(swaps, 1);
        assert_eq!(state.assignments()[0].employee_id, "e2", "周六班归想周六的");
        assert_eq!(state.assignments()[1].employee_id, "e1", "周日班归想周日的");
        assert!(state.totals_consistent());
    }

    // ==========================================
    // 测试 2: 偏好不互补不对调
    // ==========================================

    #[test]
    fn test_same_preference_not_swapped() {
        // 两人都想周六, 都排了周日: 对调毫无意义
        let profiles = profile_map(vec![
            profile("e1", EmploymentType::Unknown, WeekendPreference::Saturday),
            profile("e2", EmploymentType::Unknown, WeekendPreference::Saturday),
        ]);
        let index = ConstraintIndex::build(&all_week_avail(&["e1", "e2"]), &[], &[], &[]);
        let mut state = ScheduleState::new();
        state.commit(assigned("e1", "2025-03-09", "SUN_0745_1330", 465, 810));
        state.commit(assigned("e2", "2025-03-09", "SUN_A", 480, 840));

        let swaps = WeekendBalancer::swap_for_preferences(&profiles, &index, &mut state, 50);
        assert_eq!(swaps, 0);
        assert_eq!(state.assignments()[0].employee_id, "e1");
    }

    // ==========================================
    // 测试 3: 全职工时保护
    // ==========================================

    #[test]
    fn test_ft_below_target_not_swapped() {
        // e1 为全职且远低于 30h/周, 互换后仍低于下限, 保护规则拦截
        let profiles = profile_map(vec![
            profile("e1", EmploymentType::FullTime, WeekendPreference::Sunday),
            profile("e2", EmploymentType::Unknown, WeekendPreference::Saturday),
        ]);
        let index = ConstraintIndex::build(&all_week_avail(&["e1", "e2"]), &[], &[], &[]);
        let mut state = ScheduleState::new();
        state.commit(assigned("e1", "2025-03-08", "SAT_0530_1230", 330, 750));
        state.commit(assigned("e2", "2025-03-09", "SUN_0745_1330", 465, 810));

        let swaps = WeekendBalancer::swap_for_preferences(&profiles, &index, &mut state, 50);
        assert_eq!(swaps, 0);
        assert_eq!(state.assignments()[0].employee_id, "e1");
    }

    // ==========================================
    // 测试 4: 校验不过不对调
    // ==========================================

    #[test]
    fn test_swap_blocked_by_validator() {
        // e2 在周六有 PTO, 接不了 e1 的周六班
        let profiles = profile_map(vec![
            profile("e1", EmploymentType::Unknown, WeekendPreference::Sunday),
            profile("e2", EmploymentType::Unknown, WeekendPreference::Saturday),
        ]);
        let pto = vec![DateRangeBlock {
            block_id: "p1".to_string(),
            employee_id: "e2".to_string(),
            start_date: d("2025-03-08"),
            end_date: d("2025-03-08"),
            note: None,
        }];
        let index = ConstraintIndex::build(&all_week_avail(&["e1", "e2"]), &[], &pto, &[]);
        let mut state = ScheduleState::new();
        state.commit(assigned("e1", "2025-03-08", "SAT_0530_1230", 330, 750));
        state.commit(assigned("e2", "2025-03-09", "SUN_0745_1330", 465, 810));

        let swaps = WeekendBalancer::swap_for_preferences(&profiles, &index, &mut state, 50);
        assert_eq!(swaps, 0);
    }

    // ==========================================
    // 测试 5: 周末覆盖兜底
    // ==========================================

    #[test]
    fn test_coverage_backfills_missing_weekend() {
        let profiles = profile_map(vec![
            profile("e1", EmploymentType::Unknown, WeekendPreference::None),
            profile("e2", EmploymentType::Unknown, WeekendPreference::None),
        ]);
        let index = ConstraintIndex::build(&all_week_avail(&["e1", "e2"]), &[], &[], &[]);
        let mut state = ScheduleState::new();
        // e2 已有周末班, e1 没有
        state.commit(assigned("e2", "2025-03-08", "SAT_0530_1230", 330, 750));

        let demand = vec![
            demand_row("2025-03-05", "AM", 480, 960, 1),
            demand_row("2025-03-08", "SAT_0530_1230", 330, 750, 2),
        ];
        let backfills =
            WeekendBalancer::ensure_weekend_coverage(&demand, &profiles, &index, &mut state);

        assert_eq!(backfills, 1);
        assert!(state.has_weekend_shift("e1"));
        // e2 不再补
        assert_eq!(
            state.assigned_count_for_slot(d("2025-03-08"), "SAT_0530_1230", 330, 750),
            2
        );
    }

    #[test]
    fn test_coverage_respects_required_count() {
        // 唯一的周末班已满员, e1 保持无周末班
        let profiles = profile_map(vec![profile(
            "e1",
            EmploymentType::Unknown,
            WeekendPreference::None,
        )]);
        let index = ConstraintIndex::build(&all_week_avail(&["e1"]), &[], &[], &[]);
        let mut state = ScheduleState::new();
        state.commit(assigned("e9", "2025-03-08", "SAT_0530_1230", 330, 750));

        let demand = vec![demand_row("2025-03-08", "SAT_0530_1230", 330, 750, 1)];
        let backfills =
            WeekendBalancer::ensure_weekend_coverage(&demand, &profiles, &index, &mut state);

        assert_eq!(backfills, 0);
        assert!(!state.has_weekend_shift("e1"));
    }
}
