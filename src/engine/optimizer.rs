// ==========================================
// 门店月度排班引擎 - 随机交换优化器
// ==========================================
// 职责: 随机抽两条分配尝试互换员工, 软约束总分
//       严格提高才落地, 硬约束永不放松
// 红线: 随机源由调用方注入, 种子固定时结果可复现
// ==========================================

use crate::config::SchedulerWeights;
use crate::domain::employee::EmployeeProfile;
use crate::engine::constraint_index::ConstraintIndex;
use crate::engine::scorer::SoftScorer;
use crate::engine::state::ScheduleState;
use crate::engine::validator::HardConstraintValidator;
use rand::seq::index;
use rand::Rng;
use std::collections::HashMap;
use tracing::debug;

// ==========================================
// SwapOptimizer - 成对互换优化
// ==========================================
pub struct SwapOptimizer;

impl SwapOptimizer {
    /// 随机互换优化
    ///
    /// # 规则
    /// 1. 每轮随机抽两条不同的分配; 同一员工的两班直接跳过
    /// 2. 双方互接对方班次都要过硬约束校验 (以当前排班表为准)
    /// 3. 得分比较: 互换前 = 各自按当前累计分钟打分之和;
    ///    互换后 = 互接班次、分钟净调整后打分之和
    /// 4. 仅当互换后总分严格大于互换前才执行
    ///
    /// # 返回
    /// 实际互换次数
    pub fn optimize(
        profiles: &HashMap<String, EmployeeProfile>,
        index: &ConstraintIndex,
        state: &mut ScheduleState,
        weights: &SchedulerWeights,
        attempts: usize,
        rng: &mut impl Rng,
    ) -> usize {
        let mut improved = 0usize;
        for _ in 0..attempts {
            if state.len() < 2 {
                break;
            }

            let pair = index::sample(rng, state.len(), 2);
            let idx1 = pair.index(0);
            let idx2 = pair.index(1);
            let a1 = state.assignments()[idx1].clone();
            let a2 = state.assignments()[idx2].clone();
            if a1.employee_id == a2.employee_id {
                continue;
            }

            let (ok1, _) = HardConstraintValidator::is_eligible(
                &a2.employee_id,
                a1.shift_date,
                a1.day_of_week,
                a1.start_minute,
                a1.end_minute,
                index,
                state,
            );
            let (ok2, _) = HardConstraintValidator::is_eligible(
                &a1.employee_id,
                a2.shift_date,
                a2.day_of_week,
                a2.start_minute,
                a2.end_minute,
                index,
                state,
            );
            if !(ok1 && ok2) {
                continue;
            }

            let Some(p1) = profiles.get(&a1.employee_id) else {
                continue;
            };
            let Some(p2) = profiles.get(&a2.employee_id) else {
                continue;
            };

            let mins1 = state.minutes_of(&a1.employee_id);
            let mins2 = state.minutes_of(&a2.employee_id);
            let dur1 = i64::from(a1.duration_minutes());
            let dur2 = i64::from(a2.duration_minutes());

            let (score1_before, _) = SoftScorer::score(
                p1,
                a1.shift_date,
                a1.day_of_week,
                &a1.label,
                a1.start_minute,
                a1.end_minute,
                mins1,
                state,
                weights,
            );
            let (score2_before, _) = SoftScorer::score(
                p2,
                a2.shift_date,
                a2.day_of_week,
                &a2.label,
                a2.start_minute,
                a2.end_minute,
                mins2,
                state,
                weights,
            );

            let (score1_after, _) = SoftScorer::score(
                p1,
                a2.shift_date,
                a2.day_of_week,
                &a2.label,
                a2.start_minute,
                a2.end_minute,
                mins1 - dur1 + dur2,
                state,
                weights,
            );
            let (score2_after, _) = SoftScorer::score(
                p2,
                a1.shift_date,
                a1.day_of_week,
                &a1.label,
                a1.start_minute,
                a1.end_minute,
                mins2 - dur2 + dur1,
                state,
                weights,
            );

            if score1_after + score2_after > score1_before + score2_before {
                state.swap_employees(idx1, idx2);
                improved += 1;
                debug!(
                    employee_a = %a1.employee_id,
                    employee_b = %a2.employee_id,
                    date_a = %a1.shift_date,
                    date_b = %a2.shift_date,
                    gain = score1_after + score2_after - score1_before - score2_before,
                    "互换提升软约束总分"
                );
            }
        }
        improved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::employee::EmployeeAvailability;
    use crate::domain::types::{EmploymentType, WeekendPreference};
    use crate::domain::AssignedShift;
    use crate::engine::timeline::day_of_week;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn profile(eid: &str, pref: WeekendPreference) -> EmployeeProfile {
        let mut p = EmployeeProfile::new(eid);
        p.employment_type = EmploymentType::Unknown;
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

    fn mismatched_weekend_state() -> (HashMap<String, EmployeeProfile>, ConstraintIndex, ScheduleState)
    {
        let profiles = profile_map(vec![
            profile("e1", WeekendPreference::Sunday),
            profile("e2", WeekendPreference::Saturday),
        ]);
        let index = ConstraintIndex::build(&all_week_avail(&["e1", "e2"]), &[], &[], &[]);
        let mut state = ScheduleState::new();
        state.commit(assigned("e1", "2025-03-08", "SAT_0530_1230", 330, 750));
        state.commit(assigned("e2", "2025-03-09", "SUN_0745_1330", 465, 810));
        (profiles, index, state)
    }

    // ==========================================
    // 测试 1: 提分互换落地
    // ==========================================

    #[test]
    fn test_improving_swap_applied() {
        let (profiles, index, mut state) = mismatched_weekend_state();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let improved = SwapOptimizer::optimize(
            &profiles,
            &index,
            &mut state,
            &SchedulerWeights::default(),
            200,
            &mut rng,
        );

        // 错位 (-50-50) 换成命中 (+100+100), 且不会再换回去
        assert_eq!(improved, 1);
        assert_eq!(state.assignments()[0].employee_id, "e2");
        assert_eq!(state.assignments()[1].employee_id, "e1");
        assert!(state.totals_consistent());
    }

    // ==========================================
    // 测试 2: 已最优不再互换
    // ==========================================

    #[test]
    fn test_optimal_state_untouched() {
        let profiles = profile_map(vec![
            profile("e1", WeekendPreference::Saturday),
            profile("e2", WeekendPreference::Sunday),
        ]);
        let index = ConstraintIndex::build(&all_week_avail(&["e1", "e2"]), &[], &[], &[]);
        let mut state = ScheduleState::new();
        state.commit(assigned("e1", "2025-03-08", "SAT_0530_1230", 330, 750));
        state.commit(assigned("e2", "2025-03-09", "SUN_0745_1330", 465, 810));
        let before = state.assignments().to_vec();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let improved = SwapOptimizer::optimize(
            &profiles,
            &index,
            &mut state,
            &SchedulerWeights::default(),
            200,
            &mut rng,
        );

        assert_eq!(improved, 0);
        assert_eq!(state.assignments(), before.as_slice());
    }

    // ==========================================
    // 测试 3: 少于两条分配直接返回
    // ==========================================

    #[test]
    fn test_fewer_than_two_assignments() {
        let profiles = profile_map(vec![profile("e1", WeekendPreference::None)]);
        let index = ConstraintIndex::build(&all_week_avail(&["e1"]), &[], &[], &[]);
        let mut state = ScheduleState::new();
        state.commit(assigned("e1", "2025-03-05", "AM", 480, 960));
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let improved = SwapOptimizer::optimize(
            &profiles,
            &index,
            &mut state,
            &SchedulerWeights::default(),
            200,
            &mut rng,
        );
        assert_eq!(improved, 0);
        assert_eq!(state.len(), 1);
    }

    // ==========================================
    // 测试 4: 固定种子可复现
    // ==========================================

    #[test]
    fn test_seeded_runs_reproducible() {
        let (profiles, index, state0) = mismatched_weekend_state();

        let mut state_a = state0.clone();
        let mut rng_a = ChaCha8Rng::seed_from_u64(99);
        SwapOptimizer::optimize(
            &profiles,
            &index,
            &mut state_a,
            &SchedulerWeights::default(),
            200,
            &mut rng_a,
        );

        let mut state_b = state0.clone();
        let mut rng_b = ChaCha8Rng::seed_from_u64(99);
        SwapOptimizer::optimize(
            &profiles,
            &index,
            &mut state_b,
            &SchedulerWeights::default(),
            200,
            &mut rng_b,
        );

        assert_eq!(state_a.assignments(), state_b.assignments());
    }
}
