// ==========================================
// 门店月度排班引擎 - 软约束打分器
// ==========================================
// 职责: 对 (员工, 候选班次) 给出加性偏好分与原因标签
// 红线: 纯计算, 不修改状态; 分数只用于候选排序与交换比较
// 当前分钟数由调用方传入, 便于优化器评估假设性工时
// ==========================================

use crate::config::SchedulerWeights;
use crate::domain::employee::EmployeeProfile;
use crate::domain::types::{ShiftPosition, SoftReason, WeekendPreference};
use crate::engine::state::ScheduleState;
use crate::engine::timeline::{
    is_saturday, is_sunday, is_weekend, minutes_to_hours, WEEKS_PER_MONTH,
};
use chrono::{Duration, NaiveDate};

/// 全职周工时目标下限
pub const FT_MIN_HOURS_PER_WEEK: f64 = 30.0;

/// 全职超时宽限 (超过目标 5 小时以内不罚)
const FT_OVER_GRACE_HOURS: f64 = 5.0;

/// 连续工作天数超过该值开始扣分 (硬上限之前的软梯度)
const CONSECUTIVE_PENALTY_THRESHOLD: u32 = 5;

// ==========================================
// SoftScorer - 软约束打分
// ==========================================
pub struct SoftScorer;

impl SoftScorer {
    /// 计算候选分配的软约束得分
    ///
    /// # 组成 (固定顺序累加)
    /// 1. 周末偏好: 命中 +match, either +小额, 错位 -opposite
    /// 2. 工时目标: 全职按距 30h/周 缺口给强化奖励, 超 5h 后递减;
    ///    兼职按理想周工时靠拢奖励 / 超出惩罚 (理想值缺失或为 0 不参与)
    /// 3. 闭转开: 候选为开店班时, 逐条检查前一日班次
    /// 4. 连续天数: 超过 5 天每多一天扣一档
    ///
    /// # 参数
    /// - `current_minutes`: 该员工本月已分配分钟数 (假设性评估时由调用方覆盖)
    ///
    /// # 返回
    /// (得分, 原因标签列表)
    pub fn score(
        profile: &EmployeeProfile,
        shift_date: NaiveDate,
        day_of_week: u8,
        label: &str,
        start_minute: i32,
        end_minute: i32,
        current_minutes: i64,
        state: &ScheduleState,
        weights: &SchedulerWeights,
    ) -> (f64, Vec<SoftReason>) {
        let mut score = 0.0;
        let mut reasons: Vec<SoftReason> = Vec::new();

        let shift_hours = minutes_to_hours(i64::from(end_minute - start_minute));

        // ---------- 周末偏好 ----------
        if is_weekend(day_of_week) {
            let pref = profile.weekend_preference;
            if pref == WeekendPreference::Saturday && is_saturday(day_of_week) {
                score += weights.weekend_pref_match;
                reasons.push(SoftReason::WeekendPrefMatchSat);
            } else if pref == WeekendPreference::Sunday && is_sunday(day_of_week) {
                score += weights.weekend_pref_match;
                reasons.push(SoftReason::WeekendPrefMatchSun);
            } else if pref == WeekendPreference::Either {
                score += weights.weekend_pref_either;
                reasons.push(SoftReason::WeekendPrefEither);
            } else if pref == WeekendPreference::Saturday && is_sunday(day_of_week) {
                score += weights.weekend_pref_opposite;
                reasons.push(SoftReason::WeekendPrefOppositeSatWantsSun);
            } else if pref == WeekendPreference::Sunday && is_saturday(day_of_week) {
                score += weights.weekend_pref_opposite;
                reasons.push(SoftReason::WeekendPrefOppositeSunWantsSat);
            }
        }

        // ---------- 工时目标 (按月均周折算) ----------
        let current_hours = minutes_to_hours(current_minutes);
        let hours_after = current_hours + shift_hours;
        let weekly_after = hours_after / WEEKS_PER_MONTH;

        if profile.is_full_time() {
            if weekly_after < FT_MIN_HOURS_PER_WEEK {
                // 缺口越大奖励越陡, 保证欠时全职优先于兼职
                let hours_under = FT_MIN_HOURS_PER_WEEK - weekly_after;
                let multiplier = 1.0 + hours_under;
                score += hours_under * weights.ft_hours_remaining * shift_hours * multiplier * 2.0;
                reasons.push(SoftReason::FtHoursNeeded { hours_under });
            } else {
                let hours_over = weekly_after - FT_MIN_HOURS_PER_WEEK;
                if hours_over > FT_OVER_GRACE_HOURS {
                    score += (hours_over - FT_OVER_GRACE_HOURS) * weights.ft_hours_over * shift_hours;
                    reasons.push(SoftReason::FtHoursOver { hours_over });
                }
            }
        } else if profile.is_part_time() {
            match profile.ideal_hours_weekly {
                Some(ideal) if ideal > 0.0 => {
                    let current_weekly = current_hours / WEEKS_PER_MONTH;
                    if weekly_after < ideal {
                        let hours_toward =
                            shift_hours.min((ideal - current_weekly) * WEEKS_PER_MONTH);
                        score += hours_toward * weights.pt_toward_ideal;
                        reasons.push(SoftReason::PtTowardIdeal { hours: hours_toward });
                    } else {
                        let hours_over = weekly_after - ideal;
                        if hours_over > 0.0 {
                            score += hours_over * weights.pt_over_ideal * shift_hours;
                            reasons.push(SoftReason::PtOverIdeal { hours_over });
                        }
                    }
                }
                _ => {}
            }
        }

        // ---------- 闭转开 (前一日收尾 + 当日开店) ----------
        if ShiftPosition::classify(label, start_minute, end_minute) == ShiftPosition::Open {
            let prev_date = shift_date - Duration::days(1);
            for prev in state.shifts_on(&profile.employee_id, prev_date) {
                let prev_position =
                    ShiftPosition::classify(&prev.label, prev.start_minute, prev.end_minute);
                if prev_position == ShiftPosition::Close {
                    score += weights.create_clopen;
                    reasons.push(SoftReason::CreatesClopen);
                } else {
                    score += weights.avoid_clopen;
                    reasons.push(SoftReason::AvoidsClopen);
                }
            }
        }

        // ---------- 连续天数软梯度 ----------
        if let Some(days) = state.days_of(&profile.employee_id) {
            if !days.is_empty() {
                let mut consecutive: u32 = 1;
                let mut check = shift_date;
                while days.contains_key(&(check - Duration::days(1))) {
                    consecutive += 1;
                    check -= Duration::days(1);
                }
                check = shift_date;
                while days.contains_key(&(check + Duration::days(1))) {
                    consecutive += 1;
                    check += Duration::days(1);
                }

                if consecutive > CONSECUTIVE_PENALTY_THRESHOLD {
                    score += f64::from(consecutive - CONSECUTIVE_PENALTY_THRESHOLD)
                        * weights.extra_consecutive_day;
                    reasons.push(SoftReason::ConsecutiveDays { days: consecutive });
                }
            }
        }

        (score, reasons)
    }
}
