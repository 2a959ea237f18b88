// ==========================================
// 门店月度排班引擎 - 硬约束校验器
// ==========================================
// 职责: 判定 (员工, 候选班次) 是否可行, 输出全部违规标签
// 红线: 纯谓词, 只读取约束索引与当前运行状态
// 检查顺序固定, 结果聚合全部违规 (调用方取首个作为拒绝原因)
// ==========================================

use crate::domain::types::HardRule;
use crate::engine::constraint_index::ConstraintIndex;
use crate::engine::state::ScheduleState;
use crate::engine::timeline::{ranges_overlap, rest_gap_minutes, spans_overlap};
use chrono::{Duration, NaiveDate};

/// 班次时长上限 (10 小时)
pub const MAX_SHIFT_LENGTH_MINUTES: i32 = 10 * 60;

/// 班次间最小休息 (12 小时)
pub const MIN_REST_BETWEEN_SHIFTS_MINUTES: i64 = 12 * 60;

/// 最大连续工作天数
pub const MAX_CONSECUTIVE_DAYS: u32 = 6;

// ==========================================
// HardConstraintValidator - 硬约束校验
// ==========================================
pub struct HardConstraintValidator;

impl HardConstraintValidator {
    /// 校验员工能否承接候选班次
    ///
    /// # 规则 (固定顺序, 逐条累积违规)
    /// 1. 该日期在 PTO 内
    /// 2. 该日期在已批准请假内
    /// 3. 班次未被任一当日可用时段完整覆盖 (部分覆盖不算)
    /// 4. 与声明的不可用时段半开重叠
    /// 5. 与已分配班次在连续时间轴上重叠 (跨午夜安全)
    /// 6. 班次时长超过 10 小时
    /// 7. 与任一已分配班次休息不足 12 小时 (双向对称, 同日/相邻日)
    /// 8. 连续工作天数超过 6 天 (从候选日期向前后双向步进)
    ///
    /// # 返回
    /// (是否合格, 违规标签列表) - 合格当且仅当列表为空
    pub fn is_eligible(
        employee_id: &str,
        shift_date: NaiveDate,
        day_of_week: u8,
        start_minute: i32,
        end_minute: i32,
        index: &ConstraintIndex,
        state: &ScheduleState,
    ) -> (bool, Vec<HardRule>) {
        let mut violations: Vec<HardRule> = Vec::new();

        // 规则 1: PTO
        if index.is_pto(employee_id, shift_date) {
            violations.push(HardRule::Pto);
        }

        // 规则 2: 已批准请假
        if index.is_time_off(employee_id, shift_date) {
            violations.push(HardRule::TimeOff);
        }

        // 规则 3: 可用时段完整覆盖
        let covered = index
            .availability_windows(employee_id, day_of_week)
            .iter()
            .any(|(a_start, a_end)| *a_start <= start_minute && *a_end >= end_minute);
        if !covered {
            violations.push(HardRule::NoAvailabilityCoverage);
        }

        // 规则 4: 不可用时段重叠
        let blocked = index
            .unavailability_windows(employee_id, day_of_week)
            .iter()
            .any(|(u_start, u_end)| ranges_overlap(start_minute, end_minute, *u_start, *u_end));
        if blocked {
            violations.push(HardRule::WeeklyUnavailableOverlap);
        }

        // 规则 5: 与已分配班次重叠 (同员工, 连续时间轴)
        if let Some(days) = state.days_of(employee_id) {
            let near = days.range(shift_date - Duration::days(1)..=shift_date + Duration::days(1));
            'overlap: for (existing_date, slots) in near {
                for slot in slots {
                    if spans_overlap(
                        *existing_date,
                        slot.start_minute,
                        slot.end_minute,
                        shift_date,
                        start_minute,
                        end_minute,
                    ) {
                        violations.push(HardRule::ShiftOverlap);
                        break 'overlap;
                    }
                }
            }
        }

        // 规则 6: 班次时长上限
        let duration = end_minute - start_minute;
        if duration > MAX_SHIFT_LENGTH_MINUTES {
            violations.push(HardRule::ShiftTooLong { minutes: duration });
        }

        // 规则 7: 最小休息 (每条冲突班次各记一次)
        if let Some(days) = state.days_of(employee_id) {
            let near = days.range(shift_date - Duration::days(1)..=shift_date + Duration::days(1));
            for (existing_date, slots) in near {
                for slot in slots {
                    let gap = rest_gap_minutes(
                        *existing_date,
                        slot.start_minute,
                        slot.end_minute,
                        shift_date,
                        start_minute,
                        end_minute,
                    );
                    if let Some(gap) = gap {
                        if gap < MIN_REST_BETWEEN_SHIFTS_MINUTES {
                            if *existing_date == shift_date {
                                violations.push(HardRule::InsufficientRestSameDay);
                            } else {
                                violations.push(HardRule::InsufficientRestCrossDay);
                            }
                        }
                    }
                }
            }
        }

        // 规则 8: 最大连续工作天数 (候选日计 1, 向前后双向步进)
        if let Some(days) = state.days_of(employee_id) {
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

                if consecutive > MAX_CONSECUTIVE_DAYS {
                    violations.push(HardRule::TooManyConsecutiveDays { days: consecutive });
                }
            }
        }

        (violations.is_empty(), violations)
    }
}
