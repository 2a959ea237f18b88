// ==========================================
// 门店月度排班引擎 - 班次领域模型
// ==========================================
// 时间统一用"自午夜起的分钟数"表示 (0..=1440)
// 日期统一用 NaiveDate, 存储格式 %Y-%m-%d
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// ShiftDemand - 需求班次 (不可变输入)
// ==========================================
// 一行对应 (日期, 班次模板) 的一个具体班次实例
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftDemand {
    pub shift_date: NaiveDate, // 班次日期
    pub day_of_week: u8,       // 星期几 (0=周日..6=周六)
    pub label: String,         // 班次标签 (如 AM_0425_1225)
    pub start_minute: i32,     // 开始时刻 (分钟)
    pub end_minute: i32,       // 结束时刻 (分钟)
    pub required_count: i64,   // 需求人数
}

impl ShiftDemand {
    /// 班次时长 (分钟)
    pub fn duration_minutes(&self) -> i32 {
        self.end_minute - self.start_minute
    }

    /// 是否周末班次 (周六或周日)
    pub fn is_weekend(&self) -> bool {
        self.day_of_week == 0 || self.day_of_week == 6
    }

    /// 班次唯一键 (日期 + 标签 + 起止时刻)
    pub fn key(&self) -> ShiftKey {
        ShiftKey {
            shift_date: self.shift_date,
            label: self.label.clone(),
            start_minute: self.start_minute,
            end_minute: self.end_minute,
        }
    }
}

// ==========================================
// ShiftKey - 班次实例唯一键
// ==========================================
// 标签不保证全局唯一,必须连同起止时刻一起作键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftKey {
    pub shift_date: NaiveDate,
    pub label: String,
    pub start_minute: i32,
    pub end_minute: i32,
}

// ==========================================
// AssignedShift - 已分配班次 (工作排班表条目)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedShift {
    pub employee_id: String,   // 员工ID
    pub shift_date: NaiveDate, // 班次日期
    pub day_of_week: u8,       // 星期几 (0=周日..6=周六)
    pub label: String,         // 班次标签
    pub start_minute: i32,     // 开始时刻 (分钟)
    pub end_minute: i32,       // 结束时刻 (分钟)
}

impl AssignedShift {
    /// 班次时长 (分钟)
    pub fn duration_minutes(&self) -> i32 {
        self.end_minute - self.start_minute
    }

    /// 是否周末班次
    pub fn is_weekend(&self) -> bool {
        self.day_of_week == 0 || self.day_of_week == 6
    }

    /// 是否与给定班次实例为同一班次 (日期 + 起止时刻 + 标签)
    pub fn matches_slot(&self, shift_date: NaiveDate, label: &str, start_minute: i32, end_minute: i32) -> bool {
        self.shift_date == shift_date
            && self.label == label
            && self.start_minute == start_minute
            && self.end_minute == end_minute
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn demand(date: &str, dow: u8, label: &str, start: i32, end: i32) -> ShiftDemand {
        ShiftDemand {
            shift_date: date.parse().unwrap(),
            day_of_week: dow,
            label: label.to_string(),
            start_minute: start,
            end_minute: end,
            required_count: 1,
        }
    }

    #[test]
    fn test_demand_duration_and_weekend() {
        let d = demand("2025-03-01", 6, "SAT_0530_1230", 330, 750);
        assert_eq!(d.duration_minutes(), 420);
        assert!(d.is_weekend());

        let d = demand("2025-03-03", 1, "AM_0425_1225", 265, 745);
        assert!(!d.is_weekend());
    }

    #[test]
    fn test_shift_key_includes_times() {
        // 同标签不同时段必须是不同的键
        let a = demand("2025-03-01", 6, "OPEN", 300, 720).key();
        let b = demand("2025-03-01", 6, "OPEN", 360, 780).key();
        assert_ne!(a, b);
    }
}
