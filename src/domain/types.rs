// ==========================================
// 门店月度排班引擎 - 领域类型定义
// ==========================================
// 硬规则/软偏好一律使用封闭枚举,禁止裸字符串比较
// 审计标签格式与历史数据保持兼容
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 雇佣类型 (Employment Type)
// ==========================================
// 规则载荷 value_json 中的存储格式: snake_case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime, // 全职: 周工时下限约束
    PartTime, // 兼职: 个人理想周工时
    Unknown,  // 未配置规则
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmploymentType::FullTime => write!(f, "full_time"),
            EmploymentType::PartTime => write!(f, "part_time"),
            EmploymentType::Unknown => write!(f, "unknown"),
        }
    }
}

impl EmploymentType {
    /// 从规则载荷字符串解析雇佣类型
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "full_time" => EmploymentType::FullTime,
            "part_time" => EmploymentType::PartTime,
            _ => EmploymentType::Unknown,
        }
    }

    /// 转换为存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full_time",
            EmploymentType::PartTime => "part_time",
            EmploymentType::Unknown => "unknown",
        }
    }
}

// ==========================================
// 周末偏好 (Weekend Preference)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekendPreference {
    Saturday, // 偏好周六
    Sunday,   // 偏好周日
    Either,   // 周六周日皆可
    None,     // 无偏好
}

impl fmt::Display for WeekendPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekendPreference::Saturday => write!(f, "saturday"),
            WeekendPreference::Sunday => write!(f, "sunday"),
            WeekendPreference::Either => write!(f, "either"),
            WeekendPreference::None => write!(f, "none"),
        }
    }
}

impl WeekendPreference {
    /// 从规则载荷字符串解析周末偏好
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "saturday" => WeekendPreference::Saturday,
            "sunday" => WeekendPreference::Sunday,
            "either" => WeekendPreference::Either,
            _ => WeekendPreference::None,
        }
    }

    /// 转换为存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WeekendPreference::Saturday => "saturday",
            WeekendPreference::Sunday => "sunday",
            WeekendPreference::Either => "either",
            WeekendPreference::None => "none",
        }
    }

    /// 是否为指定具体某天的偏好 (周六或周日)
    pub fn is_specific(&self) -> bool {
        matches!(self, WeekendPreference::Saturday | WeekendPreference::Sunday)
    }
}

// ==========================================
// 员工规则类型 (Employee Rule Type)
// ==========================================
// employee_rules.rule_type 列的取值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    EmploymentType,    // 载荷: {"type": "full_time"|"part_time"}
    WeekendPreference, // 载荷: {"preference": "saturday"|"sunday"|"either"}
    IdealHoursWeekly,  // 载荷: {"hours": 数值}
    HardNoConstraints, // 载荷: {"note": 文本}
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleType::EmploymentType => write!(f, "EMPLOYMENT_TYPE"),
            RuleType::WeekendPreference => write!(f, "WEEKEND_PREFERENCE"),
            RuleType::IdealHoursWeekly => write!(f, "IDEAL_HOURS_WEEKLY"),
            RuleType::HardNoConstraints => write!(f, "HARD_NO_CONSTRAINTS"),
        }
    }
}

impl RuleType {
    /// 从数据库字符串解析规则类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "EMPLOYMENT_TYPE" => Some(RuleType::EmploymentType),
            "WEEKEND_PREFERENCE" => Some(RuleType::WeekendPreference),
            "IDEAL_HOURS_WEEKLY" => Some(RuleType::IdealHoursWeekly),
            "HARD_NO_CONSTRAINTS" => Some(RuleType::HardNoConstraints),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RuleType::EmploymentType => "EMPLOYMENT_TYPE",
            RuleType::WeekendPreference => "WEEKEND_PREFERENCE",
            RuleType::IdealHoursWeekly => "IDEAL_HOURS_WEEKLY",
            RuleType::HardNoConstraints => "HARD_NO_CONSTRAINTS",
        }
    }
}

// ==========================================
// 班次位置 (Shift Position)
// ==========================================
// 用于 clopen 识别: 晚班次日接早班
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftPosition {
    Open,  // 早班 (开店)
    Mid,   // 中班
    Close, // 晚班 (闭店)
}

impl fmt::Display for ShiftPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftPosition::Open => write!(f, "open"),
            ShiftPosition::Mid => write!(f, "mid"),
            ShiftPosition::Close => write!(f, "close"),
        }
    }
}

impl ShiftPosition {
    /// 从班次标签或时间段推断班次位置
    ///
    /// # 规则
    /// 1. 标签含 "AM" → 早班, 含 "PM" → 晚班 (标签优先)
    /// 2. 否则开始时间早于 06:00 → 早班, 结束时间不早于 20:00 → 晚班
    /// 3. 其余为中班
    pub fn classify(label: &str, start_minute: i32, end_minute: i32) -> Self {
        let upper = label.to_uppercase();
        if upper.contains("AM") {
            return ShiftPosition::Open;
        }
        if upper.contains("PM") {
            return ShiftPosition::Close;
        }

        let start_hour = start_minute / 60;
        let end_hour = end_minute / 60;
        if start_hour < 6 {
            ShiftPosition::Open
        } else if end_hour >= 20 {
            ShiftPosition::Close
        } else {
            ShiftPosition::Mid
        }
    }
}

// ==========================================
// 硬约束违规 (Hard Rule Violation)
// ==========================================
// 固定检查顺序,全部违规均记录 (非首个即止)
// Display 输出即审计标签,与历史审计数据格式一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardRule {
    /// 带薪休假覆盖该日期
    Pto,
    /// 已批准请假覆盖该日期
    TimeOff,
    /// 无可用时段完整覆盖班次
    NoAvailabilityCoverage,
    /// 与声明的不可用时段重叠
    WeeklyUnavailableOverlap,
    /// 与已分配班次重叠
    ShiftOverlap,
    /// 班次时长超上限
    ShiftTooLong { minutes: i32 },
    /// 同日班次间休息不足
    InsufficientRestSameDay,
    /// 跨日班次间休息不足
    InsufficientRestCrossDay,
    /// 连续工作天数超上限
    TooManyConsecutiveDays { days: u32 },
}

impl fmt::Display for HardRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardRule::Pto => write!(f, "pto"),
            HardRule::TimeOff => write!(f, "time_off"),
            HardRule::NoAvailabilityCoverage => write!(f, "no_availability_coverage"),
            HardRule::WeeklyUnavailableOverlap => write!(f, "weekly_unavailable_overlap"),
            HardRule::ShiftOverlap => write!(f, "shift_overlap"),
            HardRule::ShiftTooLong { minutes } => write!(f, "shift_too_long_{}min", minutes),
            HardRule::InsufficientRestSameDay => write!(f, "insufficient_rest_same_day"),
            HardRule::InsufficientRestCrossDay => write!(f, "insufficient_rest_cross_day"),
            HardRule::TooManyConsecutiveDays { days } => {
                write!(f, "too_many_consecutive_days_{}", days)
            }
        }
    }
}

impl HardRule {
    /// 审计标签字符串
    pub fn tag(&self) -> String {
        self.to_string()
    }
}

// ==========================================
// 软偏好得分标签 (Soft Reason)
// ==========================================
// Display 输出即审计标签; 数值字段保留一位小数
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoftReason {
    /// 周六偏好命中
    WeekendPrefMatchSat,
    /// 周日偏好命中
    WeekendPrefMatchSun,
    /// 周末皆可
    WeekendPrefEither,
    /// 偏好周六但排到周日
    WeekendPrefOppositeSatWantsSun,
    /// 偏好周日但排到周六
    WeekendPrefOppositeSunWantsSat,
    /// 全职距周工时下限的缺口
    FtHoursNeeded { hours_under: f64 },
    /// 全职超出周工时下限
    FtHoursOver { hours_over: f64 },
    /// 兼职向理想工时靠近
    PtTowardIdeal { hours: f64 },
    /// 兼职超出理想工时
    PtOverIdeal { hours_over: f64 },
    /// 形成 clopen (晚班次日接早班)
    CreatesClopen,
    /// 避开 clopen
    AvoidsClopen,
    /// 连续工作天数
    ConsecutiveDays { days: u32 },
}

impl fmt::Display for SoftReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoftReason::WeekendPrefMatchSat => write!(f, "weekend_pref_match_sat"),
            SoftReason::WeekendPrefMatchSun => write!(f, "weekend_pref_match_sun"),
            SoftReason::WeekendPrefEither => write!(f, "weekend_pref_either"),
            SoftReason::WeekendPrefOppositeSatWantsSun => {
                write!(f, "weekend_pref_opposite_sat_wants_sun")
            }
            SoftReason::WeekendPrefOppositeSunWantsSat => {
                write!(f, "weekend_pref_opposite_sun_wants_sat")
            }
            SoftReason::FtHoursNeeded { hours_under } => {
                write!(f, "ft_hours_needed_{:.1}h_weekly", hours_under)
            }
            SoftReason::FtHoursOver { hours_over } => {
                write!(f, "ft_hours_over_{:.1}h_weekly", hours_over)
            }
            SoftReason::PtTowardIdeal { hours } => write!(f, "pt_toward_ideal_{:.1}h", hours),
            SoftReason::PtOverIdeal { hours_over } => {
                write!(f, "pt_over_ideal_{:.1}h_weekly", hours_over)
            }
            SoftReason::CreatesClopen => write!(f, "creates_clopen"),
            SoftReason::AvoidsClopen => write!(f, "avoids_clopen"),
            SoftReason::ConsecutiveDays { days } => write!(f, "consecutive_days_{}", days),
        }
    }
}

impl SoftReason {
    /// 审计标签字符串
    pub fn tag(&self) -> String {
        self.to_string()
    }
}
