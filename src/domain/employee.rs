// ==========================================
// 门店月度排班引擎 - 员工领域模型
// ==========================================
// 员工主数据与偏好规则均为只读输入
// 规则载荷存储为 JSON 文本, 由 Profile Builder 解析
// ==========================================

use crate::domain::types::{EmploymentType, WeekendPreference};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Employee - 员工主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: String, // 员工ID
    pub company_id: String,  // 所属公司
    pub name: String,        // 姓名
    pub is_active: bool,     // 是否在职
}

// ==========================================
// EmployeeRule - 员工偏好规则行
// ==========================================
// rule_type 见 RuleType; value_json 为对应载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeRule {
    pub rule_id: String,     // 规则ID
    pub employee_id: String, // 员工ID
    pub rule_type: String,   // 规则类型
    pub value_json: String,  // 规则载荷 (JSON 文本)
}

// ===== 规则载荷 =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmploymentTypePayload {
    #[serde(rename = "type")]
    pub employment_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekendPreferencePayload {
    pub preference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdealHoursPayload {
    pub hours: Option<f64>, // 载荷允许显式 null
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardNoPayload {
    #[serde(default)]
    pub note: String,
}

// ==========================================
// EmployeeAvailability - 每周可用时段
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeAvailability {
    pub availability_id: String, // 记录ID
    pub employee_id: String,     // 员工ID
    pub day_of_week: u8,         // 星期几 (0=周日..6=周六)
    pub start_minute: i32,       // 时段开始 (分钟)
    pub end_minute: i32,         // 时段结束 (分钟)
}

// ==========================================
// EmployeeUnavailability - 每周不可用时段
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeUnavailability {
    pub unavailability_id: String, // 记录ID
    pub employee_id: String,       // 员工ID
    pub day_of_week: u8,           // 星期几 (0=周日..6=周六)
    pub start_minute: i32,         // 时段开始 (分钟)
    pub end_minute: i32,           // 时段结束 (分钟)
    pub reason: Option<String>,    // 原因说明
}

// ==========================================
// DateRangeBlock - 日期区间阻断 (PTO / 请假)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRangeBlock {
    pub block_id: String,      // 记录ID
    pub employee_id: String,   // 员工ID
    pub start_date: NaiveDate, // 起始日期 (含)
    pub end_date: NaiveDate,   // 结束日期 (含)
    pub note: Option<String>,  // 备注
}

// ==========================================
// EmployeeProfile - 员工画像
// ==========================================
// 每次运行由规则行构建一次, 之后只读
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeProfile {
    pub employee_id: String,                  // 员工ID
    pub employment_type: EmploymentType,      // 雇佣类型
    pub weekend_preference: WeekendPreference, // 周末偏好
    pub ideal_hours_weekly: Option<f64>,      // 理想周工时 (仅兼职)
    pub hard_no_note: String,                 // 硬性禁忌备注
}

impl EmployeeProfile {
    /// 创建仅含默认值的画像 (无任何规则行时)
    pub fn new(employee_id: &str) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            employment_type: EmploymentType::Unknown,
            weekend_preference: WeekendPreference::None,
            ideal_hours_weekly: None,
            hard_no_note: String::new(),
        }
    }

    /// 是否全职
    pub fn is_full_time(&self) -> bool {
        self.employment_type == EmploymentType::FullTime
    }

    /// 是否兼职
    pub fn is_part_time(&self) -> bool {
        self.employment_type == EmploymentType::PartTime
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults() {
        let p = EmployeeProfile::new("emp-1");
        assert_eq!(p.employment_type, EmploymentType::Unknown);
        assert_eq!(p.weekend_preference, WeekendPreference::None);
        assert!(p.ideal_hours_weekly.is_none());
        assert!(!p.is_full_time());
        assert!(!p.is_part_time());
    }

    #[test]
    fn test_rule_payload_parsing() {
        let p: EmploymentTypePayload = serde_json::from_str(r#"{"type":"full_time"}"#).unwrap();
        assert_eq!(p.employment_type, "full_time");

        let p: IdealHoursPayload = serde_json::from_str(r#"{"hours":15}"#).unwrap();
        assert_eq!(p.hours, Some(15.0));

        let p: IdealHoursPayload = serde_json::from_str(r#"{"hours":null}"#).unwrap();
        assert_eq!(p.hours, None);

        // note 缺省时不报错
        let p: HardNoPayload = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(p.note, "");
    }
}
