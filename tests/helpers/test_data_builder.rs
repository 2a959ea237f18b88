// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::NaiveDate;
use shift_scheduler::domain::employee::{
    DateRangeBlock, EmployeeAvailability, EmployeeRule, EmployeeUnavailability,
};
use shift_scheduler::domain::{Employee, ShiftDemand};
use shift_scheduler::engine::timeline;

// ==========================================
// Employee 构建器
// ==========================================

pub struct EmployeeBuilder {
    employee_id: String,
    company_id: String,
    name: String,
    is_active: bool,
}

impl EmployeeBuilder {
    pub fn new(employee_id: &str) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            company_id: "test-company".to_string(),
            name: format!("员工-{}", employee_id),
            is_active: true,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn company(mut self, company_id: &str) -> Self {
        self.company_id = company_id.to_string();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn build(self) -> Employee {
        Employee {
            employee_id: self.employee_id,
            company_id: self.company_id,
            name: self.name,
            is_active: self.is_active,
        }
    }
}

// ==========================================
// ShiftDemand 构建器
// ==========================================

pub struct ShiftDemandBuilder {
    shift_date: NaiveDate,
    label: String,
    start_minute: i32,
    end_minute: i32,
    required_count: i64,
}

impl ShiftDemandBuilder {
    pub fn new(shift_date: NaiveDate) -> Self {
        Self {
            shift_date,
            label: "AM".to_string(),
            start_minute: 540,
            end_minute: 1020,
            required_count: 1,
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn time(mut self, start_minute: i32, end_minute: i32) -> Self {
        self.start_minute = start_minute;
        self.end_minute = end_minute;
        self
    }

    pub fn required(mut self, count: i64) -> Self {
        self.required_count = count;
        self
    }

    pub fn build(self) -> ShiftDemand {
        ShiftDemand {
            day_of_week: timeline::day_of_week(self.shift_date),
            shift_date: self.shift_date,
            label: self.label,
            start_minute: self.start_minute,
            end_minute: self.end_minute,
            required_count: self.required_count,
        }
    }
}

// ==========================================
// 规则行构造
// ==========================================

/// 雇佣类型规则 (full_time / part_time)
pub fn employment_rule(employee_id: &str, employment: &str) -> EmployeeRule {
    EmployeeRule {
        rule_id: format!("rule-emp-{}", employee_id),
        employee_id: employee_id.to_string(),
        rule_type: "EMPLOYMENT_TYPE".to_string(),
        value_json: format!(r#"{{"type": "{}"}}"#, employment),
    }
}

/// 周末偏好规则 (saturday / sunday / either)
pub fn weekend_preference_rule(employee_id: &str, preference: &str) -> EmployeeRule {
    EmployeeRule {
        rule_id: format!("rule-wkd-{}", employee_id),
        employee_id: employee_id.to_string(),
        rule_type: "WEEKEND_PREFERENCE".to_string(),
        value_json: format!(r#"{{"preference": "{}"}}"#, preference),
    }
}

/// 兼职理想周工时规则
pub fn ideal_hours_rule(employee_id: &str, hours: f64) -> EmployeeRule {
    EmployeeRule {
        rule_id: format!("rule-hrs-{}", employee_id),
        employee_id: employee_id.to_string(),
        rule_type: "IDEAL_HOURS_WEEKLY".to_string(),
        value_json: format!(r#"{{"hours": {}}}"#, hours),
    }
}

/// 硬性禁忌备注规则
pub fn hard_no_rule(employee_id: &str, note: &str) -> EmployeeRule {
    EmployeeRule {
        rule_id: format!("rule-no-{}", employee_id),
        employee_id: employee_id.to_string(),
        rule_type: "HARD_NO_CONSTRAINTS".to_string(),
        value_json: format!(r#"{{"note": "{}"}}"#, note),
    }
}

// ==========================================
// 可用/不可用时段与日期段构造
// ==========================================

/// 单条每周可用时段
pub fn availability(employee_id: &str, day_of_week: u8, start: i32, end: i32) -> EmployeeAvailability {
    EmployeeAvailability {
        availability_id: format!("avail-{}-{}-{}", employee_id, day_of_week, start),
        employee_id: employee_id.to_string(),
        day_of_week,
        start_minute: start,
        end_minute: end,
    }
}

/// 整周全天可用 (7 条记录)
pub fn all_week_availability(employee_id: &str) -> Vec<EmployeeAvailability> {
    (0u8..7)
        .map(|dow| availability(employee_id, dow, 0, 1440))
        .collect()
}

/// 单条每周不可用时段
pub fn unavailability(
    employee_id: &str,
    day_of_week: u8,
    start: i32,
    end: i32,
    reason: &str,
) -> EmployeeUnavailability {
    EmployeeUnavailability {
        unavailability_id: format!("unavail-{}-{}", employee_id, day_of_week),
        employee_id: employee_id.to_string(),
        day_of_week,
        start_minute: start,
        end_minute: end,
        reason: Some(reason.to_string()),
    }
}

/// 带薪假日期段
pub fn pto_block(employee_id: &str, start_date: NaiveDate, end_date: NaiveDate) -> DateRangeBlock {
    DateRangeBlock {
        block_id: format!("pto-{}-{}", employee_id, start_date),
        employee_id: employee_id.to_string(),
        start_date,
        end_date,
        note: Some("年假".to_string()),
    }
}

/// 已批准请假日期段
pub fn time_off_block(
    employee_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> DateRangeBlock {
    DateRangeBlock {
        block_id: format!("off-{}-{}", employee_id, start_date),
        employee_id: employee_id.to_string(),
        start_date,
        end_date,
        note: Some("已批事假".to_string()),
    }
}
