// ==========================================
// 门店月度排班引擎 - 员工画像构建
// ==========================================
// 职责: 把原始规则行折叠为每员工一份结构化画像
// 规则载荷解析失败仅告警跳过, 不中断运行
// ==========================================

use crate::domain::employee::{
    EmploymentTypePayload, HardNoPayload, IdealHoursPayload, WeekendPreferencePayload,
};
use crate::domain::types::{EmploymentType, RuleType, WeekendPreference};
use crate::domain::{Employee, EmployeeProfile, EmployeeRule};
use std::collections::HashMap;
use tracing::warn;

// ==========================================
// ProfileBuilder - 画像构建器
// ==========================================
pub struct ProfileBuilder;

impl ProfileBuilder {
    /// 构建员工画像表
    ///
    /// # 规则
    /// - 每名在册员工都有画像 (无规则行时取默认值)
    /// - 同类规则多行时后写入者生效 (按规则行顺序)
    /// - 规则行指向未知员工时跳过
    pub fn build(
        employees: &[Employee],
        rules: &[EmployeeRule],
    ) -> HashMap<String, EmployeeProfile> {
        let mut profiles: HashMap<String, EmployeeProfile> = employees
            .iter()
            .map(|e| (e.employee_id.clone(), EmployeeProfile::new(&e.employee_id)))
            .collect();

        for rule in rules {
            let Some(profile) = profiles.get_mut(&rule.employee_id) else {
                continue;
            };

            let Some(rule_type) = RuleType::from_str(&rule.rule_type) else {
                warn!(
                    employee_id = %rule.employee_id,
                    rule_type = %rule.rule_type,
                    "未知规则类型, 跳过"
                );
                continue;
            };

            match rule_type {
                RuleType::EmploymentType => {
                    match serde_json::from_str::<EmploymentTypePayload>(&rule.value_json) {
                        Ok(payload) => {
                            profile.employment_type =
                                EmploymentType::from_str(&payload.employment_type);
                        }
                        Err(e) => {
                            warn!(
                                employee_id = %rule.employee_id,
                                error = %e,
                                "雇佣类型载荷解析失败, 跳过"
                            );
                        }
                    }
                }
                RuleType::WeekendPreference => {
                    match serde_json::from_str::<WeekendPreferencePayload>(&rule.value_json) {
                        Ok(payload) => {
                            profile.weekend_preference =
                                WeekendPreference::from_str(&payload.preference);
                        }
                        Err(e) => {
                            warn!(
                                employee_id = %rule.employee_id,
                                error = %e,
                                "周末偏好载荷解析失败, 跳过"
                            );
                        }
                    }
                }
                RuleType::IdealHoursWeekly => {
                    match serde_json::from_str::<IdealHoursPayload>(&rule.value_json) {
                        Ok(payload) => {
                            profile.ideal_hours_weekly = payload.hours;
                        }
                        Err(e) => {
                            warn!(
                                employee_id = %rule.employee_id,
                                error = %e,
                                "理想工时载荷解析失败, 跳过"
                            );
                        }
                    }
                }
                RuleType::HardNoConstraints => {
                    match serde_json::from_str::<HardNoPayload>(&rule.value_json) {
                        Ok(payload) => {
                            profile.hard_no_note = payload.note;
                        }
                        Err(e) => {
                            warn!(
                                employee_id = %rule.employee_id,
                                error = %e,
                                "硬性禁忌载荷解析失败, 跳过"
                            );
                        }
                    }
                }
            }
        }

        profiles
    }
}
