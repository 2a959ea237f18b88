// ==========================================
// 门店月度排班引擎 - 审计记录领域模型
// ==========================================
// 可解释性契约: 每个 (班次, 员工) 组合一条候选记录,
// 每个班次一条汇总记录, 无论是否选中
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// CandidateDetails - 候选审计明细 (details 列 JSON)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateDetails {
    pub selected: bool,            // 是否被选中
    pub minutes_so_far: i64,       // 评估时已累计分钟数
    pub hard_reasons: Vec<String>, // 硬约束违规标签 (按检查顺序)
    pub score: f64,                // 软约束得分 (不合格者为 0)
    pub soft_reasons: Vec<String>, // 软约束得分标签
}

// ==========================================
// AuditCandidateRecord - 候选资格审计记录
// ==========================================
// 唯一键: (run, 日期, 标签, 开始, 结束, 员工) → 幂等重跑可覆盖
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditCandidateRecord {
    pub schedule_run_id: String,          // 运行ID
    pub shift_date: NaiveDate,            // 班次日期
    pub label: String,                    // 班次标签
    pub start_minute: i32,                // 开始时刻 (分钟)
    pub end_minute: i32,                  // 结束时刻 (分钟)
    pub employee_id: String,              // 员工ID
    pub eligible: bool,                   // 是否合格
    pub rejection_reason: Option<String>, // 首个违规标签 (合格者为空)
    pub details: CandidateDetails,        // 明细
}

// ==========================================
// AuditShiftRecord - 班次覆盖审计记录
// ==========================================
// 唯一键: (run, 日期, 标签, 开始, 结束)
// 不变式: assigned_count + missing_count == required_count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditShiftRecord {
    pub schedule_run_id: String,                 // 运行ID
    pub shift_date: NaiveDate,                   // 班次日期
    pub label: String,                           // 班次标签
    pub start_minute: i32,                       // 开始时刻 (分钟)
    pub end_minute: i32,                         // 结束时刻 (分钟)
    pub required_count: i64,                     // 需求人数
    pub assigned_count: i64,                     // 实际分配人数
    pub candidate_count: i64,                    // 合格候选人数
    pub missing_count: i64,                      // 缺口人数
    pub rejection_summary: BTreeMap<String, i64>, // 违规标签直方图
}

// ==========================================
// ShiftCoverageRow - 班次覆盖视图 (读侧)
// ==========================================
// 由审计汇总 + 最终排班结果拼合: 计数来自审计快照,
// assigned_employees 反映修复/回填之后的最终名单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftCoverageRow {
    pub shift_date: NaiveDate,                    // 班次日期
    pub label: String,                            // 班次标签
    pub start_minute: i32,                        // 开始时刻 (分钟)
    pub end_minute: i32,                          // 结束时刻 (分钟)
    pub required_count: i64,                      // 需求人数
    pub assigned_count: i64,                      // 最终分配人数
    pub candidate_count: i64,                     // 贪心阶段合格候选人数
    pub missing_count: i64,                       // 贪心阶段缺口人数
    pub assigned_employees: Vec<String>,          // 最终分配的员工姓名
    pub rejection_summary: BTreeMap<String, i64>, // 违规标签直方图
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_details_json_shape() {
        let details = CandidateDetails {
            selected: true,
            minutes_so_far: 480,
            hard_reasons: vec![],
            score: 123.5,
            soft_reasons: vec!["weekend_pref_match_sat".to_string()],
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["selected"], true);
        assert_eq!(json["minutes_so_far"], 480);
        assert_eq!(json["soft_reasons"][0], "weekend_pref_match_sat");
    }

    #[test]
    fn test_rejection_summary_round_trip() {
        let mut summary = BTreeMap::new();
        summary.insert("pto".to_string(), 2i64);
        summary.insert("shift_overlap".to_string(), 1i64);

        let json = serde_json::to_string(&summary).unwrap();
        let back: BTreeMap<String, i64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("pto"), Some(&2));
        assert_eq!(back.get("shift_overlap"), Some(&1));
    }
}
