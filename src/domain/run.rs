// ==========================================
// 门店月度排班引擎 - 排班运行领域模型
// ==========================================
// 一次运行 = 一个 (公司, 门店, 月份) 的完整排班及其审计轨迹
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// ScheduleRun - 排班运行记录
// ==========================================
// 运行ID在运行开始时铸造一次, 不跨调用复用
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRun {
    pub schedule_run_id: String,   // 运行ID
    pub company_id: String,        // 公司ID
    pub studio_id: String,         // 门店ID
    pub month_start: NaiveDate,    // 排班区间起 (含)
    pub month_end: NaiveDate,      // 排班区间止 (含)
    pub created_at: NaiveDateTime, // 创建时间
}

// ==========================================
// ScheduleRunOutcome - 运行结果摘要
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRunOutcome {
    pub run_id: String,       // 本次运行ID
    pub demand_count: i64,    // 需求班次实例数
    pub assigned_count: i64,  // 最终分配班次数
    pub unfilled_count: i64,  // 缺口总人次 (sum of missing_count)
}

// ==========================================
// RunSummary - 运行列表条目 (读侧)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub schedule_run_id: String,   // 运行ID
    pub studio_id: String,         // 门店ID
    pub month_start: NaiveDate,    // 排班区间起 (含)
    pub month_end: NaiveDate,      // 排班区间止 (含)
    pub created_at: NaiveDateTime, // 创建时间
    pub shift_count: i64,          // 该运行持久化的分配班次数
}
