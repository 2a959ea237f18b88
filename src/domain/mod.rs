// ==========================================
// 门店月度排班引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、审计记录结构
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod audit;
pub mod employee;
pub mod run;
pub mod shift;
pub mod types;

// 重导出核心类型
pub use audit::{AuditCandidateRecord, AuditShiftRecord, CandidateDetails, ShiftCoverageRow};
pub use employee::{Employee, EmployeeProfile, EmployeeRule};
pub use run::{RunSummary, ScheduleRun, ScheduleRunOutcome};
pub use shift::{AssignedShift, ShiftDemand, ShiftKey};
pub use types::{
    EmploymentType, HardRule, RuleType, ShiftPosition, SoftReason, WeekendPreference,
};
