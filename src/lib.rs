// ==========================================
// 门店月度排班引擎 - 核心库
// ==========================================
// 定位: 决策支持系统 (排班结果可人工复核/调整)
// 技术栈: Rust + SQLite
// 流水线: 贪心构建 → 修复 → 偏好交换 → 随机优化
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 排班规则与流水线
pub mod engine;

// 配置层 - 权重与上限
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    EmploymentType, HardRule, RuleType, ShiftPosition, SoftReason, WeekendPreference,
};

// 领域实体
pub use domain::{
    AssignedShift, AuditCandidateRecord, AuditShiftRecord, CandidateDetails, Employee,
    EmployeeProfile, ScheduleRun, ScheduleRunOutcome, ShiftDemand, ShiftKey,
};

// 引擎
pub use engine::{
    ConstraintIndex, GreedyBuilder, HardConstraintValidator, RepairEngine, ScheduleGenerator,
    ScheduleState, SoftScorer, SwapOptimizer, WeekendBalancer,
};

// 配置
pub use config::{ConfigManager, PassLimits, SchedulerWeights};

// API
pub use api::{ScheduleApi, ScheduleError};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "门店月度排班引擎";

// ==========================================
// 预编译检查
// ==========================================

// 确保编译时所有模块可见
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
