// ==========================================
// 门店月度排班引擎 - 引擎层
// ==========================================
// 职责: 实现排班规则与流水线, 不拼 SQL
// 红线: 硬约束拒绝与软约束评分必须输出 reason
// ==========================================

pub mod constraint_index;
pub mod generator;
pub mod greedy;
pub mod optimizer;
pub mod profile;
pub mod repair;
pub mod scorer;
pub mod state;
pub mod timeline;
pub mod validator;
pub mod weekend;

// 重导出核心引擎
pub use constraint_index::ConstraintIndex;
pub use generator::ScheduleGenerator;
pub use greedy::{GreedyBuilder, GreedyOutcome};
pub use optimizer::SwapOptimizer;
pub use profile::ProfileBuilder;
pub use repair::RepairEngine;
pub use scorer::SoftScorer;
pub use state::ScheduleState;
pub use validator::HardConstraintValidator;
pub use weekend::WeekendBalancer;
