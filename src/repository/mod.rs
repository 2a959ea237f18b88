// ==========================================
// 门店月度排班引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod audit_repo;
pub mod demand_repo;
pub mod error;
pub mod run_repo;
pub mod workforce_repo;

// 重导出核心仓储
pub use audit_repo::ScheduleAuditRepository;
pub use demand_repo::ShiftDemandRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use run_repo::ScheduleRunRepository;
pub use workforce_repo::WorkforceRepository;
