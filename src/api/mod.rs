// ==========================================
// 门店月度排班引擎 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供上层命令行/服务调用
// ==========================================

pub mod error;
pub mod schedule_api;

// 重导出核心类型
pub use error::{ScheduleError, ScheduleResult};
pub use schedule_api::ScheduleApi;
