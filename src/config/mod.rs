// ==========================================
// 门店月度排班引擎 - 配置层
// ==========================================
// 职责: 排班权重与遍数上限的读取/覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, PassLimits, SchedulerWeights};
