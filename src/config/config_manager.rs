// ==========================================
// 门店月度排班引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 引擎只接收 SchedulerWeights / PassLimits 快照, 打分保持纯函数
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

// ==========================================
// SchedulerWeights - 软约束权重快照
// ==========================================
/// 打分器权重（一次运行开始时从 config_kv 读取一次）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerWeights {
    /// 周末偏好命中（排到想要的那天）
    pub weekend_pref_match: f64,

    /// 周末偏好错位（想周六却排周日, 反之亦然）
    pub weekend_pref_opposite: f64,

    /// 周末偏好 either 的小额奖励
    pub weekend_pref_either: f64,

    /// 避开闭转开（前日非收尾 + 当日开店）
    pub avoid_clopen: f64,

    /// 制造闭转开（前日收尾 + 当日开店）
    pub create_clopen: f64,

    /// 连续工作超过 5 天后, 每多一天的惩罚
    pub extra_consecutive_day: f64,

    /// 全职距 30h/周 缺口的奖励系数
    pub ft_hours_remaining: f64,

    /// 全职超时惩罚系数（超过宽限后生效）
    pub ft_hours_over: f64,

    /// 兼职向理想周工时靠拢的奖励系数
    pub pt_toward_ideal: f64,

    /// 兼职超过理想周工时的惩罚系数
    pub pt_over_ideal: f64,
}

impl Default for SchedulerWeights {
    fn default() -> Self {
        Self {
            weekend_pref_match: 100.0,
            weekend_pref_opposite: -50.0,
            weekend_pref_either: 5.0,
            avoid_clopen: 20.0,
            create_clopen: -40.0,
            extra_consecutive_day: -15.0,
            ft_hours_remaining: 20.0,
            ft_hours_over: -4.0,
            pt_toward_ideal: 5.0,
            pt_over_ideal: -15.0,
        }
    }
}

// ==========================================
// PassLimits - 后处理遍数上限快照
// ==========================================
/// 修复/交换各遍的迭代上限
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassLimits {
    /// 修复遍最多转移的班次数
    pub max_repair_swaps: usize,

    /// 周末偏好交换遍最多执行的交换数
    pub max_preference_swaps: usize,

    /// 随机爬山优化的尝试次数
    pub optimization_swap_attempts: usize,
}

impl Default for PassLimits {
    fn default() -> Self {
        Self {
            max_repair_swaps: 100,
            max_preference_swaps: 50,
            optimization_swap_attempts: 200,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置值（UPSERT）
    ///
    /// # 用途
    /// - 种子工具写入默认权重
    /// - 测试覆盖单个权重/上限
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取 f64 配置, 解析失败回落默认值
    fn get_f64_or(&self, key: &str, default: f64) -> RepositoryResult<f64> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        Ok(value.parse::<f64>().unwrap_or(default))
    }

    /// 读取 usize 配置, 解析失败回落默认值
    fn get_usize_or(&self, key: &str, default: usize) -> RepositoryResult<usize> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        Ok(value.parse::<usize>().unwrap_or(default))
    }

    /// 获取打分器权重快照
    ///
    /// # 规则
    /// - 每个键独立读取, 缺失或格式错误的键回落到默认值
    pub fn get_scheduler_weights(&self) -> RepositoryResult<SchedulerWeights> {
        let defaults = SchedulerWeights::default();
        Ok(SchedulerWeights {
            weekend_pref_match: self.get_f64_or(
                config_keys::WEIGHT_WEEKEND_PREF_MATCH,
                defaults.weekend_pref_match,
            )?,
            weekend_pref_opposite: self.get_f64_or(
                config_keys::WEIGHT_WEEKEND_PREF_OPPOSITE,
                defaults.weekend_pref_opposite,
            )?,
            weekend_pref_either: self.get_f64_or(
                config_keys::WEIGHT_WEEKEND_PREF_EITHER,
                defaults.weekend_pref_either,
            )?,
            avoid_clopen: self.get_f64_or(config_keys::WEIGHT_AVOID_CLOPEN, defaults.avoid_clopen)?,
            create_clopen: self
                .get_f64_or(config_keys::WEIGHT_CREATE_CLOPEN, defaults.create_clopen)?,
            extra_consecutive_day: self.get_f64_or(
                config_keys::WEIGHT_EXTRA_CONSECUTIVE_DAY,
                defaults.extra_consecutive_day,
            )?,
            ft_hours_remaining: self.get_f64_or(
                config_keys::WEIGHT_FT_HOURS_REMAINING,
                defaults.ft_hours_remaining,
            )?,
            ft_hours_over: self
                .get_f64_or(config_keys::WEIGHT_FT_HOURS_OVER, defaults.ft_hours_over)?,
            pt_toward_ideal: self.get_f64_or(
                config_keys::WEIGHT_PT_TOWARD_IDEAL,
                defaults.pt_toward_ideal,
            )?,
            pt_over_ideal: self
                .get_f64_or(config_keys::WEIGHT_PT_OVER_IDEAL, defaults.pt_over_ideal)?,
        })
    }

    /// 获取后处理遍数上限快照
    pub fn get_pass_limits(&self) -> RepositoryResult<PassLimits> {
        let defaults = PassLimits::default();
        Ok(PassLimits {
            max_repair_swaps: self
                .get_usize_or(config_keys::MAX_REPAIR_SWAPS, defaults.max_repair_swaps)?,
            max_preference_swaps: self.get_usize_or(
                config_keys::MAX_PREFERENCE_SWAPS,
                defaults.max_preference_swaps,
            )?,
            optimization_swap_attempts: self.get_usize_or(
                config_keys::OPTIMIZATION_SWAP_ATTEMPTS,
                defaults.optimization_swap_attempts,
            )?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 周末偏好权重
    pub const WEIGHT_WEEKEND_PREF_MATCH: &str = "weight_weekend_pref_match";
    pub const WEIGHT_WEEKEND_PREF_OPPOSITE: &str = "weight_weekend_pref_opposite";
    pub const WEIGHT_WEEKEND_PREF_EITHER: &str = "weight_weekend_pref_either";

    // 闭转开权重
    pub const WEIGHT_AVOID_CLOPEN: &str = "weight_avoid_clopen";
    pub const WEIGHT_CREATE_CLOPEN: &str = "weight_create_clopen";

    // 连续天数
    pub const WEIGHT_EXTRA_CONSECUTIVE_DAY: &str = "weight_extra_consecutive_day";

    // 工时目标
    pub const WEIGHT_FT_HOURS_REMAINING: &str = "weight_ft_hours_remaining";
    pub const WEIGHT_FT_HOURS_OVER: &str = "weight_ft_hours_over";
    pub const WEIGHT_PT_TOWARD_IDEAL: &str = "weight_pt_toward_ideal";
    pub const WEIGHT_PT_OVER_IDEAL: &str = "weight_pt_over_ideal";

    // 后处理遍数上限
    pub const MAX_REPAIR_SWAPS: &str = "max_repair_swaps";
    pub const MAX_PREFERENCE_SWAPS: &str = "max_preference_swaps";
    pub const OPTIMIZATION_SWAP_ATTEMPTS: &str = "optimization_swap_attempts";
}
