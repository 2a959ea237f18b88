// ==========================================
// 门店月度排班引擎 - API层错误类型
// ==========================================
// 职责: 排班流程与查询接口的错误定义
// 欠排不是错误: 缺口人次记录在审计汇总里, 运行正常返回
// ==========================================

use crate::repository::error::RepositoryError;
use chrono::NaiveDate;
use thiserror::Error;

/// 排班流程错误
#[derive(Error, Debug)]
pub enum ScheduleError {
    // ==========================================
    // 输入前置条件错误
    // ==========================================
    /// 排班区间起始晚于结束
    #[error("无效排班区间: month_start={month_start} 晚于 month_end={month_end}")]
    InvalidRange {
        month_start: NaiveDate,
        month_end: NaiveDate,
    },

    /// 区间内无需求班次
    #[error("门店在区间内无需求班次: studio_id={studio_id}, {month_start}..={month_end}")]
    NoDemand {
        studio_id: String,
        month_start: NaiveDate,
        month_end: NaiveDate,
    },

    /// 公司无在职员工
    #[error("公司无在职员工可排班: company_id={company_id}")]
    NoEligibleWorkforce { company_id: String },

    // ==========================================
    // 运行期错误
    // ==========================================
    /// 运行记录创建失败 (运行ID未铸造, 无任何副作用)
    #[error("排班运行创建失败: {0}")]
    RunCreationFailure(#[source] RepositoryError),

    /// 数据访问错误
    #[error("数据访问错误: {0}")]
    Repository(#[from] RepositoryError),
}

/// Result 类型别名
pub type ScheduleResult<T> = Result<T, ScheduleError>;
