// ==========================================
// 车队安全运营系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换引擎/仓储错误为结构化结果
// 约定: 错误信息只描述原因,不做界面文案
// ==========================================

use crate::engine::bulk::BulkFailure;
use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 调用方前置条件
    // ==========================================
    /// 校验失败 (在任何存储调用之前检出, 不自动重试)
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 批量操作
    // ==========================================
    /// 批量操作部分失败, 已成功的条目不回滚
    #[error("批量操作部分失败: 成功{succeeded}个, 失败{}个", .failed.len())]
    PartialFailure {
        succeeded: usize,
        failed: Vec<BulkFailure>,
    },

    // ==========================================
    // 存储调用
    // ==========================================
    /// 网络/存储失败或超时 (可重试)
    #[error("存储调用失败: {0}")]
    TransientIo(String),

    /// 风险事件已写入, 驾驶员分值未更新
    ///
    /// TransientIo 的细化: 失败发生在分值递增这一步, 事件本身已提交.
    /// 不可重试 (重试会重复写入事件), 调用方应重新读取驾驶员.
    #[error("风险事件已写入但分值未生效: event_id={event_id}, reason={reason}")]
    ScoreNotApplied { event_id: String, reason: String },

    /// 并发冲突 (预留, 当前存储不检测)
    #[error("并发冲突: {0}")]
    ConcurrencyConflict(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 是否可由调用方重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::TransientIo(_) | ApiError::PartialFailure { .. }
        )
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => ApiError::ValidationError(msg),
            EngineError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            EngineError::TransientIo(msg) => ApiError::TransientIo(msg),
            EngineError::ScoreNotApplied { event_id, reason } => {
                ApiError::ScoreNotApplied { event_id, reason }
            }
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 说明: 只区分 NotFound, 其余存储故障视为瞬时IO
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::ValidationError(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
            other => ApiError::TransientIo(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
