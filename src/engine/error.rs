// ==========================================
// 车队安全运营系统 - 引擎层错误类型
// ==========================================
// 职责: 统一引擎对外错误分类,并为所有存储调用设置超时上限
// 分类: 校验失败 / 未找到 / 瞬时IO / 事件已写入但分值未生效
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("校验失败: {0}")]
    Validation(String),

    #[error("资源未找到: {entity} id={id}")]
    NotFound { entity: String, id: String },

    #[error("存储调用失败(可重试): {0}")]
    TransientIo(String),

    /// 分值递增阶段的 TransientIo: 事件已提交, 分值未变
    #[error("风险事件已写入但分值未生效: event_id={event_id}, reason={reason}")]
    ScoreNotApplied { event_id: String, reason: String },
}

impl EngineError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        EngineError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

// 只区分 NotFound,其余存储错误统一视为瞬时IO
impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            other => EngineError::TransientIo(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;

/// 默认单次存储调用超时（毫秒）
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// 带超时的存储调用
///
/// # 参数
/// - `timeout`: 超时上限
/// - `op`: 调用名称 (日志/错误信息使用)
/// - `fut`: 存储调用
///
/// # 返回
/// - 超时映射为 TransientIo
pub async fn bounded<T, F>(timeout: Duration, op: &str, fut: F) -> EngineResult<T>
where
    F: Future<Output = RepositoryResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(EngineError::from),
        Err(_) => {
            tracing::warn!(op = op, timeout_ms = timeout.as_millis() as u64, "存储调用超时");
            Err(EngineError::TransientIo(format!(
                "{} 超时 ({}ms)",
                op,
                timeout.as_millis()
            )))
        }
    }
}
