// ==========================================
// 车队安全运营系统 - 批量操作协调器
// ==========================================
// 职责: 对 N 个独立条目并发执行同一操作,汇总成功/失败
// 红线: 不得吞掉失败; succeeded + failed = total
// 并发: 上限 max_concurrency, 单条超时 item_timeout
// 无全局事务: 已成功的条目不会因其他条目失败而回滚
// ==========================================

use crate::domain::coaching::CoachingPlan;
use crate::domain::document::{Document, DocumentUpload};
use crate::domain::risk_event::NewRiskEvent;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// 默认并发上限
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// 默认单条超时 (毫秒)
pub const DEFAULT_ITEM_TIMEOUT_MS: u64 = 30_000;

// ==========================================
// BulkKey - 批量条目标识
// ==========================================
/// 失败报告中用于定位条目的标识
pub trait BulkKey {
    fn bulk_key(&self) -> String;
}

impl BulkKey for String {
    fn bulk_key(&self) -> String {
        self.clone()
    }
}

impl BulkKey for Document {
    fn bulk_key(&self) -> String {
        self.document_id.clone()
    }
}

impl BulkKey for DocumentUpload {
    fn bulk_key(&self) -> String {
        self.file_name.clone()
    }
}

impl BulkKey for NewRiskEvent {
    fn bulk_key(&self) -> String {
        format!("{}@{}", self.driver_id, self.event_date)
    }
}

impl BulkKey for CoachingPlan {
    fn bulk_key(&self) -> String {
        self.plan_id.clone()
    }
}

// ==========================================
// BulkOperationResult
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkFailure {
    pub key: String,
    pub reason: String,
}

/// 批量执行结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkOperationResult<O> {
    pub succeeded: Vec<O>,
    pub failed: Vec<BulkFailure>,
    pub total: usize,
}

impl<O> BulkOperationResult<O> {
    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// 成功数 + 失败数 == 总数
    pub fn is_reconciled(&self) -> bool {
        self.succeeded.len() + self.failed.len() == self.total
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty() && self.is_reconciled()
    }

    pub fn failed_keys(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.key.as_str()).collect()
    }
}

// ==========================================
// BulkOperationCoordinator
// ==========================================
#[derive(Debug, Clone)]
pub struct BulkOperationCoordinator {
    max_concurrency: usize,
    item_timeout: Duration,
}

impl Default for BulkOperationCoordinator {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_CONCURRENCY,
            Duration::from_millis(DEFAULT_ITEM_TIMEOUT_MS),
        )
    }
}

impl BulkOperationCoordinator {
    pub fn new(max_concurrency: usize, item_timeout: Duration) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            item_timeout,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn item_timeout(&self) -> Duration {
        self.item_timeout
    }

    /// 并发执行批量操作
    ///
    /// # 参数
    /// - `label`: 批量操作名称 (日志使用)
    /// - `items`: 待处理条目
    /// - `op`: 单条操作
    ///
    /// # 返回
    /// 每个条目恰好出现在 succeeded 或 failed 之一; 顺序不保证
    pub async fn execute<I, O, E, F, Fut>(
        &self,
        label: &str,
        items: Vec<I>,
        op: F,
    ) -> BulkOperationResult<O>
    where
        I: BulkKey,
        E: Display,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<O, E>>,
    {
        let total = items.len();
        let item_timeout = self.item_timeout;
        let op = &op;

        let outcomes: Vec<Result<O, BulkFailure>> = stream::iter(items)
            .map(|item| {
                let key = item.bulk_key();
                async move {
                    match tokio::time::timeout(item_timeout, op(item)).await {
                        Ok(Ok(output)) => Ok(output),
                        Ok(Err(e)) => Err(BulkFailure {
                            key,
                            reason: e.to_string(),
                        }),
                        Err(_) => Err(BulkFailure {
                            key,
                            reason: format!("超时 ({}ms)", item_timeout.as_millis()),
                        }),
                    }
                }
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut result = BulkOperationResult {
            succeeded: Vec::with_capacity(total),
            failed: Vec::new(),
            total,
        };
        for outcome in outcomes {
            match outcome {
                Ok(output) => result.succeeded.push(output),
                Err(failure) => result.failed.push(failure),
            }
        }

        if result.failed.is_empty() {
            info!(op = label, total = total, "批量操作完成");
        } else {
            warn!(
                op = label,
                total = total,
                succeeded = result.succeeded_count(),
                failed = result.failed_count(),
                failed_keys = ?result.failed_keys(),
                "批量操作部分失败"
            );
        }
        result
    }
}
