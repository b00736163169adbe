// ==========================================
// 车队安全运营系统 - 运行参数读取 Trait
// ==========================================
// 职责: 定义引擎/API 所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

pub type ConfigError = Box<dyn Error + Send + Sync>;

// ==========================================
// SafetyConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
// 约定: 配置缺失或格式错误时返回默认值, 仅存储故障返回 Err
#[async_trait]
pub trait SafetyConfigReader: Send + Sync {
    /// 单次存储调用超时（毫秒）
    ///
    /// # 默认值
    /// - 10000
    async fn get_request_timeout_ms(&self) -> Result<u64, ConfigError>;

    /// 批量操作并发上限
    ///
    /// # 默认值
    /// - 4
    async fn get_bulk_max_concurrency(&self) -> Result<usize, ConfigError>;

    /// 批量操作单条超时（毫秒）
    ///
    /// # 默认值
    /// - 30000
    async fn get_bulk_item_timeout_ms(&self) -> Result<u64, ConfigError>;

    /// 新建驾驶员的初始风险分
    ///
    /// # 默认值
    /// - 0
    async fn get_default_driver_risk_score(&self) -> Result<i64, ConfigError>;

    /// 提醒附言最小长度
    ///
    /// # 默认值
    /// - 10
    async fn get_reminder_min_message_len(&self) -> Result<usize, ConfigError>;
}
