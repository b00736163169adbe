// ==========================================
// 车队安全运营系统 - 核心库
// ==========================================
// 范围: 驾驶员风险评分、辅导计划生命周期、批量文档操作
// 技术栈: tokio + rusqlite + tracing
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 运行参数与用户档案
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CheckInStatus, DriverStatus, PlanStatus, RiskBand, RiskEventType};

// 领域实体
pub use domain::{
    ActionLog, ActionType, CheckIn, CheckInField, CoachingPlan, Document, DocumentPatch,
    DocumentUpload, Driver, DriverPatch, NewDriver, NewRiskEvent, RiskEvent,
};

// 引擎
pub use engine::{
    BulkOperationCoordinator, BulkOperationResult, CheckInStateMachine, CoachingPlanScheduler,
    EngineError, LocalMirror, OptimisticUpdateGuard, RiskEventLedger,
};

// API
pub use api::{ApiError, ApiResult, CoachingApi, DocumentApi, DriverApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "车队安全运营系统";
