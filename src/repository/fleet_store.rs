// ==========================================
// 车队安全运营系统 - 驾驶员/风险/辅导计划 Store Trait
// ==========================================
// 职责: 定义后端数据存储接口（不包含业务逻辑）
// 红线: Store 不含业务规则,只做数据 CRUD
// 实现者: SqliteFleetStore（使用 rusqlite）
// ==========================================

use crate::domain::coaching::{CoachingPlan, CoachingPlanPatch, NewCoachingPlan};
use crate::domain::driver::{Driver, DriverPatch, NewDriver};
use crate::domain::risk_event::{NewRiskEvent, RiskEvent};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// FleetStore Trait
// ==========================================
#[async_trait]
pub trait FleetStore: Send + Sync {
    // ===== 驾驶员 =====

    /// 按ID查询驾驶员
    ///
    /// # 返回
    /// - Ok(Some(Driver)): 找到
    /// - Ok(None): 不存在
    async fn get_driver_by_id(&self, driver_id: &str) -> RepositoryResult<Option<Driver>>;

    /// 查询全部驾驶员 (按姓名排序)
    async fn list_drivers(&self) -> RepositoryResult<Vec<Driver>>;

    /// 新建驾驶员
    async fn insert_driver(&self, driver: NewDriver) -> RepositoryResult<Driver>;

    /// 直接编辑驾驶员 (不涉及风险分)
    ///
    /// # 错误
    /// - NotFound: 驾驶员不存在
    async fn update_driver(&self, driver_id: &str, patch: DriverPatch) -> RepositoryResult<Driver>;

    /// 覆盖写入风险分
    async fn update_driver_score(&self, driver_id: &str, score: i64) -> RepositoryResult<Driver>;

    /// 原子增量更新风险分
    ///
    /// # 说明
    /// - 由存储端完成 `risk_score = risk_score + delta`,避免读改写丢失更新
    async fn increment_driver_score(&self, driver_id: &str, delta: i64)
        -> RepositoryResult<Driver>;

    // ===== 风险事件 (只追加) =====

    /// 追加风险事件
    ///
    /// # 参数
    /// - event: 录入信息
    /// - points: 创建时派生的分值
    async fn add_risk_event(&self, event: NewRiskEvent, points: i64) -> RepositoryResult<RiskEvent>;

    /// 查询驾驶员的风险事件 (最新在前)
    async fn list_risk_events(&self, driver_id: &str) -> RepositoryResult<Vec<RiskEvent>>;

    // ===== 辅导计划 =====

    /// 新建辅导计划
    async fn add_coaching_plan(
        &self,
        driver_id: &str,
        driver_name: &str,
        plan: NewCoachingPlan,
    ) -> RepositoryResult<CoachingPlan>;

    /// 按ID查询辅导计划
    async fn get_coaching_plan(&self, plan_id: &str) -> RepositoryResult<Option<CoachingPlan>>;

    /// 查询辅导计划 (driver_id 为 None 时返回全部)
    async fn list_coaching_plans(&self, driver_id: Option<&str>)
        -> RepositoryResult<Vec<CoachingPlan>>;

    /// 更新辅导计划 (打卡列表与状态一次写入)
    ///
    /// # 错误
    /// - NotFound: 计划不存在
    async fn update_coaching_plan(
        &self,
        plan_id: &str,
        patch: CoachingPlanPatch,
    ) -> RepositoryResult<CoachingPlan>;

    /// 删除辅导计划
    ///
    /// # 错误
    /// - NotFound: 计划不存在 (重复删除同样返回 NotFound)
    async fn delete_coaching_plan(&self, plan_id: &str) -> RepositoryResult<()>;
}
