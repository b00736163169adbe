// ==========================================
// 车队安全运营系统 - 命令行入口
// ==========================================
// 输出: 车队风险概览 (各色带人数 / 进行中的辅导计划)
// ==========================================

use fleet_safety::app::{get_default_db_path, AppState};
use fleet_safety::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 驾驶员风险评分与辅导计划", fleet_safety::APP_NAME);
    tracing::info!("系统版本: {}", fleet_safety::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).await.map_err(anyhow::Error::msg)?;
    let overview = state.driver_api.risk_overview().await?;

    println!("{} v{}", fleet_safety::APP_NAME, fleet_safety::VERSION);
    println!("驾驶员总数: {}", overview.total_drivers);
    println!("  green : {}", overview.green);
    println!("  yellow: {}", overview.yellow);
    println!("  red   : {}", overview.red);
    println!("进行中的辅导计划: {}", overview.active_plans);
    Ok(())
}
