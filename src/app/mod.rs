// ==========================================
// 车队安全运营系统 - 应用层
// ==========================================
// 职责: 组装仓储/引擎/API, 持有本地用户档案
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
