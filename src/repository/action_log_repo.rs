// ==========================================
// 车队安全运营系统 - 操作日志数据仓储
// ==========================================
// 依据: action_log 表 (db::ensure_schema)
// 红线: 引擎的每次写入都记录
// ==========================================

mod core;
mod queries;

#[cfg(test)]
mod tests;

pub use core::ActionLogRepository;
