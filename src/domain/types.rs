// ==========================================
// 车队安全运营系统 - 领域类型定义
// ==========================================
// 职责: 风险等级、事件类型、计划/打卡状态等枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 风险色带 (Risk Band)
// ==========================================
// 红线: 等级制,阈值下沿包含 (50 -> YELLOW, 80 -> RED)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Green,  // 正常
    Yellow, // 关注
    Red,    // 高风险
}

impl RiskBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Green => "green",
            RiskBand::Yellow => "yellow",
            RiskBand::Red => "red",
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 风险事件类型 (Risk Event Type)
// ==========================================
// 分值在创建时确定,之后不可变
// Other 只承载未识别的标签: 经 from_label / other / canonical 构造
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskEventType {
    Speeding,       // 超速
    HardBraking,    // 急刹车
    HosViolation,   // 工时违规
    Accident,       // 事故
    Citation,       // 罚单
    Other(String),  // 其他 (保留原始描述)
}

impl RiskEventType {
    /// 未识别类型的默认分值
    pub const DEFAULT_POINTS: i64 = 5;

    /// 事件分值表
    pub fn points(&self) -> i64 {
        match self {
            RiskEventType::Speeding => 10,
            RiskEventType::HardBraking => 5,
            RiskEventType::HosViolation => 15,
            RiskEventType::Accident => 20,
            RiskEventType::Citation => 10,
            RiskEventType::Other(label) => match Self::from_label(label) {
                RiskEventType::Other(_) => Self::DEFAULT_POINTS,
                known => known.points(),
            },
        }
    }

    /// 展示/存储用标签
    pub fn label(&self) -> &str {
        match self {
            RiskEventType::Speeding => "Speeding",
            RiskEventType::HardBraking => "Hard Braking",
            RiskEventType::HosViolation => "HOS Violation",
            RiskEventType::Accident => "Accident",
            RiskEventType::Citation => "Citation",
            RiskEventType::Other(label) => label.as_str(),
        }
    }

    /// 从自由文本解析 (忽略大小写与多余空白)
    ///
    /// 未识别的文本原样保留为 Other
    pub fn from_label(raw: &str) -> Self {
        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();

        match normalized.as_str() {
            "speeding" => RiskEventType::Speeding,
            "hard braking" => RiskEventType::HardBraking,
            "hos violation" => RiskEventType::HosViolation,
            "accident" => RiskEventType::Accident,
            "citation" => RiskEventType::Citation,
            _ => RiskEventType::Other(raw.trim().to_string()),
        }
    }

    /// 构造未识别类型; 标签能识别时返回对应的已知类型
    pub fn other(label: &str) -> Self {
        Self::from_label(label)
    }

    /// 规范化: Other 中可识别的标签转为已知类型
    pub fn canonical(self) -> Self {
        match self {
            RiskEventType::Other(label) => Self::from_label(&label),
            known => known,
        }
    }
}

impl From<String> for RiskEventType {
    fn from(raw: String) -> Self {
        Self::from_label(&raw)
    }
}

impl From<RiskEventType> for String {
    fn from(event_type: RiskEventType) -> Self {
        event_type.label().to_string()
    }
}

impl fmt::Display for RiskEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ==========================================
// 驾驶员状态 (Driver Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverStatus {
    Active,    // 在岗
    Inactive,  // 离岗
    Suspended, // 停驾
}

impl DriverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::Active => "ACTIVE",
            DriverStatus::Inactive => "INACTIVE",
            DriverStatus::Suspended => "SUSPENDED",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "INACTIVE" => DriverStatus::Inactive,
            "SUSPENDED" => DriverStatus::Suspended,
            _ => DriverStatus::Active,
        }
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 辅导计划状态 (Plan Status)
// ==========================================
// 派生字段: 全部打卡完成 => COMPLETED, 否则 ACTIVE
// 非单调: 打卡回退会使计划回到 ACTIVE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    Active,
    Completed,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Active => "ACTIVE",
            PlanStatus::Completed => "COMPLETED",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "COMPLETED" => PlanStatus::Completed,
            _ => PlanStatus::Active,
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 打卡状态 (Check-in Status)
// ==========================================
// PENDING <-> COMPLETE, 双向可切换
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckInStatus {
    Pending,
    Complete,
}

impl fmt::Display for CheckInStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckInStatus::Pending => write!(f, "PENDING"),
            CheckInStatus::Complete => write!(f, "COMPLETE"),
        }
    }
}
