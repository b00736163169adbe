// ==========================================
// 车队安全运营系统 - 风险色带分类
// ==========================================
// 规则: score >= 80 -> RED; score >= 50 -> YELLOW; 其余 GREEN
// 纯函数,全定义域,无副作用
// ==========================================

use crate::domain::types::RiskBand;

/// RED 下沿 (包含)
pub const RED_THRESHOLD: i64 = 80;
/// YELLOW 下沿 (包含)
pub const YELLOW_THRESHOLD: i64 = 50;

/// 风险分 -> 色带
pub fn classify(score: i64) -> RiskBand {
    if score >= RED_THRESHOLD {
        RiskBand::Red
    } else if score >= YELLOW_THRESHOLD {
        RiskBand::Yellow
    } else {
        RiskBand::Green
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(classify(49), RiskBand::Green);
        assert_eq!(classify(50), RiskBand::Yellow);
        assert_eq!(classify(79), RiskBand::Yellow);
        assert_eq!(classify(80), RiskBand::Red);
    }

    #[test]
    fn test_band_extremes() {
        assert_eq!(classify(i64::MIN), RiskBand::Green);
        assert_eq!(classify(-5), RiskBand::Green);
        assert_eq!(classify(0), RiskBand::Green);
        assert_eq!(classify(i64::MAX), RiskBand::Red);
    }
}
