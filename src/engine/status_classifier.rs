// ==========================================
// 智能垃圾桶车队 - 状态分类器
// ==========================================
// 纯函数: (填充率, 维护标志) -> 状态
// 规则: 维护标志优先；否则按阈值从高到低匹配
// ==========================================

use crate::domain::types::BinStatus;

/// 满桶阈值
pub const FULL_THRESHOLD: i32 = 90;
/// 高位阈值
pub const HIGH_THRESHOLD: i32 = 70;
/// 中位阈值
pub const MEDIUM_THRESHOLD: i32 = 40;
/// 低位阈值
pub const LOW_THRESHOLD: i32 = 20;

/// 按填充率与维护标志计算状态
///
/// 填充率超出 0~100 属于调用方违约，这里不做校验（由仓储层与 API 校验器保证）。
pub fn classify(fill_percentage: i32, maintenance_required: bool) -> BinStatus {
    if maintenance_required {
        return BinStatus::NeedsMaintenance;
    }

    match fill_percentage {
        f if f >= FULL_THRESHOLD => BinStatus::Full,
        f if f >= HIGH_THRESHOLD => BinStatus::High,
        f if f >= MEDIUM_THRESHOLD => BinStatus::Medium,
        f if f >= LOW_THRESHOLD => BinStatus::Low,
        _ => BinStatus::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundaries() {
        let cases = [
            (0, BinStatus::Empty),
            (19, BinStatus::Empty),
            (20, BinStatus::Low),
            (39, BinStatus::Low),
            (40, BinStatus::Medium),
            (69, BinStatus::Medium),
            (70, BinStatus::High),
            (89, BinStatus::High),
            (90, BinStatus::Full),
            (100, BinStatus::Full),
        ];

        for (fill, expected) in cases {
            assert_eq!(classify(fill, false), expected, "fill={}", fill);
        }
    }

    #[test]
    fn test_maintenance_overrides_fill() {
        for fill in 0..=100 {
            assert_eq!(classify(fill, true), BinStatus::NeedsMaintenance);
        }
    }

    #[test]
    fn test_classify_is_deterministic() {
        for fill in 0..=100 {
            assert_eq!(classify(fill, false), classify(fill, false));
        }
    }
}
