// ==========================================
// 智能垃圾桶车队 - 领域类型定义
// ==========================================
// 序列化格式: snake_case (与数据库存储一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 垃圾桶类型 (Bin Type)
// ==========================================
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BinType {
    #[default]
    General,   // 其他垃圾
    Recycling, // 可回收物
    Organic,   // 厨余垃圾
    Hazardous, // 有害垃圾
}

impl BinType {
    /// 全部类型（统计时需要覆盖全部类型，即使数量为 0）
    pub const ALL: [BinType; 4] = [
        BinType::General,
        BinType::Recycling,
        BinType::Organic,
        BinType::Hazardous,
    ];

    /// 数据库存储值
    pub fn as_str(&self) -> &'static str {
        match self {
            BinType::General => "general",
            BinType::Recycling => "recycling",
            BinType::Organic => "organic",
            BinType::Hazardous => "hazardous",
        }
    }

    /// 从字符串解析（大小写不敏感），未知值返回 None
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Some(BinType::General),
            "recycling" => Some(BinType::Recycling),
            "organic" => Some(BinType::Organic),
            "hazardous" => Some(BinType::Hazardous),
            _ => None,
        }
    }
}

impl fmt::Display for BinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 垃圾桶状态 (Bin Status)
// ==========================================
// 由填充率 + 维护标志派生，见 engine::status_classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinStatus {
    Empty,            // < 20%
    Low,              // 20% ~ 39%
    Medium,           // 40% ~ 69%
    High,             // 70% ~ 89%
    Full,             // >= 90%
    NeedsMaintenance, // 需要维护（优先于填充率）
}

impl BinStatus {
    /// 数据库存储值
    pub fn as_str(&self) -> &'static str {
        match self {
            BinStatus::Empty => "empty",
            BinStatus::Low => "low",
            BinStatus::Medium => "medium",
            BinStatus::High => "high",
            BinStatus::Full => "full",
            BinStatus::NeedsMaintenance => "needs_maintenance",
        }
    }

    /// 从字符串解析（大小写不敏感），未知值返回 None
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "empty" => Some(BinStatus::Empty),
            "low" => Some(BinStatus::Low),
            "medium" => Some(BinStatus::Medium),
            "high" => Some(BinStatus::High),
            "full" => Some(BinStatus::Full),
            "needs_maintenance" => Some(BinStatus::NeedsMaintenance),
            _ => None,
        }
    }
}

impl fmt::Display for BinStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_type_parse_is_case_insensitive() {
        assert_eq!(BinType::parse("RECYCLING"), Some(BinType::Recycling));
        assert_eq!(BinType::parse(" organic "), Some(BinType::Organic));
        assert_eq!(BinType::parse("plastic"), None);
    }

    #[test]
    fn test_bin_status_db_values() {
        for status in [
            BinStatus::Empty,
            BinStatus::Low,
            BinStatus::Medium,
            BinStatus::High,
            BinStatus::Full,
            BinStatus::NeedsMaintenance,
        ] {
            assert_eq!(BinStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&BinStatus::NeedsMaintenance).unwrap();
        assert_eq!(json, "\"needs_maintenance\"");
        let parsed: BinType = serde_json::from_str("\"hazardous\"").unwrap();
        assert_eq!(parsed, BinType::Hazardous);
    }
}
