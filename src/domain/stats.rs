// ==========================================
// 智能垃圾桶车队 - 车队统计模型
// ==========================================

use crate::domain::types::BinType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 车队统计快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetStats {
    pub total_bins: i64,
    /// status = full 的数量
    pub full_bins: i64,
    /// maintenance_required = true 的数量
    pub needs_maintenance: i64,
    /// 平均填充率（保留 1 位小数，无垃圾桶时为 0.0）
    pub avg_fill_percentage: f64,
    /// 覆盖全部类型（数量为 0 也列出）
    pub bins_by_type: BTreeMap<BinType, i64>,
    /// 只包含实际存在的区域
    pub bins_by_district: BTreeMap<String, i64>,
}

impl FleetStats {
    /// 空车队统计
    pub fn empty() -> Self {
        Self {
            total_bins: 0,
            full_bins: 0,
            needs_maintenance: 0,
            avg_fill_percentage: 0.0,
            bins_by_type: BinType::ALL.iter().map(|t| (*t, 0)).collect(),
            bins_by_district: BTreeMap::new(),
        }
    }
}
