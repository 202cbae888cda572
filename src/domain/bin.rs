// ==========================================
// 智能垃圾桶车队 - 垃圾桶领域模型
// ==========================================
// 对齐: bin 表
// 不变量: 0 <= current_fill_percentage <= 100
// 不变量: status 与 (填充率, 维护标志) 一致（显式状态覆写除外）
// ==========================================

use crate::domain::types::{BinStatus, BinType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 默认容量（升）
pub const DEFAULT_CAPACITY_LITERS: i32 = 120;

// ==========================================
// Bin - 垃圾桶
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    // ===== 主键 =====
    pub id: i64, // 创建时分配，不可变

    // ===== 基础信息 =====
    pub location: String,
    pub district: String,
    pub bin_type: BinType,
    pub capacity_liters: i32,

    // ===== 状态 =====
    pub current_fill_percentage: i32, // 0 ~ 100
    pub status: BinStatus,
    pub maintenance_required: bool,

    // ===== 时间戳 =====
    pub last_emptied: DateTime<Utc>,
    pub last_sensor_update: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// NewBin - 创建请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBin {
    pub location: String,
    pub district: String,
    #[serde(default)]
    pub bin_type: BinType,
    #[serde(default = "default_capacity")]
    pub capacity_liters: i32,
}

fn default_capacity() -> i32 {
    DEFAULT_CAPACITY_LITERS
}

impl NewBin {
    pub fn new(location: impl Into<String>, district: impl Into<String>, bin_type: BinType) -> Self {
        Self {
            location: location.into(),
            district: district.into(),
            bin_type,
            capacity_liters: DEFAULT_CAPACITY_LITERS,
        }
    }

    pub fn with_capacity(mut self, capacity_liters: i32) -> Self {
        self.capacity_liters = capacity_liters;
        self
    }
}

// ==========================================
// BinPatch - 稀疏更新
// ==========================================
/// 部分字段更新：只应用提供了值的字段，未提供的字段保持不变。
///
/// 状态计算顺序：
/// 1. 应用 `current_fill_percentage` / `maintenance_required`
/// 2. 按新值重新分类状态
/// 3. 若显式提供了 `status`，则以其覆写分类结果
///
/// 第 3 步是有意保留的逃生口：调用方可以强制指定状态，
/// 此时存储的状态可能与填充率不一致，直到下一次修改填充率/维护标志。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BinPatch {
    #[serde(default)]
    pub current_fill_percentage: Option<i32>,
    #[serde(default)]
    pub status: Option<BinStatus>,
    #[serde(default)]
    pub maintenance_required: Option<bool>,
}

impl BinPatch {
    pub fn maintenance(required: bool) -> Self {
        Self {
            maintenance_required: Some(required),
            ..Default::default()
        }
    }
}

// ==========================================
// BinFilter - 列表过滤条件（AND 组合）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BinFilter {
    pub district: Option<String>,
    pub bin_type: Option<BinType>,
    pub status: Option<BinStatus>,
    pub min_fill: Option<i32>,
}
