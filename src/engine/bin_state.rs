// ==========================================
// 智能垃圾桶车队 - 垃圾桶状态变更规则
// ==========================================
// 职责: 定义三类变更（稀疏更新 / 清空 / 传感器增量）对 Bin 的作用
// 约束: 每次修改填充率或维护标志后，同一次变更内重新分类状态
// 使用: 作为 BinRepository::update_with 的闭包，在写事务内执行
// ==========================================

use crate::domain::bin::{Bin, BinPatch};
use crate::domain::types::BinStatus;
use crate::engine::status_classifier::classify;
use chrono::{DateTime, Utc};

/// 应用稀疏更新
///
/// 只修改 patch 中提供的字段；状态按新的填充率/维护标志重新分类，
/// 若 patch 显式给出 status 则覆写分类结果（见 `BinPatch` 文档）。
/// 无论是否有字段变化都会刷新 `last_sensor_update`。
pub fn apply_patch(bin: &mut Bin, patch: &BinPatch, now: DateTime<Utc>) {
    if let Some(fill) = patch.current_fill_percentage {
        bin.current_fill_percentage = fill;
    }
    if let Some(maintenance) = patch.maintenance_required {
        bin.maintenance_required = maintenance;
    }

    bin.status = match patch.status {
        Some(forced) => forced,
        None => classify(bin.current_fill_percentage, bin.maintenance_required),
    };
    bin.last_sensor_update = now;
}

/// 清空垃圾桶
///
/// 无条件置为 fill=0 / status=empty，维护标志保持不变。
pub fn reset(bin: &mut Bin, now: DateTime<Utc>) {
    bin.current_fill_percentage = 0;
    bin.status = BinStatus::Empty;
    bin.last_emptied = now;
}

/// 应用一次传感器读数增量（上限 100）
///
/// 返回本次实际增加的百分比（已满时为 0）。
pub fn apply_sensor_increment(bin: &mut Bin, delta: i32, now: DateTime<Utc>) -> i32 {
    let before = bin.current_fill_percentage;
    bin.current_fill_percentage = (before + delta.max(0)).min(100);
    bin.status = classify(bin.current_fill_percentage, bin.maintenance_required);
    bin.last_sensor_update = now;
    bin.current_fill_percentage - before
}
