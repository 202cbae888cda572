// ==========================================
// 智能垃圾桶车队 - 车队统计聚合
// ==========================================
// 只读: 基于 BinRepository::fleet_snapshot 的单次快照计算
// ==========================================

use crate::domain::stats::FleetStats;
use crate::domain::types::BinType;
use crate::repository::bin_repo::{BinRepository, FleetSnapshot};
use crate::repository::error::RepositoryResult;
use std::sync::Arc;
use tracing::{instrument, warn};

pub struct StatsAggregator {
    bin_repo: Arc<BinRepository>,
}

impl StatsAggregator {
    pub fn new(bin_repo: Arc<BinRepository>) -> Self {
        Self { bin_repo }
    }

    /// 计算车队统计
    #[instrument(skip(self))]
    pub fn compute(&self) -> RepositoryResult<FleetStats> {
        let snapshot = self.bin_repo.fleet_snapshot()?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// 从原始快照构造统计结果
    ///
    /// - 平均填充率保留 1 位小数（恰为一半时取偶），无垃圾桶时为 0.0
    /// - bins_by_type 补齐全部类型
    pub fn from_snapshot(snapshot: FleetSnapshot) -> FleetStats {
        let mut stats = FleetStats::empty();
        stats.total_bins = snapshot.total_bins;
        stats.full_bins = snapshot.full_bins;
        stats.needs_maintenance = snapshot.maintenance_bins;
        stats.avg_fill_percentage = round_one_decimal(snapshot.avg_fill.unwrap_or(0.0));

        for (raw_type, count) in snapshot.by_type {
            match BinType::parse(&raw_type) {
                Some(bin_type) => {
                    stats.bins_by_type.insert(bin_type, count);
                }
                None => warn!(bin_type = %raw_type, "统计时遇到未知垃圾桶类型, 已忽略"),
            }
        }

        stats.bins_by_district = snapshot.by_district.into_iter().collect();
        stats
    }
}

// 保留 1 位小数，恰好 .x5 时取偶数（银行家舍入）
fn round_one_decimal(value: f64) -> f64 {
    let scaled = value * 10.0;
    let rounded = scaled.round();
    let is_tie = (scaled - scaled.trunc()).abs() == 0.5;
    let even = if is_tie && rounded % 2.0 != 0.0 {
        rounded - scaled.signum()
    } else {
        rounded
    };
    even / 10.0
}
