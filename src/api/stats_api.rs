// ==========================================
// 智能垃圾桶车队 - 统计 API
// ==========================================

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::domain::stats::FleetStats;
use crate::engine::stats_aggregator::StatsAggregator;
use crate::perf::PerfGuard;

pub struct StatsApi {
    aggregator: Arc<StatsAggregator>,
}

impl StatsApi {
    pub fn new(aggregator: Arc<StatsAggregator>) -> Self {
        Self { aggregator }
    }

    /// 车队统计（单次一致快照）
    pub fn get_stats(&self) -> ApiResult<FleetStats> {
        let _perf = PerfGuard::new("get_stats");
        Ok(self.aggregator.compute()?)
    }
}
