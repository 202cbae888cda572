// ==========================================
// 智能垃圾桶车队 - 引擎层
// ==========================================
// 职责: 实现业务规则（状态分类、变更规则、收运工作流、统计、传感器模拟）
// 红线: 规则不拼 SQL（SQL 只出现在仓储层）
// ==========================================

pub mod bin_state;
pub mod collection_workflow;
pub mod sensor_simulator;
pub mod stats_aggregator;
pub mod status_classifier;

// 重导出核心引擎
pub use collection_workflow::CollectionWorkflow;
pub use sensor_simulator::{FillDecider, RandomFillDecider, SensorSimulator, TickReport};
pub use stats_aggregator::StatsAggregator;
pub use status_classifier::classify;
