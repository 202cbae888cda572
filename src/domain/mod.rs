// ==========================================
// 智能垃圾桶车队 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod bin;
pub mod schedule;
pub mod stats;
pub mod types;

// 重导出核心类型
pub use bin::{Bin, BinFilter, BinPatch, NewBin, DEFAULT_CAPACITY_LITERS};
pub use schedule::{CollectionSchedule, CompletionOutcome, NewSchedule, ScheduleFilter};
pub use stats::FleetStats;
pub use types::{BinStatus, BinType};
