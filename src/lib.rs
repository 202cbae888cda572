// ==========================================
// 智能垃圾桶车队 - 核心库
// ==========================================
// 技术栈: Rust + SQLite (rusqlite) + tokio
// 系统定位: 垃圾桶车队的状态跟踪、收运排程与统计
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/Schema）
pub mod db;

// 日志系统
pub mod logging;

// SQL 性能追踪
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - 启动组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BinStatus, BinType};

// 领域实体
pub use domain::{Bin, BinFilter, BinPatch, CollectionSchedule, FleetStats, NewBin, NewSchedule};

// 引擎
pub use engine::{CollectionWorkflow, SensorSimulator, StatsAggregator};

// API
pub use api::{ApiError, ApiResult, BinApi, ScheduleApi, StatsApi};

// 应用
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "智能垃圾桶车队";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
