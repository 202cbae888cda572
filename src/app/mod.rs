// ==========================================
// 智能垃圾桶车队 - 应用层
// ==========================================
// 职责: 组装各层实例，管理启动/停止
// ==========================================

pub mod seed;
pub mod state;

// 重导出
pub use seed::{seed_demo_data, SeedReport};
pub use state::AppState;
