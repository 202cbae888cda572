// ==========================================
// 智能垃圾桶车队 - API层
// ==========================================
// 职责: 对外业务接口，负责参数解析/校验与错误归类
// 红线: API层不直接拼 SQL，写入规则委托给 engine
// ==========================================

pub mod bin_api;
pub mod config_api;
pub mod error;
pub mod schedule_api;
pub mod stats_api;
pub mod validator;

// 重导出核心类型
pub use bin_api::{BinApi, BinUpdateRequest, CreateBinRequest, ListBinsQuery};
pub use config_api::{ConfigApi, ConfigItem};
pub use error::{ApiError, ApiResult};
pub use schedule_api::{CreateScheduleRequest, ScheduleApi};
pub use stats_api::StatsApi;
