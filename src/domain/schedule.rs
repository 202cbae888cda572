// ==========================================
// 智能垃圾桶车队 - 收运排程领域模型
// ==========================================
// 对齐: collection_schedule 表
// 不变量: completed_at 存在 <=> completed = true
// 生命周期: 只允许 completed false -> true 单向转换
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// CollectionSchedule - 收运排程
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchedule {
    pub id: i64,
    pub bin_id: i64,
    pub scheduled_at: DateTime<Utc>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub truck_id: Option<String>,
    pub notes: Option<String>,
}

// ==========================================
// NewSchedule - 创建请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSchedule {
    pub bin_id: i64,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

// ==========================================
// ScheduleFilter - 列表过滤条件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleFilter {
    /// 仅返回未完成的排程（默认 true）
    pub upcoming_only: bool,
    pub bin_id: Option<i64>,
}

impl Default for ScheduleFilter {
    fn default() -> Self {
        Self {
            upcoming_only: true,
            bin_id: None,
        }
    }
}

// ==========================================
// CompletionOutcome - 收运完成结果
// ==========================================
/// 收运完成工作流的返回值
///
/// `bin_reset = false` 表示排程已完成但关联垃圾桶不存在（宽松处理，保留原有行为），
/// 或者排程此前已完成（幂等重放，不再重复清空）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub schedule: CollectionSchedule,
    pub bin_reset: bool,
    pub already_completed: bool,
}
