// ==========================================
// 智能垃圾桶车队 - 收运排程 API
// ==========================================
// 职责: 排程查询、创建、完成（完成时联动清空垃圾桶）
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::domain::schedule::{CollectionSchedule, CompletionOutcome, NewSchedule, ScheduleFilter};
use crate::engine::collection_workflow::CollectionWorkflow;
use crate::perf::PerfGuard;
use crate::repository::schedule_repo::ScheduleRepository;

/// 创建排程请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub bin_id: i64,
    /// RFC 3339；不带时区时按 UTC 处理
    pub scheduled_at: String,
    #[serde(default)]
    pub notes: Option<String>,
}

// ==========================================
// ScheduleApi - 收运排程 API
// ==========================================
pub struct ScheduleApi {
    schedule_repo: Arc<ScheduleRepository>,
    workflow: Arc<CollectionWorkflow>,
}

impl ScheduleApi {
    pub fn new(schedule_repo: Arc<ScheduleRepository>, workflow: Arc<CollectionWorkflow>) -> Self {
        Self {
            schedule_repo,
            workflow,
        }
    }

    /// 查询排程，按计划时间升序
    ///
    /// # 参数
    /// - upcoming_only: 仅未完成（缺省 true）
    /// - bin_id: 仅指定垃圾桶
    pub fn list_schedules(
        &self,
        upcoming_only: Option<bool>,
        bin_id: Option<i64>,
    ) -> ApiResult<Vec<CollectionSchedule>> {
        let _perf = PerfGuard::new("list_schedules");

        let filter = ScheduleFilter {
            upcoming_only: upcoming_only.unwrap_or(true),
            bin_id,
        };
        Ok(self.schedule_repo.list(&filter)?)
    }

    pub fn get_schedule(&self, id: i64) -> ApiResult<CollectionSchedule> {
        let _perf = PerfGuard::new("get_schedule");

        self.schedule_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("CollectionSchedule(id={})不存在", id)))
    }

    /// 创建排程
    ///
    /// # 返回
    /// - Ok(CollectionSchedule): completed=false
    /// - Err(ValidationError): 时间戳无法解析
    /// - Err(NotFound): 垃圾桶不存在
    pub fn create_schedule(&self, request: CreateScheduleRequest) -> ApiResult<CollectionSchedule> {
        let _perf = PerfGuard::new("create_schedule");

        let new_schedule = NewSchedule {
            bin_id: request.bin_id,
            scheduled_at: validator::parse_timestamp(&request.scheduled_at)?,
            notes: validator::optional_text(request.notes.as_deref()),
        };

        let schedule = self.schedule_repo.create(&new_schedule)?;
        info!(
            schedule_id = schedule.id,
            bin_id = schedule.bin_id,
            scheduled_at = %schedule.scheduled_at,
            "收运排程已创建"
        );
        Ok(schedule)
    }

    /// 完成排程并清空对应垃圾桶（原子）
    ///
    /// truck_id 为空白时视为未提供。
    pub fn complete_schedule(
        &self,
        id: i64,
        truck_id: Option<&str>,
    ) -> ApiResult<CompletionOutcome> {
        let _perf = PerfGuard::new("complete_schedule");

        let truck_id = validator::optional_text(truck_id);
        Ok(self.workflow.complete(id, truck_id.as_deref())?)
    }
}
