// ==========================================
// 智能垃圾桶车队 - 收运完成工作流
// ==========================================
// 职责: 标记排程完成 + 清空对应垃圾桶
// 原子性: 两步写入处于同一个 IMMEDIATE 事务，要么都可见，要么都不可见
// 宽松处理: 垃圾桶已不存在时排程仍然完成（bin_reset=false，记录告警）
// 幂等: 已完成的排程再次完成为 no-op，返回原记录，不再清空垃圾桶
// ==========================================

use crate::db::Database;
use crate::domain::schedule::CompletionOutcome;
use crate::engine::bin_state;
use crate::repository::bin_repo::BinRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::schedule_repo::ScheduleRepository;
use chrono::Utc;
use rusqlite::TransactionBehavior;
use std::sync::Arc;
use tracing::{info, instrument, warn};

// ==========================================
// CollectionWorkflow - 收运完成工作流
// ==========================================
pub struct CollectionWorkflow {
    db: Arc<Database>,
}

impl CollectionWorkflow {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// 完成排程
    ///
    /// 步骤（同一事务内）：
    /// 1. 读取排程，不存在则 NotFound
    /// 2. 标记完成（completed=true, completed_at=now, truck_id）
    /// 3. 若垃圾桶存在则清空（fill=0, status=empty, last_emptied=now）
    ///
    /// # 返回
    /// - Ok(CompletionOutcome): 完成结果
    /// - Err(NotFound): 排程不存在
    /// - Err(...): 存储失败，事务回滚，无任何部分写入
    #[instrument(skip(self))]
    pub fn complete(
        &self,
        schedule_id: i64,
        truck_id: Option<&str>,
    ) -> RepositoryResult<CompletionOutcome> {
        let mut conn = self
            .db
            .open()
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = Utc::now();

        let (schedule, changed) =
            ScheduleRepository::mark_completed_in(&tx, schedule_id, truck_id, now)?
                .ok_or_else(|| RepositoryError::not_found("CollectionSchedule", schedule_id))?;

        if !changed {
            // 已完成的排程：不提交任何修改
            info!(schedule_id, "排程此前已完成, 忽略重复完成请求");
            return Ok(CompletionOutcome {
                schedule,
                bin_reset: false,
                already_completed: true,
            });
        }

        let bin_reset =
            BinRepository::update_with_in(&tx, schedule.bin_id, |bin| bin_state::reset(bin, now))?
                .is_some();

        if !bin_reset {
            warn!(
                schedule_id,
                bin_id = schedule.bin_id,
                "排程关联的垃圾桶不存在, 仅标记排程完成"
            );
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(schedule_id, bin_id = schedule.bin_id, bin_reset, "收运完成");

        Ok(CompletionOutcome {
            schedule,
            bin_reset,
            already_completed: false,
        })
    }
}
