// ==========================================
// 智能垃圾桶车队 - 收运排程数据仓储
// ==========================================
// 约束: 排程创建时所引用的垃圾桶必须存在（与插入处于同一事务）
// 约束: completed 只允许 false -> true
// ==========================================

use crate::db::Database;
use crate::domain::schedule::{CollectionSchedule, NewSchedule, ScheduleFilter};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::sync::Arc;

const ENTITY: &str = "CollectionSchedule";

const SCHEDULE_COLUMNS: &str =
    "id, bin_id, scheduled_at, completed, completed_at, truck_id, notes";

// ==========================================
// ScheduleRepository - 收运排程仓储
// ==========================================
pub struct ScheduleRepository {
    db: Arc<Database>,
}

impl ScheduleRepository {
    /// 创建新的 ScheduleRepository 实例
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn get_conn(&self) -> RepositoryResult<Connection> {
        self.db
            .open()
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))
    }

    /// 创建排程
    ///
    /// # 返回
    /// - Ok(CollectionSchedule): 新建排程 (completed=false)
    /// - Err(NotFound { entity: "Bin" }): 引用的垃圾桶不存在，不会创建任何记录
    pub fn create(&self, new_schedule: &NewSchedule) -> RepositoryResult<CollectionSchedule> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let bin_exists: bool = tx
            .query_row(
                "SELECT 1 FROM bin WHERE id = ?1",
                params![new_schedule.bin_id],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        if !bin_exists {
            return Err(RepositoryError::not_found("Bin", new_schedule.bin_id));
        }

        let id = Self::insert_in(&tx, new_schedule)?;
        let schedule = Self::find_by_id_in(&tx, id)?.ok_or_else(|| {
            RepositoryError::InternalError(format!("新建排程读取失败: id={}", id))
        })?;

        tx.commit()?;
        Ok(schedule)
    }

    /// 按主键查询
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<CollectionSchedule>> {
        let conn = self.get_conn()?;
        Ok(Self::find_by_id_in(&conn, id)?)
    }

    /// 按过滤条件查询，按计划时间升序
    ///
    /// `upcoming_only = true` 时只返回未完成的排程
    pub fn list(&self, filter: &ScheduleFilter) -> RepositoryResult<Vec<CollectionSchedule>> {
        let conn = self.get_conn()?;

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if filter.upcoming_only {
            clauses.push("completed = 0");
        }
        if let Some(bin_id) = filter.bin_id {
            clauses.push("bin_id = ?");
            values.push(Box::new(bin_id));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let sql = format!(
            "SELECT {} FROM collection_schedule {} ORDER BY scheduled_at ASC, id ASC",
            SCHEDULE_COLUMNS, where_sql
        );

        let mut stmt = conn.prepare(&sql)?;
        let schedules = stmt
            .query_map(
                rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())),
                map_schedule_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(schedules)
    }

    /// 标记排程完成（不联动垃圾桶）
    ///
    /// 已完成的排程再次标记为 no-op，返回原记录（completed_at / truck_id 不变）。
    /// 需要联动清空垃圾桶时使用 `engine::CollectionWorkflow`。
    pub fn mark_completed(
        &self,
        id: i64,
        truck_id: Option<&str>,
    ) -> RepositoryResult<CollectionSchedule> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (schedule, _changed) = Self::mark_completed_in(&tx, id, truck_id, Utc::now())?
            .ok_or_else(|| RepositoryError::not_found(ENTITY, id))?;

        tx.commit()?;
        Ok(schedule)
    }

    // ==========================================
    // 事务内操作
    // ==========================================

    /// 在给定连接/事务内插入排程，返回新 id
    pub(crate) fn insert_in(conn: &Connection, new_schedule: &NewSchedule) -> rusqlite::Result<i64> {
        conn.execute(
            r#"
            INSERT INTO collection_schedule (bin_id, scheduled_at, completed, completed_at, truck_id, notes)
            VALUES (?1, ?2, 0, NULL, NULL, ?3)
            "#,
            params![
                new_schedule.bin_id,
                new_schedule.scheduled_at,
                new_schedule.notes,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 在给定连接/事务内按主键查询
    pub(crate) fn find_by_id_in(
        conn: &Connection,
        id: i64,
    ) -> rusqlite::Result<Option<CollectionSchedule>> {
        conn.query_row(
            &format!(
                "SELECT {} FROM collection_schedule WHERE id = ?1",
                SCHEDULE_COLUMNS
            ),
            params![id],
            map_schedule_row,
        )
        .optional()
    }

    /// 在给定事务内标记完成
    ///
    /// # 返回
    /// - Ok(None): 排程不存在
    /// - Ok(Some((schedule, true))): 本次完成
    /// - Ok(Some((schedule, false))): 此前已完成，未做任何修改
    pub(crate) fn mark_completed_in(
        conn: &Connection,
        id: i64,
        truck_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> rusqlite::Result<Option<(CollectionSchedule, bool)>> {
        let current = match Self::find_by_id_in(conn, id)? {
            Some(schedule) => schedule,
            None => return Ok(None),
        };

        if current.completed {
            return Ok(Some((current, false)));
        }

        conn.execute(
            r#"
            UPDATE collection_schedule
            SET completed = 1, completed_at = ?2, truck_id = ?3
            WHERE id = ?1 AND completed = 0
            "#,
            params![id, now, truck_id],
        )?;

        Ok(Self::find_by_id_in(conn, id)?.map(|s| (s, true)))
    }
}

// ==========================================
// 辅助函数
// ==========================================

fn map_schedule_row(row: &Row<'_>) -> rusqlite::Result<CollectionSchedule> {
    Ok(CollectionSchedule {
        id: row.get(0)?,
        bin_id: row.get(1)?,
        scheduled_at: row.get(2)?,
        completed: row.get(3)?,
        completed_at: row.get(4)?,
        truck_id: row.get(5)?,
        notes: row.get(6)?,
    })
}
