// ==========================================
// 智能垃圾桶车队 - 垃圾桶数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑（状态分类由调用方在 update_with 闭包中完成）
// 并发: 所有读-改-写在 BEGIN IMMEDIATE 事务中执行，同一垃圾桶的写入串行化
// ==========================================

use crate::db::Database;
use crate::domain::bin::{Bin, BinFilter, NewBin};
use crate::domain::types::{BinStatus, BinType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::sync::Arc;

const ENTITY: &str = "Bin";

const BIN_COLUMNS: &str = r#"
    id, location, district, bin_type, capacity_liters,
    current_fill_percentage, status, last_emptied, last_sensor_update,
    maintenance_required, created_at
"#;

// ==========================================
// FleetSnapshot - 聚合查询原始结果
// ==========================================
/// 车队聚合的原始计数（单次读事务内取得）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetSnapshot {
    pub total_bins: i64,
    pub full_bins: i64,
    pub maintenance_bins: i64,
    pub avg_fill: Option<f64>,
    pub by_type: Vec<(String, i64)>,
    pub by_district: Vec<(String, i64)>,
}

// ==========================================
// BinRepository - 垃圾桶仓储
// ==========================================
/// 垃圾桶仓储
/// 职责: 管理 bin 表的 CRUD 操作
pub struct BinRepository {
    db: Arc<Database>,
}

impl BinRepository {
    /// 创建新的 BinRepository 实例
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// 获取数据库连接（每次操作独立连接）
    fn get_conn(&self) -> RepositoryResult<Connection> {
        self.db
            .open()
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))
    }

    /// 创建垃圾桶
    ///
    /// 初始状态: fill=0, status=empty, 所有时间戳=now
    pub fn create(&self, new_bin: &NewBin) -> RepositoryResult<Bin> {
        let conn = self.get_conn()?;
        let now = Utc::now();
        let id = Self::insert_in(&conn, new_bin, 0, BinStatus::Empty, false, now)?;

        Self::find_by_id_in(&conn, id)?
            .ok_or_else(|| RepositoryError::InternalError(format!("新建垃圾桶读取失败: id={}", id)))
    }

    /// 按主键查询
    ///
    /// # 返回
    /// - Ok(Some(Bin)): 找到
    /// - Ok(None): 未找到
    /// - Err: 数据库错误
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Bin>> {
        let conn = self.get_conn()?;
        Ok(Self::find_by_id_in(&conn, id)?)
    }

    /// 按过滤条件查询（条件之间为 AND），按填充率降序
    pub fn list(&self, filter: &BinFilter) -> RepositoryResult<Vec<Bin>> {
        let conn = self.get_conn()?;

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(district) = &filter.district {
            clauses.push("district = ?");
            values.push(Box::new(district.clone()));
        }
        if let Some(bin_type) = filter.bin_type {
            clauses.push("bin_type = ?");
            values.push(Box::new(bin_type.as_str()));
        }
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(Box::new(status.as_str()));
        }
        if let Some(min_fill) = filter.min_fill {
            clauses.push("current_fill_percentage >= ?");
            values.push(Box::new(min_fill));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let sql = format!(
            "SELECT {} FROM bin {} ORDER BY current_fill_percentage DESC, id ASC",
            BIN_COLUMNS, where_sql
        );

        let mut stmt = conn.prepare(&sql)?;
        let bins = stmt
            .query_map(
                rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())),
                map_bin_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(bins)
    }

    /// 垃圾桶总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM bin", [], |row| row.get(0))?;
        Ok(count)
    }

    /// 读-改-写：在 IMMEDIATE 事务中读取当前记录，交给 `mutate` 修改，再写回
    ///
    /// 写回字段: current_fill_percentage / status / maintenance_required /
    /// last_emptied / last_sensor_update（身份与基础信息不可变）
    ///
    /// # 返回
    /// - Ok(Bin): 写回后的最新记录
    /// - Err(NotFound): 垃圾桶不存在
    /// - Err(FieldValueError): 修改后填充率越界（事务回滚，无部分生效）
    pub fn update_with<F>(&self, id: i64, mutate: F) -> RepositoryResult<Bin>
    where
        F: FnOnce(&mut Bin),
    {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let updated = Self::update_with_in(&tx, id, mutate)?
            .ok_or_else(|| RepositoryError::not_found(ENTITY, id))?;

        tx.commit()?;
        Ok(updated)
    }

    /// 车队聚合快照
    ///
    /// 所有聚合查询在同一个读事务内执行（WAL 快照），
    /// 并发创建的垃圾桶要么全部计入，要么全部不计入。
    pub fn fleet_snapshot(&self) -> RepositoryResult<FleetSnapshot> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;

        let (total_bins, full_bins, maintenance_bins, avg_fill) = tx.query_row(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN status = ?1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN maintenance_required = 1 THEN 1 ELSE 0 END), 0),
                AVG(current_fill_percentage)
            FROM bin
            "#,
            params![BinStatus::Full.as_str()],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                ))
            },
        )?;

        let by_type = {
            let mut stmt = tx.prepare(
                "SELECT bin_type, COUNT(*) FROM bin GROUP BY bin_type ORDER BY bin_type",
            )?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        let by_district = {
            let mut stmt = tx.prepare(
                "SELECT district, COUNT(*) FROM bin GROUP BY district ORDER BY district",
            )?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        tx.commit()?;

        Ok(FleetSnapshot {
            total_bins,
            full_bins,
            maintenance_bins,
            avg_fill,
            by_type,
            by_district,
        })
    }

    // ==========================================
    // 事务内操作（供工作流 / 种子数据复用同一事务）
    // ==========================================

    /// 在给定连接/事务内插入垃圾桶，返回新 id
    pub(crate) fn insert_in(
        conn: &Connection,
        new_bin: &NewBin,
        fill_percentage: i32,
        status: BinStatus,
        maintenance_required: bool,
        now: DateTime<Utc>,
    ) -> rusqlite::Result<i64> {
        conn.execute(
            r#"
            INSERT INTO bin (
                location, district, bin_type, capacity_liters,
                current_fill_percentage, status,
                last_emptied, last_sensor_update, maintenance_required, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, ?8, ?7)
            "#,
            params![
                new_bin.location,
                new_bin.district,
                new_bin.bin_type.as_str(),
                new_bin.capacity_liters,
                fill_percentage,
                status.as_str(),
                now,
                maintenance_required,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 在给定连接/事务内按主键查询
    pub(crate) fn find_by_id_in(conn: &Connection, id: i64) -> rusqlite::Result<Option<Bin>> {
        conn.query_row(
            &format!("SELECT {} FROM bin WHERE id = ?1", BIN_COLUMNS),
            params![id],
            map_bin_row,
        )
        .optional()
    }

    /// 在给定事务内执行读-改-写
    ///
    /// 调用方负责以 IMMEDIATE 方式开启事务并提交。
    pub(crate) fn update_with_in<F>(
        conn: &Connection,
        id: i64,
        mutate: F,
    ) -> RepositoryResult<Option<Bin>>
    where
        F: FnOnce(&mut Bin),
    {
        let mut bin = match Self::find_by_id_in(conn, id)? {
            Some(bin) => bin,
            None => return Ok(None),
        };

        mutate(&mut bin);

        if !(0..=100).contains(&bin.current_fill_percentage) {
            return Err(RepositoryError::FieldValueError {
                field: "current_fill_percentage".to_string(),
                message: format!("必须在 0~100 之间, 实际为 {}", bin.current_fill_percentage),
            });
        }

        conn.execute(
            r#"
            UPDATE bin
            SET current_fill_percentage = ?2,
                status = ?3,
                maintenance_required = ?4,
                last_emptied = ?5,
                last_sensor_update = ?6
            WHERE id = ?1
            "#,
            params![
                id,
                bin.current_fill_percentage,
                bin.status.as_str(),
                bin.maintenance_required,
                bin.last_emptied,
                bin.last_sensor_update,
            ],
        )?;

        Ok(Self::find_by_id_in(conn, id)?)
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 行映射
fn map_bin_row(row: &Row<'_>) -> rusqlite::Result<Bin> {
    let bin_type_raw: String = row.get(3)?;
    let status_raw: String = row.get(6)?;

    Ok(Bin {
        id: row.get(0)?,
        location: row.get(1)?,
        district: row.get(2)?,
        bin_type: BinType::parse(&bin_type_raw)
            .ok_or_else(|| conversion_error(3, "bin_type", &bin_type_raw))?,
        capacity_liters: row.get(4)?,
        current_fill_percentage: row.get(5)?,
        status: BinStatus::parse(&status_raw)
            .ok_or_else(|| conversion_error(6, "status", &status_raw))?,
        last_emptied: row.get(7)?,
        last_sensor_update: row.get(8)?,
        maintenance_required: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn conversion_error(idx: usize, field: &str, raw: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        format!("未知的 {} 值: {}", field, raw).into(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn setup() -> (NamedTempFile, BinRepository) {
        let temp_file = NamedTempFile::new().unwrap();
        let db = Arc::new(Database::new(temp_file.path().to_str().unwrap()));
        db.initialize().unwrap();
        (temp_file, BinRepository::new(db))
    }

    #[test]
    fn test_create_assigns_distinct_ids() {
        let (_tmp, repo) = setup();
        let a = repo.create(&NewBin::new("A", "Downtown", BinType::General)).unwrap();
        let b = repo.create(&NewBin::new("B", "Downtown", BinType::Organic)).unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.current_fill_percentage, 0);
        assert_eq!(a.status, BinStatus::Empty);
        assert_eq!(a.created_at, a.last_emptied);
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_update_with_rejects_out_of_range_fill() {
        let (_tmp, repo) = setup();
        let bin = repo.create(&NewBin::new("A", "Downtown", BinType::General)).unwrap();

        let err = repo
            .update_with(bin.id, |b| b.current_fill_percentage = 101)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::FieldValueError { .. }));

        // 事务回滚：记录未变化
        let stored = repo.find_by_id(bin.id).unwrap().unwrap();
        assert_eq!(stored.current_fill_percentage, 0);
    }

    #[test]
    fn test_update_with_missing_bin_is_not_found() {
        let (_tmp, repo) = setup();
        let err = repo.update_with(42, |b| b.current_fill_percentage = 10).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_list_orders_by_fill_desc() {
        let (_tmp, repo) = setup();
        for (i, fill) in [10, 80, 45].iter().enumerate() {
            let bin = repo
                .create(&NewBin::new(format!("L{}", i), "Downtown", BinType::General))
                .unwrap();
            repo.update_with(bin.id, |b| b.current_fill_percentage = *fill).unwrap();
        }

        let fills: Vec<i32> = repo
            .list(&BinFilter::default())
            .unwrap()
            .iter()
            .map(|b| b.current_fill_percentage)
            .collect();
        assert_eq!(fills, vec![80, 45, 10]);
    }
}
