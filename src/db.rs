// ==========================================
// 智能垃圾桶车队 - SQLite 连接与 Schema 初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 每个操作使用独立连接，不存在进程级的全局锁
// - WAL 日志模式：读不阻塞写，写之间由 SQLite 写锁串行化
// ==========================================

use rusqlite::{Connection, OptionalExtension};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置（并发写入时等待写锁，而不是立即报 busy）
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let mut conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    crate::perf::install_sqlite_tracing(&mut conn);
    Ok(conn)
}

// ==========================================
// Database - 持久化句柄
// ==========================================
/// 数据库句柄（只保存路径，按需打开连接）
///
/// 所有仓储共享同一个 `Arc<Database>`，每次操作各自打开连接，
/// 因此不同垃圾桶/排程上的操作互不阻塞。
#[derive(Debug, Clone)]
pub struct Database {
    db_path: String,
}

impl Database {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// 数据库文件路径
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// 打开一个新的已配置连接
    pub fn open(&self) -> rusqlite::Result<Connection> {
        open_sqlite_connection(&self.db_path)
    }

    /// 初始化数据库：切换 WAL 模式并建表（幂等）
    pub fn initialize(&self) -> rusqlite::Result<()> {
        let conn = self.open()?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(journal_mode = %mode, "sqlite journal mode");
        ensure_schema(&conn)?;

        match read_schema_version(&conn)? {
            Some(v) if v == CURRENT_SCHEMA_VERSION => {}
            Some(v) => tracing::warn!(
                "schema_version 不匹配: db={}, expected={}",
                v,
                CURRENT_SCHEMA_VERSION
            ),
            None => tracing::warn!("schema_version 表缺失"),
        }
        Ok(())
    }
}

/// 建表（幂等）
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS bin (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            location TEXT NOT NULL,
            district TEXT NOT NULL,
            bin_type TEXT NOT NULL DEFAULT 'general'
                CHECK (bin_type IN ('general', 'recycling', 'organic', 'hazardous')),
            capacity_liters INTEGER NOT NULL DEFAULT 120 CHECK (capacity_liters > 0),
            current_fill_percentage INTEGER NOT NULL DEFAULT 0
                CHECK (current_fill_percentage BETWEEN 0 AND 100),
            status TEXT NOT NULL DEFAULT 'empty',
            last_emptied TEXT NOT NULL,
            last_sensor_update TEXT NOT NULL,
            maintenance_required INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_bin_district ON bin(district);
        CREATE INDEX IF NOT EXISTS idx_bin_fill ON bin(current_fill_percentage DESC);

        CREATE TABLE IF NOT EXISTS collection_schedule (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bin_id INTEGER NOT NULL REFERENCES bin(id),
            scheduled_at TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0,
            completed_at TEXT,
            truck_id TEXT,
            notes TEXT,
            CHECK ((completed = 0 AND completed_at IS NULL)
                OR (completed = 1 AND completed_at IS NOT NULL))
        );

        CREATE INDEX IF NOT EXISTS idx_schedule_bin ON collection_schedule(bin_id);
        CREATE INDEX IF NOT EXISTS idx_schedule_pending
            ON collection_schedule(completed, scheduled_at);

        CREATE TABLE IF NOT EXISTS config_kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
