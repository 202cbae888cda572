// ==========================================
// 智能垃圾桶车队 - SQL 性能观测
// ==========================================
// 基于 rusqlite trace/profile 回调：按 API 操作统计 SQL 语句数 + 慢查询告警
// 开关与阈值在进程内只读取一次（每个操作都会新开连接）
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// 观测开关与阈值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfSettings {
    pub enabled: bool,
    pub slow_sql_ms: u64,
}

impl PerfSettings {
    /// 从环境变量读取
    ///
    /// - `BIN_FLEET_PERF_SQL`: 开关（Debug 默认开，Release 默认关）
    /// - `BIN_FLEET_SLOW_SQL_MS`: 慢 SQL 阈值（Debug 默认 50，Release 默认 200）
    pub fn from_env() -> Self {
        let enabled = std::env::var("BIN_FLEET_PERF_SQL")
            .map(|v| is_true(&v))
            .unwrap_or(cfg!(debug_assertions));
        let slow_sql_ms = std::env::var("BIN_FLEET_SLOW_SQL_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });
        Self {
            enabled,
            slow_sql_ms,
        }
    }
}

fn settings() -> PerfSettings {
    static SETTINGS: OnceLock<PerfSettings> = OnceLock::new();
    *SETTINGS.get_or_init(PerfSettings::from_env)
}

// 当前线程上活跃 PerfGuard 的计数器
#[derive(Clone, Copy, Default)]
struct OpCounters {
    depth: u32,
    statements: u64,
    slow: u64,
}

thread_local! {
    static COUNTERS: Cell<OpCounters> = Cell::new(OpCounters::default());
}

fn update_counters(f: impl FnOnce(&mut OpCounters)) {
    COUNTERS.with(|cell| {
        let mut counters = cell.get();
        f(&mut counters);
        cell.set(counters);
    });
}

fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

fn one_line_sql(sql: &str, max_chars: usize) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}…", cut)
}

/// 为新连接挂载 trace/profile 回调（见 `db::open_sqlite_connection`）
pub fn install_sqlite_tracing(conn: &mut Connection) {
    if !settings().enabled {
        return;
    }
    conn.trace(Some(on_statement));
    conn.profile(Some(on_statement_done));
}

fn on_statement(_sql: &str) {
    update_counters(|c| {
        if c.depth > 0 {
            c.statements = c.statements.saturating_add(1);
        }
    });
}

fn on_statement_done(sql: &str, duration: Duration) {
    let threshold = settings().slow_sql_ms;
    let ms = duration.as_millis() as u64;
    if threshold == 0 || ms < threshold {
        return;
    }

    tracing::warn!(
        target: "slow_sql",
        duration_ms = ms,
        sql = %one_line_sql(sql, 400),
        "slow sql"
    );
    update_counters(|c| {
        if c.depth > 0 {
            c.slow = c.slow.saturating_add(1);
        }
    });
}

/// 单个 API 操作的耗时与 SQL 统计，drop 时输出到 `perf` target
///
/// ```ignore
/// let _perf = smart_bin_fleet::perf::PerfGuard::new("list_bins");
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    baseline: OpCounters,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        let mut baseline = OpCounters::default();
        update_counters(|c| {
            c.depth = c.depth.saturating_add(1);
            baseline = *c;
        });
        Self {
            op,
            start: Instant::now(),
            baseline,
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let mut now = OpCounters::default();
        update_counters(|c| {
            now = *c;
            c.depth = c.depth.saturating_sub(1);
        });

        tracing::debug!(
            target: "perf",
            op = self.op,
            elapsed_ms = self.start.elapsed().as_millis() as u64,
            sql_count = now.statements.saturating_sub(self.baseline.statements),
            slow_sql_count = now.slow.saturating_sub(self.baseline.slow),
            "done"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_line_sql() {
        let sql = "SELECT *\n    FROM bin\n    WHERE id = ?1";
        assert_eq!(one_line_sql(sql, 100), "SELECT * FROM bin WHERE id = ?1");
        assert_eq!(one_line_sql(sql, 6), "SELECT…");
    }

    #[test]
    fn test_guard_counts_nested_statements() {
        let outer = PerfGuard::new("outer");
        on_statement("SELECT 1");
        {
            let _inner = PerfGuard::new("inner");
            on_statement("SELECT 2");
        }
        let depth_and_count = COUNTERS.with(|c| (c.get().depth, c.get().statements));
        assert_eq!(depth_and_count.0, 1);
        assert_eq!(depth_and_count.1 - outer.baseline.statements, 2);
    }

    #[test]
    fn test_is_true_variants() {
        assert!(is_true(" YES "));
        assert!(is_true("1"));
        assert!(!is_true("off"));
    }
}
