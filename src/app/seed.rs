// ==========================================
// 智能垃圾桶车队 - 演示数据
// ==========================================
// 触发: 启动时 bin 表为空
// 原子性: 垃圾桶与排程在同一事务内写入（并发启动时只会写入一次）
// ==========================================

use crate::db::Database;
use crate::domain::bin::NewBin;
use crate::domain::schedule::NewSchedule;
use crate::domain::types::BinType;
use crate::engine::status_classifier::classify;
use crate::repository::bin_repo::BinRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::schedule_repo::ScheduleRepository;
use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::{params, TransactionBehavior};
use tracing::info;

const DEMO_LOCATIONS: [(&str, &str); 12] = [
    ("Main Street & 1st Ave", "Downtown"),
    ("Central Park North", "Downtown"),
    ("City Hall Plaza", "Downtown"),
    ("Market Square", "Commercial"),
    ("Shopping Mall Entrance", "Commercial"),
    ("Office Complex A", "Commercial"),
    ("Residential Block 1", "Residential"),
    ("Apartment Complex B", "Residential"),
    ("Community Center", "Residential"),
    ("Industrial Park Gate", "Industrial"),
    ("Factory Road", "Industrial"),
    ("Warehouse District", "Industrial"),
];

const DEMO_BIN_TYPES: [BinType; 2] = [BinType::General, BinType::Recycling];
const DEMO_CAPACITIES: [i32; 3] = [120, 240, 360];
const MAINTENANCE_RATE: f64 = 0.1;
const SCHEDULE_FILL_THRESHOLD: i32 = 70;
const MAX_DEMO_SCHEDULES: usize = 5;

/// 写入结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub bins: usize,
    pub schedules: usize,
}

/// 写入演示数据（bin 表非空时不做任何事）
///
/// - 每个地点 general / recycling 各一个
/// - 容量随机取 120/240/360，填充率随机 0~100，约 10% 需要维护
/// - 为前 5 个填充率 >= 70 的垃圾桶安排 1~48 小时后的收运
pub fn seed_demo_data<R: Rng>(db: &Database, rng: &mut R) -> RepositoryResult<SeedReport> {
    let mut conn = db
        .open()
        .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let existing: i64 = tx.query_row("SELECT COUNT(*) FROM bin", params![], |row| row.get(0))?;
    if existing > 0 {
        return Ok(SeedReport::default());
    }

    let now = Utc::now();
    let mut report = SeedReport::default();
    let mut schedule_candidates = Vec::new();

    for (location, district) in DEMO_LOCATIONS {
        for bin_type in DEMO_BIN_TYPES {
            let capacity = *DEMO_CAPACITIES
                .choose(rng)
                .unwrap_or(&crate::domain::bin::DEFAULT_CAPACITY_LITERS);
            let fill = rng.gen_range(0..=100);
            let maintenance = rng.gen_bool(MAINTENANCE_RATE);

            let new_bin = NewBin::new(location, district, bin_type).with_capacity(capacity);
            let id = BinRepository::insert_in(
                &tx,
                &new_bin,
                fill,
                classify(fill, maintenance),
                maintenance,
                now,
            )?;
            report.bins += 1;

            if fill >= SCHEDULE_FILL_THRESHOLD && schedule_candidates.len() < MAX_DEMO_SCHEDULES {
                schedule_candidates.push(id);
            }
        }
    }

    for bin_id in schedule_candidates {
        let new_schedule = NewSchedule {
            bin_id,
            scheduled_at: now + Duration::hours(rng.gen_range(1..=48)),
            notes: None,
        };
        ScheduleRepository::insert_in(&tx, &new_schedule)?;
        report.schedules += 1;
    }

    tx.commit()?;

    info!(bins = report.bins, schedules = report.schedules, "演示数据已写入");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tempfile::NamedTempFile;

    #[test]
    fn test_seed_only_when_empty() {
        let temp_file = NamedTempFile::new().unwrap();
        let db = Database::new(temp_file.path().to_str().unwrap());
        db.initialize().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let first = seed_demo_data(&db, &mut rng).unwrap();
        assert_eq!(first.bins, 24);
        assert!(first.schedules <= MAX_DEMO_SCHEDULES);

        let second = seed_demo_data(&db, &mut rng).unwrap();
        assert_eq!(second, SeedReport::default());
    }
}
