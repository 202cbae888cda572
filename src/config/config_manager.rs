// ==========================================
// 智能垃圾桶车队 - 配置管理器
// ==========================================
// 职责: 运行期配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::db::Database;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

// ==========================================
// SimulatorConfig - 传感器模拟配置
// ==========================================
/// 传感器模拟参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// tick 周期
    pub interval: Duration,
    /// 每个垃圾桶每次 tick 增加填充率的概率
    pub fill_probability: f64,
    /// 单次增量下限（含）
    pub increment_min: i32,
    /// 单次增量上限（含）
    pub increment_max: i32,
    /// 随机数种子（None 表示使用系统熵）
    pub rng_seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(defaults::SENSOR_INTERVAL_SECS),
            fill_probability: defaults::SENSOR_FILL_PROBABILITY,
            increment_min: defaults::SENSOR_INCREMENT_MIN,
            increment_max: defaults::SENSOR_INCREMENT_MAX,
            rng_seed: None,
        }
    }
}

impl SimulatorConfig {
    /// 校验参数范围
    pub fn validate(&self) -> Result<(), String> {
        if self.interval.is_zero() {
            return Err("sensor.interval_secs 必须大于 0".to_string());
        }
        if self.interval > Duration::from_secs(defaults::SENSOR_INTERVAL_MAX_SECS) {
            return Err(format!(
                "sensor.interval_secs 不能超过 {}, 实际为 {}",
                defaults::SENSOR_INTERVAL_MAX_SECS,
                self.interval.as_secs()
            ));
        }
        if !(0.0..=1.0).contains(&self.fill_probability) {
            return Err(format!(
                "sensor.fill_probability 必须在 [0, 1] 之间, 实际为 {}",
                self.fill_probability
            ));
        }
        if self.increment_min < 1
            || self.increment_max > 100
            || self.increment_min > self.increment_max
        {
            return Err(format!(
                "传感器增量区间非法: [{}, {}]",
                self.increment_min, self.increment_max
            ));
        }
        Ok(())
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    db: Arc<Database>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn get_conn(&self) -> RepositoryResult<Connection> {
        self.db
            .open()
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值（UPSERT）
    pub fn set_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(key, value, "配置已更新");
        Ok(())
    }

    /// 读取并解析配置值，不存在时返回默认值
    ///
    /// 解析失败视为字段值错误（不静默回退，避免错误配置被忽略）
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_value(key)? {
            Some(raw) => raw.trim().parse::<T>().map_err(|e| RepositoryError::FieldValueError {
                field: key.to_string(),
                message: format!("无法解析 '{}': {}", raw, e),
            }),
            None => Ok(default),
        }
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv ORDER BY key")?;

        let config_map: BTreeMap<String, String> = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<_>>()?;

        serde_json::to_string(&json!(config_map))
            .map_err(|e| RepositoryError::InternalError(format!("配置快照序列化失败: {}", e)))
    }

    // ===== 传感器模拟配置 =====

    /// 读取传感器模拟配置（缺省项使用默认值）
    pub fn simulator_config(&self, rng_seed: Option<u64>) -> RepositoryResult<SimulatorConfig> {
        let interval_secs =
            self.get_parsed_or_default(config_keys::SENSOR_INTERVAL_SECS, defaults::SENSOR_INTERVAL_SECS)?;
        let config = SimulatorConfig {
            interval: Duration::from_secs(interval_secs),
            fill_probability: self.get_parsed_or_default(
                config_keys::SENSOR_FILL_PROBABILITY,
                defaults::SENSOR_FILL_PROBABILITY,
            )?,
            increment_min: self.get_parsed_or_default(
                config_keys::SENSOR_INCREMENT_MIN,
                defaults::SENSOR_INCREMENT_MIN,
            )?,
            increment_max: self.get_parsed_or_default(
                config_keys::SENSOR_INCREMENT_MAX,
                defaults::SENSOR_INCREMENT_MAX,
            )?,
            rng_seed,
        };

        config.validate().map_err(|message| RepositoryError::FieldValueError {
            field: "sensor".to_string(),
            message,
        })?;
        Ok(config)
    }
}

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    // 传感器模拟
    pub const SENSOR_INTERVAL_SECS: &str = "sensor.interval_secs";
    pub const SENSOR_FILL_PROBABILITY: &str = "sensor.fill_probability";
    pub const SENSOR_INCREMENT_MIN: &str = "sensor.increment_min";
    pub const SENSOR_INCREMENT_MAX: &str = "sensor.increment_max";
}

// ==========================================
// 默认值
// ==========================================
pub mod defaults {
    pub const SENSOR_INTERVAL_SECS: u64 = 30;
    pub const SENSOR_INTERVAL_MAX_SECS: u64 = 86_400;
    pub const SENSOR_FILL_PROBABILITY: f64 = 0.3;
    pub const SENSOR_INCREMENT_MIN: i32 = 1;
    pub const SENSOR_INCREMENT_MAX: i32 = 5;
}
