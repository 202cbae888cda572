// ==========================================
// 智能垃圾桶车队 - 配置管理 API
// ==========================================
// 职责: 运行期配置查询与更新（仅允许已知配置键）
// 生效时机: 传感器模拟参数在模拟器下次启动时生效
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::{config_keys, ConfigManager, SimulatorConfig};

/// 配置项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigItem {
    pub key: String,
    pub value: String,
}

const KNOWN_KEYS: [&str; 4] = [
    config_keys::SENSOR_INTERVAL_SECS,
    config_keys::SENSOR_FILL_PROBABILITY,
    config_keys::SENSOR_INCREMENT_MIN,
    config_keys::SENSOR_INCREMENT_MAX,
];

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 查询所有已写入的配置（按键排序）
    pub fn list_configs(&self) -> ApiResult<Vec<ConfigItem>> {
        let snapshot = self.config_manager.get_config_snapshot()?;
        let map: BTreeMap<String, String> = serde_json::from_str(&snapshot)
            .map_err(|e| ApiError::InternalError(format!("配置快照解析失败: {}", e)))?;

        Ok(map
            .into_iter()
            .map(|(key, value)| ConfigItem { key, value })
            .collect())
    }

    /// 当前生效的传感器模拟配置（含默认值）
    pub fn get_simulator_config(&self) -> ApiResult<SimulatorConfig> {
        Ok(self.config_manager.simulator_config(None)?)
    }

    /// 更新单个配置
    ///
    /// 写入前把新值代入当前配置整体校验，非法时不写入。
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<()> {
        let key = key.trim();
        if !KNOWN_KEYS.contains(&key) {
            return Err(ApiError::InvalidInput(format!("未知的配置键: {}", key)));
        }

        let value = value.trim();
        let mut candidate = self.config_manager.simulator_config(None)?;
        apply_override(&mut candidate, key, value)?;
        candidate.validate().map_err(ApiError::ValidationError)?;

        self.config_manager.set_value(key, value)?;
        Ok(())
    }
}

fn apply_override(config: &mut SimulatorConfig, key: &str, value: &str) -> ApiResult<()> {
    let invalid = |e: &dyn std::fmt::Display| {
        ApiError::ValidationError(format!("配置 {} 的值 '{}' 非法: {}", key, value, e))
    };

    match key {
        config_keys::SENSOR_INTERVAL_SECS => {
            let secs: u64 = value.parse().map_err(|e| invalid(&e))?;
            config.interval = std::time::Duration::from_secs(secs);
        }
        config_keys::SENSOR_FILL_PROBABILITY => {
            config.fill_probability = value.parse().map_err(|e| invalid(&e))?;
        }
        config_keys::SENSOR_INCREMENT_MIN => {
            config.increment_min = value.parse().map_err(|e| invalid(&e))?;
        }
        config_keys::SENSOR_INCREMENT_MAX => {
            config.increment_max = value.parse().map_err(|e| invalid(&e))?;
        }
        _ => return Err(ApiError::InvalidInput(format!("未知的配置键: {}", key))),
    }
    Ok(())
}
