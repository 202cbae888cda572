// ==========================================
// 智能垃圾桶车队 - 进程启动配置
// ==========================================
// 来源: 环境变量（启动时读取一次）
// ==========================================

use std::path::PathBuf;

/// 进程级配置
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// SQLite 数据库文件路径
    pub db_path: String,
    /// 数据库为空时是否写入演示数据
    pub seed_demo_data: bool,
    /// 是否启动传感器模拟
    pub enable_sensor_simulator: bool,
    /// 传感器模拟随机数种子（None 表示使用系统熵）
    pub simulator_seed: Option<u64>,
}

impl AppConfig {
    /// 从环境变量加载
    ///
    /// # 环境变量
    /// - BIN_FLEET_DB_PATH: 数据库路径（默认: 用户数据目录）
    /// - BIN_FLEET_SEED_DEMO: 是否写入演示数据（默认: true）
    /// - BIN_FLEET_SIMULATOR: 是否启动传感器模拟（默认: true）
    /// - BIN_FLEET_SIM_SEED: 传感器模拟随机数种子
    pub fn from_env() -> Self {
        Self {
            db_path: get_default_db_path(),
            seed_demo_data: env_flag("BIN_FLEET_SEED_DEMO", true),
            enable_sensor_simulator: env_flag("BIN_FLEET_SIMULATOR", true),
            simulator_seed: std::env::var("BIN_FLEET_SIM_SEED")
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok()),
        }
    }

    /// 指定数据库路径的配置（测试/工具使用），关闭演示数据与模拟器
    pub fn for_db_path(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            seed_demo_data: false,
            enable_sensor_simulator: false,
            simulator_seed: None,
        }
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(
            v.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "y" | "on"
        ),
        Err(_) => default,
    }
}

/// 获取默认数据库路径
pub fn get_default_db_path() -> String {
    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("BIN_FLEET_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./smart_bin_fleet.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        let dir = if cfg!(debug_assertions) {
            data_dir.join("smart-bin-fleet-dev")
        } else {
            data_dir.join("smart-bin-fleet")
        };

        match std::fs::create_dir_all(&dir) {
            Ok(()) => path = dir.join("smart_bin_fleet.db"),
            Err(e) => tracing::warn!("无法创建数据目录 {}: {}, 使用当前目录", dir.display(), e),
        }
    }

    path.to_string_lossy().to_string()
}
