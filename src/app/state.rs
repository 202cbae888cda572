// ==========================================
// 智能垃圾桶车队 - 应用状态
// ==========================================
// 职责: 启动时组装数据库、仓储、引擎与 API 实例，并持有传感器模拟任务
// 生命周期: new -> bootstrap -> start_sensor_simulator -> shutdown
// ==========================================

use std::sync::{Arc, Mutex};

use anyhow::Context;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::{BinApi, ConfigApi, ScheduleApi, StatsApi};
use crate::app::seed::{seed_demo_data, SeedReport};
use crate::config::{AppConfig, ConfigManager};
use crate::db::Database;
use crate::engine::{CollectionWorkflow, SensorSimulator, StatsAggregator};
use crate::repository::{BinRepository, ScheduleRepository};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    pub config: AppConfig,
    pub db: Arc<Database>,

    pub bin_api: Arc<BinApi>,
    pub schedule_api: Arc<ScheduleApi>,
    pub stats_api: Arc<StatsApi>,
    pub config_api: Arc<ConfigApi>,

    bin_repo: Arc<BinRepository>,
    config_manager: Arc<ConfigManager>,

    // 传感器模拟任务
    cancel: CancellationToken,
    simulator_task: Mutex<Option<JoinHandle<()>>>,
}

impl AppState {
    /// 创建AppState实例（建表/迁移在此完成）
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let db = Arc::new(Database::new(config.db_path.clone()));
        db.initialize()
            .with_context(|| format!("无法初始化数据库: {}", config.db_path))?;
        info!(db_path = %config.db_path, "数据库已就绪");

        // ==========================================
        // 仓储层
        // ==========================================
        let bin_repo = Arc::new(BinRepository::new(db.clone()));
        let schedule_repo = Arc::new(ScheduleRepository::new(db.clone()));
        let config_manager = Arc::new(ConfigManager::new(db.clone()));

        // ==========================================
        // 引擎层
        // ==========================================
        let workflow = Arc::new(CollectionWorkflow::new(db.clone()));
        let aggregator = Arc::new(StatsAggregator::new(bin_repo.clone()));

        // ==========================================
        // API层
        // ==========================================
        let bin_api = Arc::new(BinApi::new(bin_repo.clone()));
        let schedule_api = Arc::new(ScheduleApi::new(schedule_repo, workflow));
        let stats_api = Arc::new(StatsApi::new(aggregator));
        let config_api = Arc::new(ConfigApi::new(config_manager.clone()));

        Ok(Self {
            config,
            db,
            bin_api,
            schedule_api,
            stats_api,
            config_api,
            bin_repo,
            config_manager,
            cancel: CancellationToken::new(),
            simulator_task: Mutex::new(None),
        })
    }

    /// 启动前准备：按配置写入演示数据
    pub fn bootstrap(&self) -> anyhow::Result<SeedReport> {
        if !self.config.seed_demo_data {
            return Ok(SeedReport::default());
        }

        let mut rng = match self.config.simulator_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let report = seed_demo_data(&self.db, &mut rng).context("写入演示数据失败")?;
        Ok(report)
    }

    /// 启动传感器模拟（需在 tokio 运行时内调用）
    ///
    /// 返回 false 表示未启动：配置关闭，或已在运行。
    pub fn start_sensor_simulator(&self) -> anyhow::Result<bool> {
        if !self.config.enable_sensor_simulator {
            info!("传感器模拟已关闭");
            return Ok(false);
        }

        let mut task = self
            .simulator_task
            .lock()
            .map_err(|e| anyhow::anyhow!("传感器模拟任务锁获取失败: {}", e))?;
        if task.is_some() {
            warn!("传感器模拟已在运行, 忽略重复启动");
            return Ok(false);
        }

        let sim_config = self
            .config_manager
            .simulator_config(self.config.simulator_seed)
            .context("读取传感器模拟配置失败")?;
        let simulator = Arc::new(SensorSimulator::from_config(self.bin_repo.clone(), &sim_config));

        *task = Some(simulator.spawn(self.cancel.child_token()));
        Ok(true)
    }

    /// 停止后台任务并等待其退出（执行中的 tick 会跑完）
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let handle = match self.simulator_task.lock() {
            Ok(mut task) => task.take(),
            Err(e) => {
                warn!(error = %e, "传感器模拟任务锁获取失败");
                None
            }
        };

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "传感器模拟任务异常退出");
            }
        }
        info!("应用已停止");
    }

    pub fn get_db_path(&self) -> &str {
        self.db.path()
    }
}
