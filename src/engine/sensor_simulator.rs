// ==========================================
// 智能垃圾桶车队 - 传感器模拟器
// ==========================================
// 职责: 周期性扫描全部垃圾桶，按概率增加填充率并重新分类状态
// 并发:
// - 每个垃圾桶单独一个写事务，tick 不会长时间阻塞前台请求
// - 写入基于事务内读取的最新值（不会覆盖前台的并发修改）
// - 同一时刻最多一个 tick 在执行（tick 完成后才等待下一个周期）
// 取消: CancellationToken 只在 tick 之间检查，执行中的 tick 会完整跑完
// 随机性: 通过 FillDecider 注入，便于测试
// ==========================================

use crate::config::config_manager::defaults;
use crate::config::SimulatorConfig;
use crate::domain::bin::{Bin, BinFilter};
use crate::engine::bin_state;
use crate::repository::bin_repo::BinRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

// ==========================================
// FillDecider - 填充决策
// ==========================================
/// 决定某个垃圾桶在本次 tick 中是否增加填充率
///
/// 返回 `Some(delta)` 表示增加 delta 个百分点，`None` 表示本次不变。
pub trait FillDecider: Send {
    fn decide(&mut self, bin: &Bin) -> Option<i32>;
}

impl<F> FillDecider for F
where
    F: FnMut(&Bin) -> Option<i32> + Send,
{
    fn decide(&mut self, bin: &Bin) -> Option<i32> {
        self(bin)
    }
}

/// 基于 ChaCha8 的随机决策（可用种子复现）
pub struct RandomFillDecider {
    rng: ChaCha8Rng,
    probability: f64,
    increment_min: i32,
    increment_max: i32,
}

impl RandomFillDecider {
    pub fn from_config(config: &SimulatorConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            rng,
            probability: config.fill_probability.clamp(0.0, 1.0),
            increment_min: config.increment_min,
            increment_max: config.increment_max.max(config.increment_min),
        }
    }
}

impl FillDecider for RandomFillDecider {
    fn decide(&mut self, _bin: &Bin) -> Option<i32> {
        if self.rng.gen_bool(self.probability) {
            Some(self.rng.gen_range(self.increment_min..=self.increment_max))
        } else {
            None
        }
    }
}

// ==========================================
// TickReport - 单次 tick 结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// 扫描的垃圾桶数
    pub scanned: usize,
    /// 写入了新读数的垃圾桶数
    pub updated: usize,
    /// 扫描后被删除、写入时已不存在的垃圾桶数
    pub vanished: usize,
    /// 写入失败（已记录日志并跳过）的垃圾桶数
    pub failed: usize,
}

// ==========================================
// SensorSimulator - 传感器模拟器
// ==========================================
pub struct SensorSimulator {
    bin_repo: Arc<BinRepository>,
    decider: Mutex<Box<dyn FillDecider>>,
    interval: Duration,
}

impl SensorSimulator {
    pub fn new(
        bin_repo: Arc<BinRepository>,
        decider: Box<dyn FillDecider>,
        interval: Duration,
    ) -> Self {
        // tokio interval 不接受 0 周期；过大的周期会让 Instant 溢出
        let max = Duration::from_secs(defaults::SENSOR_INTERVAL_MAX_SECS);
        Self {
            bin_repo,
            decider: Mutex::new(decider),
            interval: interval.clamp(Duration::from_millis(1), max),
        }
    }

    /// 按配置创建（随机决策）
    pub fn from_config(bin_repo: Arc<BinRepository>, config: &SimulatorConfig) -> Self {
        Self::new(
            bin_repo,
            Box::new(RandomFillDecider::from_config(config)),
            config.interval,
        )
    }

    /// 执行一次 tick（同步，会阻塞在数据库 I/O 上）
    ///
    /// 单个垃圾桶写入失败只记录日志并继续；只有列出垃圾桶失败才返回错误。
    pub fn run_tick(&self) -> RepositoryResult<TickReport> {
        let bins = self.bin_repo.list(&BinFilter::default())?;
        let mut decider = self
            .decider
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut report = TickReport {
            scanned: bins.len(),
            ..TickReport::default()
        };

        for bin in &bins {
            let delta = match decider.decide(bin) {
                Some(delta) if delta > 0 => delta,
                _ => continue,
            };

            let now = Utc::now();
            match self.bin_repo.update_with(bin.id, |b| {
                bin_state::apply_sensor_increment(b, delta, now);
            }) {
                Ok(updated) => {
                    report.updated += 1;
                    debug!(
                        bin_id = bin.id,
                        delta,
                        fill = updated.current_fill_percentage,
                        status = %updated.status,
                        "传感器读数已更新"
                    );
                }
                Err(e) if e.is_not_found() => {
                    report.vanished += 1;
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(bin_id = bin.id, error = %e, "传感器读数写入失败, 跳过");
                }
            }
        }

        Ok(report)
    }

    /// 在 tokio 运行时上启动周期任务
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// 周期循环：首个 tick 在一个周期之后执行
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let period = self.interval;
        let now = Instant::now();
        let start = match now.checked_add(period) {
            Some(start) => start,
            None => {
                warn!(interval_secs = period.as_secs(), "tick 周期过大, 改为立即开始计时");
                now
            }
        };
        let mut ticker = interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = period.as_secs_f64(), "传感器模拟已启动");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("传感器模拟已停止");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let simulator = Arc::clone(&self);
            match tokio::task::spawn_blocking(move || simulator.run_tick()).await {
                Ok(Ok(report)) => debug!(
                    scanned = report.scanned,
                    updated = report.updated,
                    vanished = report.vanished,
                    failed = report.failed,
                    "传感器模拟 tick 完成"
                ),
                Ok(Err(e)) => error!(error = %e, "传感器模拟 tick 失败, 等待下一周期重试"),
                Err(e) => error!(error = %e, "传感器模拟 tick 异常终止, 等待下一周期重试"),
            }
        }
    }
}
