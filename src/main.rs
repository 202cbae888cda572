// ==========================================
// 智能垃圾桶车队 - 主入口
// ==========================================
// 流程: 日志 -> 配置 -> 建表 -> 演示数据 -> 传感器模拟 -> 等待 Ctrl-C -> 停止
// ==========================================

use smart_bin_fleet::app::AppState;
use smart_bin_fleet::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    smart_bin_fleet::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", smart_bin_fleet::APP_NAME);
    tracing::info!("系统版本: {}", smart_bin_fleet::VERSION);
    tracing::info!("==================================================");

    let config = AppConfig::from_env();
    tracing::info!("使用数据库: {}", config.db_path);

    let app_state = AppState::new(config)?;

    let seeded = app_state.bootstrap()?;
    if seeded.bins > 0 {
        tracing::info!(
            "已写入演示数据: {} 个垃圾桶, {} 个排程",
            seeded.bins,
            seeded.schedules
        );
    }

    app_state.start_sensor_simulator()?;

    tracing::info!("服务已启动, 按 Ctrl-C 退出");
    tokio::signal::ctrl_c().await?;

    tracing::info!("收到退出信号, 正在停止...");
    app_state.shutdown().await;

    Ok(())
}
