// ==========================================
// 传感器模拟器测试
// ==========================================
// 职责: 验证 tick 的增量/封顶/分类规则，以及周期任务的启动与取消
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod sensor_simulator_test {
    use smart_bin_fleet::api::{BinApi, BinUpdateRequest};
    use smart_bin_fleet::config::SimulatorConfig;
    use smart_bin_fleet::domain::types::BinStatus;
    use smart_bin_fleet::domain::Bin;
    use smart_bin_fleet::engine::SensorSimulator;
    use smart_bin_fleet::repository::BinRepository;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    use crate::test_helpers::{create_bin_with_fill, create_test_database};

    fn setup() -> (tempfile::NamedTempFile, Arc<BinRepository>, BinApi) {
        let (temp_file, db) = create_test_database();
        let bin_repo = Arc::new(BinRepository::new(db));
        let bin_api = BinApi::new(bin_repo.clone());
        (temp_file, bin_repo, bin_api)
    }

    #[test]
    fn test_tick_caps_fill_at_100_and_reclassifies() {
        let (_tmp, repo, api) = setup();
        let near_full = create_bin_with_fill(&api, "Main Street & 1st Ave", "Downtown", "general", 97);
        let low = create_bin_with_fill(&api, "Market Square", "Commercial", "recycling", 38);

        let simulator = SensorSimulator::new(
            repo,
            Box::new(|_bin: &Bin| Some(5)),
            Duration::from_secs(30),
        );
        let report = simulator.run_tick().unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.updated, 2);

        let capped = api.get_bin(near_full.id).unwrap();
        assert_eq!(capped.current_fill_percentage, 100);
        assert_eq!(capped.status, BinStatus::Full);
        assert!(capped.last_sensor_update > near_full.last_sensor_update);

        let bumped = api.get_bin(low.id).unwrap();
        assert_eq!(bumped.current_fill_percentage, 43);
        assert_eq!(bumped.status, BinStatus::Medium);
    }

    #[test]
    fn test_tick_keeps_maintenance_status() {
        let (_tmp, repo, api) = setup();
        let bin = create_bin_with_fill(&api, "Factory Road", "Industrial", "general", 60);
        api.update_bin(
            bin.id,
            BinUpdateRequest {
                maintenance_required: Some(true),
                ..Default::default()
            },
        )
        .unwrap();

        let simulator = SensorSimulator::new(repo, Box::new(|_bin: &Bin| Some(20)), Duration::from_secs(1));
        simulator.run_tick().unwrap();

        let stored = api.get_bin(bin.id).unwrap();
        assert_eq!(stored.current_fill_percentage, 80);
        assert_eq!(stored.status, BinStatus::NeedsMaintenance);
    }

    #[test]
    fn test_tick_skips_bins_without_reading() {
        let (_tmp, repo, api) = setup();
        let skipped = create_bin_with_fill(&api, "City Hall Plaza", "Downtown", "general", 50);
        let touched = create_bin_with_fill(&api, "Central Park North", "Downtown", "general", 50);

        let target = touched.id;
        let simulator = SensorSimulator::new(
            repo,
            Box::new(move |bin: &Bin| if bin.id == target { Some(3) } else { None }),
            Duration::from_secs(1),
        );
        let report = simulator.run_tick().unwrap();

        assert_eq!(report.updated, 1);
        let untouched = api.get_bin(skipped.id).unwrap();
        assert_eq!(untouched.current_fill_percentage, 50);
        assert_eq!(untouched.last_sensor_update, skipped.last_sensor_update);
        assert_eq!(api.get_bin(touched.id).unwrap().current_fill_percentage, 53);
    }

    #[test]
    fn test_seeded_random_simulators_agree() {
        let config = SimulatorConfig {
            fill_probability: 1.0,
            increment_min: 1,
            increment_max: 5,
            rng_seed: Some(2024),
            ..SimulatorConfig::default()
        };

        let mut results = Vec::new();
        for _ in 0..2 {
            let (_tmp, repo, api) = setup();
            let bin = create_bin_with_fill(&api, "Office Complex A", "Commercial", "general", 0);
            let simulator = SensorSimulator::from_config(repo, &config);
            for _ in 0..5 {
                simulator.run_tick().unwrap();
            }
            let fill = api.get_bin(bin.id).unwrap().current_fill_percentage;
            assert!((5..=25).contains(&fill));
            results.push(fill);
        }

        assert_eq!(results[0], results[1]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_spawned_simulator_ticks_until_cancelled() {
        smart_bin_fleet::logging::init_test();
        let (_tmp, repo, api) = setup();
        let bin = create_bin_with_fill(&api, "Warehouse District", "Industrial", "general", 0);

        let simulator = Arc::new(SensorSimulator::new(
            repo,
            Box::new(|_bin: &Bin| Some(1)),
            Duration::from_millis(20),
        ));
        let cancel = CancellationToken::new();
        let handle = simulator.spawn(cancel.clone());

        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("simulator did not stop after cancellation")
            .unwrap();

        let after_stop = api.get_bin(bin.id).unwrap().current_fill_percentage;
        assert!(after_stop > 0);

        // 取消后不再有新的读数
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(api.get_bin(bin.id).unwrap().current_fill_percentage, after_stop);
    }

    #[tokio::test]
    async fn test_cancel_before_first_tick_writes_nothing() {
        let (_tmp, repo, api) = setup();
        let bin = create_bin_with_fill(&api, "Community Center", "Residential", "organic", 10);

        let simulator = Arc::new(SensorSimulator::new(
            repo,
            Box::new(|_bin: &Bin| Some(50)),
            Duration::from_secs(60),
        ));
        let cancel = CancellationToken::new();
        let handle = simulator.spawn(cancel.clone());

        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(api.get_bin(bin.id).unwrap().current_fill_percentage, 10);
    }

    #[tokio::test]
    async fn test_oversized_interval_keeps_task_alive() {
        let (_tmp, repo, api) = setup();
        let bin = create_bin_with_fill(&api, "Apartment Complex B", "Residential", "general", 25);

        let simulator = Arc::new(SensorSimulator::new(
            repo,
            Box::new(|_bin: &Bin| Some(10)),
            Duration::from_secs(u64::MAX),
        ));
        let cancel = CancellationToken::new();
        let handle = simulator.spawn(cancel.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(api.get_bin(bin.id).unwrap().current_fill_percentage, 25);
    }
}
