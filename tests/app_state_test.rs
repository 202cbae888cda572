// ==========================================
// 应用状态测试
// ==========================================
// 职责: 验证启动流程（演示数据、模拟器启动/停止）
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod app_state_test {
    use smart_bin_fleet::api::ListBinsQuery;
    use smart_bin_fleet::app::AppState;
    use smart_bin_fleet::config::AppConfig;

    use crate::test_helpers::create_test_db;

    fn demo_config(db_path: String) -> AppConfig {
        AppConfig {
            seed_demo_data: true,
            simulator_seed: Some(7),
            ..AppConfig::for_db_path(db_path)
        }
    }

    #[test]
    fn test_bootstrap_seeds_demo_data_once() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let state = AppState::new(demo_config(db_path)).unwrap();

        let report = state.bootstrap().unwrap();
        assert_eq!(report.bins, 24);

        let bins = state.bin_api.list_bins(&ListBinsQuery::default()).unwrap();
        assert_eq!(bins.len(), 24);
        assert!(bins.iter().all(|b| (0..=100).contains(&b.current_fill_percentage)));
        assert!(bins
            .iter()
            .all(|b| [120, 240, 360].contains(&b.capacity_liters)));

        let schedules = state.schedule_api.list_schedules(None, None).unwrap();
        assert_eq!(schedules.len(), report.schedules);
        for schedule in &schedules {
            let bin = state.bin_api.get_bin(schedule.bin_id).unwrap();
            assert!(bin.current_fill_percentage >= 70);
        }

        let stats = state.stats_api.get_stats().unwrap();
        assert_eq!(stats.total_bins, 24);
        assert_eq!(stats.bins_by_district.len(), 4);

        // 第二次启动不重复写入
        let again = state.bootstrap().unwrap();
        assert_eq!(again.bins, 0);
        assert_eq!(state.stats_api.get_stats().unwrap().total_bins, 24);
    }

    #[test]
    fn test_bootstrap_respects_disabled_seeding() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let state = AppState::new(AppConfig::for_db_path(db_path)).unwrap();

        assert_eq!(state.bootstrap().unwrap().bins, 0);
        assert_eq!(state.stats_api.get_stats().unwrap().total_bins, 0);
    }

    #[tokio::test]
    async fn test_simulator_start_and_shutdown() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let state = AppState::new(AppConfig {
            enable_sensor_simulator: true,
            ..AppConfig::for_db_path(db_path)
        })
        .unwrap();

        assert!(state.start_sensor_simulator().unwrap());
        // 重复启动被忽略
        assert!(!state.start_sensor_simulator().unwrap());

        state.shutdown().await;
    }

    #[tokio::test]
    async fn test_disabled_simulator_is_not_started() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let state = AppState::new(AppConfig::for_db_path(db_path)).unwrap();

        assert!(!state.start_sensor_simulator().unwrap());
        state.shutdown().await;
    }
}
