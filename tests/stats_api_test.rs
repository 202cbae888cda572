// ==========================================
// StatsApi 集成测试
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod stats_api_test {
    use smart_bin_fleet::api::BinUpdateRequest;
    use smart_bin_fleet::domain::types::BinType;

    use crate::test_helpers::{create_bin_with_fill, create_test_state};

    #[test]
    fn test_empty_fleet_stats() {
        let (_tmp, state) = create_test_state();
        let stats = state.stats_api.get_stats().unwrap();

        assert_eq!(stats.total_bins, 0);
        assert_eq!(stats.full_bins, 0);
        assert_eq!(stats.needs_maintenance, 0);
        assert_eq!(stats.avg_fill_percentage, 0.0);
        assert!(stats.bins_by_district.is_empty());
        for bin_type in BinType::ALL {
            assert_eq!(stats.bins_by_type.get(&bin_type), Some(&0));
        }
    }

    #[test]
    fn test_stats_counts_and_average() {
        let (_tmp, state) = create_test_state();
        create_bin_with_fill(&state.bin_api, "Main Street & 1st Ave", "Downtown", "general", 95);
        create_bin_with_fill(&state.bin_api, "Residential Block 1", "Residential", "recycling", 10);

        let stats = state.stats_api.get_stats().unwrap();

        assert_eq!(stats.total_bins, 2);
        assert_eq!(stats.full_bins, 1);
        assert_eq!(stats.avg_fill_percentage, 52.5);
        assert_eq!(stats.bins_by_type[&BinType::General], 1);
        assert_eq!(stats.bins_by_type[&BinType::Recycling], 1);
        assert_eq!(stats.bins_by_type[&BinType::Organic], 0);
        assert_eq!(stats.bins_by_district["Downtown"], 1);
        assert_eq!(stats.bins_by_district["Residential"], 1);
    }

    #[test]
    fn test_average_is_rounded_to_one_decimal() {
        let (_tmp, state) = create_test_state();
        for (i, fill) in [10, 20, 21, 0].iter().enumerate() {
            create_bin_with_fill(&state.bin_api, &format!("Spot {}", i), "Downtown", "general", *fill);
        }

        // 51 / 4 = 12.75
        let stats = state.stats_api.get_stats().unwrap();
        assert_eq!(stats.avg_fill_percentage, 12.8);
    }

    #[test]
    fn test_average_tie_rounds_to_even() {
        let (_tmp, state) = create_test_state();
        for (i, fill) in [50, 50, 50, 59].iter().enumerate() {
            create_bin_with_fill(&state.bin_api, &format!("Block {}", i), "Residential", "general", *fill);
        }

        // 209 / 4 = 52.25
        let stats = state.stats_api.get_stats().unwrap();
        assert_eq!(stats.avg_fill_percentage, 52.2);
    }

    #[test]
    fn test_maintenance_count_and_type_totals() {
        let (_tmp, state) = create_test_state();
        let a = create_bin_with_fill(&state.bin_api, "Factory Road", "Industrial", "hazardous", 96);
        create_bin_with_fill(&state.bin_api, "Industrial Park Gate", "Industrial", "organic", 40);
        create_bin_with_fill(&state.bin_api, "Market Square", "Commercial", "general", 0);

        state
            .bin_api
            .update_bin(
                a.id,
                BinUpdateRequest {
                    maintenance_required: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        let stats = state.stats_api.get_stats().unwrap();

        assert_eq!(stats.needs_maintenance, 1);
        // 需要维护的垃圾桶状态为 needs_maintenance，不再计入 full
        assert_eq!(stats.full_bins, 0);
        assert_eq!(stats.bins_by_type.values().sum::<i64>(), stats.total_bins);
        assert_eq!(stats.bins_by_district.values().sum::<i64>(), stats.total_bins);
        assert_eq!(stats.bins_by_district["Industrial"], 2);
    }
}
