//! End-to-end integration tests
//!
//! These tests validate the complete pipeline using CSV fixtures. Each test:
//! 1. Loads merchants.csv (and campaigns.csv when present) from a fixture directory
//! 2. Processes every event in input.csv through the engine
//! 3. Compares the balances written with expected.csv
//!
//! Fixtures live in tests/fixtures/ and cover:
//! - Default accrual and campaign accrual (branch scope, date windows, minimums)
//! - Ordered redemption and exact depletion
//! - Rejected redemptions (insufficient rewards, invalid amounts)
//! - Malformed rows and unknown merchants
//! - Interleaved users and merchants
//!
//! Each fixture runs with both the synchronous and the asynchronous strategy.

#[cfg(test)]
mod tests {
    use loyalty_rewards_engine::cli::StrategyType;
    use loyalty_rewards_engine::io::Catalog;
    use loyalty_rewards_engine::strategy::create_strategy;
    use rstest::rstest;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    /// Run a fixture and compare its output with expected.csv
    ///
    /// # Panics
    ///
    /// Panics if a fixture file cannot be read, the catalog does not load,
    /// processing fails, or the output differs from expected.csv.
    fn run_test_fixture(fixture_name: &str, strategy_type: StrategyType) {
        let fixture_dir = Path::new("tests/fixtures").join(fixture_name);
        let input_path = fixture_dir.join("input.csv");
        let expected_path = fixture_dir.join("expected.csv");
        let campaigns_path = fixture_dir.join("campaigns.csv");

        assert!(input_path.exists(), "Input file not found: {}", input_path.display());

        let catalog = Catalog::load(
            &fixture_dir.join("merchants.csv"),
            campaigns_path.exists().then_some(campaigns_path.as_path()),
        )
        .unwrap_or_else(|e| panic!("Failed to load catalog for {}: {}", fixture_name, e));

        let strategy = create_strategy(strategy_type, catalog, None);
        let mut temp_output = NamedTempFile::new().expect("Failed to create temp file");

        strategy
            .process(&input_path, &mut temp_output)
            .unwrap_or_else(|e| panic!("Failed to process events: {}", e));
        temp_output.flush().expect("Failed to flush temp file");

        let actual_output = fs::read_to_string(temp_output.path())
            .unwrap_or_else(|e| panic!("Failed to read temp output file: {}", e));
        let expected_output = fs::read_to_string(&expected_path).unwrap_or_else(|e| {
            panic!(
                "Failed to read expected file {}: {}",
                expected_path.display(),
                e
            )
        });

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (strategy: {:?})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, strategy_type, actual_output, expected_output
        );
    }

    #[rstest]
    #[case("default_accrual")]
    #[case("campaign_accrual")]
    #[case("ordered_redemption")]
    #[case("insufficient_rewards")]
    #[case("malformed_data")]
    #[case("multiple_users")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        run_test_fixture(fixture, strategy);
    }

    #[rstest]
    fn test_missing_events_file_is_fatal(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let catalog = Catalog::load(
            Path::new("tests/fixtures/default_accrual/merchants.csv"),
            None,
        )
        .unwrap();
        let mut output = Vec::new();

        let result = create_strategy(strategy, catalog, None)
            .process(Path::new("tests/fixtures/no_such_events.csv"), &mut output);

        assert!(result.is_err());
        assert!(output.is_empty());
    }
}
