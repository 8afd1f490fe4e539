//! Integration tests for the index pipeline.
//!
//! Tests cover:
//! - Selection, composition tracking and aggregation on a known scenario
//! - Weighting and return-basis options
//! - Acquisition with partial failures and split adjustment
//! - Observation store round trip through SqliteAdapter
//! - Byte-identical exports for identical input

mod common;

use approx::assert_relative_eq;
use common::*;
use eqindex::adapters::csv_export_adapter::{CsvExportAdapter, CHANGES_FILE, PERFORMANCE_FILE};
use eqindex::adapters::typst_report::{TypstReportAdapter, REPORT_FILE};
use eqindex::domain::acquisition::fetch_universe;
use eqindex::domain::index::{ReturnBasis, TieBreak, WeightScheme};
use eqindex::domain::observation::SkipReason;
use eqindex::domain::pipeline::{build_index, run_index};
use eqindex::domain::summary::IndexSummary;
use eqindex::ports::report_port::ReportPort;
use std::fs;

mod index_pipeline {
    use super::*;

    #[test]
    fn replacement_scenario_end_to_end() {
        let run = build_index(&replacement_scenario(), &index_config(2));

        let day1: Vec<_> = run.constituents.iter().filter(|c| c.date == date(2025, 1, 1)).map(|c| c.ticker.as_str()).collect();
        let day2: Vec<_> = run.constituents.iter().filter(|c| c.date == date(2025, 1, 2)).map(|c| c.ticker.as_str()).collect();
        assert_eq!(day1, vec!["A", "B"]);
        assert_eq!(day2, vec!["A", "D"]);

        assert_eq!(run.changes.len(), 1);
        assert_eq!(run.changes[0].date, date(2025, 1, 2));
        assert_eq!(run.changes[0].added_list(), "D");
        assert_eq!(run.changes[0].removed_list(), "B");

        assert_eq!(run.performance.len(), 2);
        assert_eq!(run.performance[0].daily_return, None);
        assert_relative_eq!(run.performance[0].cumulative_value, 1.0);
        // A: +10%, D: +20% against its previous observation, 1/2 each.
        assert_relative_eq!(run.performance[1].daily_return.unwrap(), 0.15, epsilon = 1e-12);
        assert_relative_eq!(run.performance[1].cumulative_value, 1.15, epsilon = 1e-12);
    }

    #[test]
    fn constituent_basis_understates_new_entrants() {
        let mut config = index_config(2);
        config.return_basis = ReturnBasis::Constituents;
        let run = build_index(&replacement_scenario(), &config);

        // D entered on day 2 and has no prior constituent price.
        assert_relative_eq!(run.performance[1].daily_return.unwrap(), 0.05, epsilon = 1e-12);
        assert_relative_eq!(run.performance[1].cumulative_value, 1.05, epsilon = 1e-12);
    }

    #[test]
    fn fixed_weights_do_not_sum_to_one_on_thin_days() {
        let run = build_index(&replacement_scenario(), &index_config(10));
        let day1: f64 = run.constituents.iter().filter(|c| c.date == date(2025, 1, 1)).map(|c| c.weight).sum();
        assert_relative_eq!(day1, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn normalized_weights_sum_to_one() {
        let mut config = index_config(10);
        config.weighting = WeightScheme::Normalized;
        let run = build_index(&replacement_scenario(), &config);
        for day in [date(2025, 1, 1), date(2025, 1, 2)] {
            let total: f64 = run.constituents.iter().filter(|c| c.date == day).map(|c| c.weight).sum();
            assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn ticker_tie_break_is_order_independent() {
        let mut config = index_config(1);
        config.tie_break = TieBreak::Ticker;
        let forward = vec![obs("2025-01-01", "ZZZ", 5, 1.0), obs("2025-01-01", "AAA", 5, 1.0)];
        let reverse = vec![obs("2025-01-01", "AAA", 5, 1.0), obs("2025-01-01", "ZZZ", 5, 1.0)];

        let a = build_index(&forward, &config);
        let b = build_index(&reverse, &config);
        assert_eq!(a.constituents[0].ticker, "AAA");
        assert_eq!(a, b);
    }

    #[test]
    fn dirty_rows_are_skipped_not_fatal() {
        let mut rows = vec![
            raw("2025-01-01", "A", 10.0, 1.0),
            raw("2025-01-01", "A", 99.0, 1.0),
            raw("not-a-date", "B", 10.0, 1.0),
        ];
        rows.push(RawObservation {
            date: "2025-01-01".to_string(),
            ticker: "C".to_string(),
            market_cap: RawValue::Text("$1,500".to_string()),
            price: RawValue::Missing,
        });

        let run = run_index(rows, &index_config(5));

        assert_eq!(run.constituents.len(), 1);
        assert_eq!(run.constituents[0].market_cap, 10);
        let reasons: Vec<_> = run.skipped.iter().map(|s| s.reason.clone()).collect();
        assert_eq!(
            reasons,
            vec![SkipReason::Duplicate, SkipReason::InvalidDate, SkipReason::InvalidPrice]
        );
    }

    #[test]
    fn summary_reflects_run() {
        let run = build_index(&replacement_scenario(), &index_config(2));
        let summary = IndexSummary::compute(&run);

        assert_eq!(summary.index_days, 2);
        assert_eq!(summary.change_days, 1);
        assert_eq!(summary.total_additions, 1);
        assert_eq!(summary.total_removals, 1);
        assert_relative_eq!(summary.total_return, 0.15, epsilon = 1e-12);
        assert_relative_eq!(summary.max_drawdown, 0.0);
    }
}

mod acquisition {
    use super::*;

    fn tickers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn partial_failure_keeps_successful_tickers() {
        let port = MockQuotePort::new()
            .with_history("AAA", &[("2024-01-02", 10.0), ("2024-01-03", 11.0)], 100)
            .with_history("CCC", &[("2024-01-02", 5.0)], 100)
            .without_shares("CCC")
            .with_error("BBB", "rate limited");
        let observer = RecordingObserver::default();

        let result = fetch_universe(
            &port,
            &tickers(&["CCC", "BBB", "AAA"]),
            date(2024, 1, 1),
            date(2024, 1, 31),
            5,
            &observer,
        )
        .unwrap();

        assert_eq!(result.companies.len(), 1);
        assert_eq!(result.companies[0].ticker, "AAA");
        assert_eq!(result.companies[0].name, "AAA Inc");
        assert_eq!(result.observations.len(), 2);
        let failed: Vec<_> = result.failures.iter().map(|f| f.ticker.as_str()).collect();
        assert_eq!(failed, vec!["BBB", "CCC"]);
        assert!(result.failures[0].reason.contains("rate limited"));

        let mut seen_failed = observer.failed.lock().unwrap().clone();
        seen_failed.sort();
        assert_eq!(seen_failed, vec!["BBB", "CCC"]);
        assert_eq!(*observer.fetched.lock().unwrap(), vec!["AAA"]);
    }

    #[test]
    fn split_adjusts_historical_market_caps() {
        let port = MockQuotePort::new()
            .with_history("AAA", &[("2024-01-02", 100.0), ("2024-01-03", 50.0)], 2_000)
            .with_split("AAA", "2024-01-03", 2.0);

        let result = fetch_universe(
            &port,
            &tickers(&["AAA"]),
            date(2024, 1, 1),
            date(2024, 1, 31),
            1,
            &RecordingObserver::default(),
        )
        .unwrap();

        let caps: Vec<u64> = result.observations.iter().map(|o| o.market_cap).collect();
        assert_eq!(caps, vec![100_000, 100_000]);
    }

    #[test]
    fn acquired_observations_feed_the_pipeline() {
        let port = MockQuotePort::new()
            .with_history("BIG", &[("2024-01-02", 100.0), ("2024-01-03", 101.0)], 1_000)
            .with_history("MID", &[("2024-01-02", 50.0), ("2024-01-03", 60.0)], 1_000)
            .with_history("LOW", &[("2024-01-02", 1.0), ("2024-01-03", 200.0)], 1_000);

        let result = fetch_universe(
            &port,
            &tickers(&["BIG", "MID", "LOW"]),
            date(2024, 1, 1),
            date(2024, 1, 31),
            3,
            &RecordingObserver::default(),
        )
        .unwrap();
        let run = build_index(&result.observations, &index_config(2));

        assert_eq!(run.changes.len(), 1);
        assert_eq!(run.changes[0].added_list(), "LOW");
        assert_eq!(run.changes[0].removed_list(), "MID");
    }

    #[test]
    fn window_excludes_out_of_range_closes() {
        let port = MockQuotePort::new().with_history("AAA", &[("2023-12-29", 1.0), ("2024-01-02", 2.0)], 10);
        let result = fetch_universe(
            &port,
            &tickers(&["AAA"]),
            date(2024, 1, 1),
            date(2024, 1, 31),
            2,
            &RecordingObserver::default(),
        )
        .unwrap();
        assert_eq!(result.observations.len(), 1);
        assert_eq!(result.observations[0].date, date(2024, 1, 2));
    }
}

#[cfg(feature = "sqlite")]
mod sqlite_store {
    use super::*;
    use eqindex::adapters::sqlite_adapter::SqliteAdapter;
    use eqindex::domain::acquisition::Company;
    use eqindex::ports::observation_port::ObservationPort;

    #[test]
    fn stored_observations_build_the_same_index() {
        let store = SqliteAdapter::in_memory().unwrap();
        store.initialize_schema().unwrap();
        store
            .insert_companies(&[Company {
                ticker: "A".to_string(),
                name: "A Corp".to_string(),
            }])
            .unwrap();
        store.insert_observations(&replacement_scenario()).unwrap();

        let raw = store.fetch_observations(None, None).unwrap();
        let from_store = run_index(raw, &index_config(2));
        let direct = build_index(&replacement_scenario(), &index_config(2));

        assert_eq!(from_store, direct);
        assert!(from_store.skipped.is_empty());
    }

    #[test]
    fn range_bounded_read() {
        let store = SqliteAdapter::in_memory().unwrap();
        store.initialize_schema().unwrap();
        store.insert_observations(&replacement_scenario()).unwrap();

        let raw = store
            .fetch_observations(Some(date(2025, 1, 2)), Some(date(2025, 1, 2)))
            .unwrap();
        let run = run_index(raw, &index_config(2));

        assert_eq!(run.performance.len(), 1);
        assert!(run.changes.is_empty());
        assert_eq!(run.performance[0].daily_return, None);
    }
}

mod export {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn identical_input_gives_identical_files() {
        let first_dir = TempDir::new().unwrap();
        let second_dir = TempDir::new().unwrap();
        let adapters: Vec<Box<dyn ReportPort>> = vec![
            Box::new(CsvExportAdapter),
            Box::new(TypstReportAdapter::new("Top 2", None)),
        ];

        for dir in [&first_dir, &second_dir] {
            let run = build_index(&replacement_scenario(), &index_config(2));
            let summary = IndexSummary::compute(&run);
            for adapter in &adapters {
                adapter.write(&run, &summary, dir.path()).unwrap();
            }
        }

        for file in ["daily_composition.csv", CHANGES_FILE, PERFORMANCE_FILE, REPORT_FILE] {
            let a = fs::read(first_dir.path().join(file)).unwrap();
            let b = fs::read(second_dir.path().join(file)).unwrap();
            assert_eq!(a, b, "{file} differs between runs");
        }
    }

    #[test]
    fn exported_tables_match_scenario() {
        let dir = TempDir::new().unwrap();
        let run = build_index(&replacement_scenario(), &index_config(2));
        CsvExportAdapter
            .write(&run, &IndexSummary::compute(&run), dir.path())
            .unwrap();

        let changes = fs::read_to_string(dir.path().join(CHANGES_FILE)).unwrap();
        assert_eq!(
            changes,
            "date,additions,removals,added_tickers,removed_tickers\n2025-01-02,1,1,D,B\n"
        );

        let performance = fs::read_to_string(dir.path().join(PERFORMANCE_FILE)).unwrap();
        let lines: Vec<&str> = performance.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "2025-01-01,,1.0");
    }
}
