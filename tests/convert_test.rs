//! Conversion pipeline tests.
//!
//! Tests cover:
//! - Reader-level conversion of literal CSV input to JSON
//! - Timeframe aggregation fold rules on realistic minute data
//! - Job execution through mock ports (read once, write per target)
//! - Properties: determinism, positive volume, ascending dates, volume sums

mod common;

use approx::assert_relative_eq;
use candleconv::adapters::json_adapter::JsonAdapter;
use candleconv::cli::{convert_reader, run_jobs};
use candleconv::domain::error::ConvertError;
use candleconv::domain::job::ConversionJob;
use candleconv::domain::resample::convert;
use candleconv::domain::timeframe::Timeframe;
use common::*;
use proptest::prelude::*;
use std::path::PathBuf;

fn tf(minutes: u32) -> Timeframe {
    Timeframe::from_minutes(minutes).unwrap()
}

mod reader_conversion {
    use super::*;

    #[test]
    fn two_rows_map_one_to_one() {
        let csv = "1609459200,100,110,90,105,2.5,3\n1609459205,105,108,95,106,1.0,1\n";
        let candles = convert_reader(csv.as_bytes(), None).unwrap();
        let json = JsonAdapter::to_json_string(&candles).unwrap();
        assert_eq!(
            json,
            r#"[["2021-01-01T00:00:00Z",100.0,110.0,90.0,105.0,2.5],["2021-01-01T00:00:05Z",105.0,108.0,95.0,106.0,1.0]]"#
        );
    }

    #[test]
    fn zero_volume_and_null_rows_are_dropped() {
        let csv = "1609459200,1,1,1,1,0,0\n\
                   1609459260,1,1,1,1,,0\n\
                   1609459320,2,3,1,2,0.5,2\n";
        let candles = convert_reader(csv.as_bytes(), None).unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].date_string(), "2021-01-01T00:02:00Z");
    }

    #[test]
    fn bad_row_aborts_whole_conversion() {
        let csv = "1609459200,1,1,1,1,1,1\nnot-a-time,1,1,1,1,1,1\n1609459320,1,1,1,1,1,1\n";
        let err = convert_reader(csv.as_bytes(), None).unwrap_err();
        assert!(matches!(err, ConvertError::Parse { line: 2, .. }));
    }

    #[test]
    fn empty_input_gives_empty_array() {
        let candles = convert_reader("".as_bytes(), Some(tf(5))).unwrap();
        assert_eq!(JsonAdapter::to_json_string(&candles).unwrap(), "[]");
    }
}

mod aggregation {
    use super::*;

    #[test]
    fn minutes_to_five_minutes() {
        let rows = minute_rows(12);
        let candles = convert(&rows, Some(tf(5))).unwrap();

        assert_eq!(candles.len(), 3);
        let first = &candles[0];
        assert_eq!(first.date.timestamp(), T0);
        assert_eq!(first.open, rows[0].open);
        assert_eq!(first.close, rows[4].close);
        assert_eq!(first.high, rows[4].high);
        assert_eq!(first.low, rows[0].low);
        assert_relative_eq!(first.volume, 1.0 + 2.0 + 3.0 + 4.0 + 5.0);

        let last = &candles[2];
        assert_eq!(last.date.timestamp(), T0 + 600);
        assert_eq!(last.open, rows[10].open);
        assert_eq!(last.close, rows[11].close);
        assert_relative_eq!(last.volume, 11.0 + 12.0);
    }

    #[test]
    fn gaps_do_not_create_candles() {
        let rows = vec![make_row(T0, 10.0, 1.0), make_row(T0 + 3 * 3600, 12.0, 2.0)];
        let candles = convert(&rows, Some(tf(60))).unwrap();
        let stamps: Vec<i64> = candles.iter().map(|c| c.date.timestamp()).collect();
        assert_eq!(stamps, vec![T0, T0 + 3 * 3600]);
    }

    #[test]
    fn daily_buckets_align_to_midnight_utc() {
        let rows = vec![
            make_row(T0 + 23 * 3600, 10.0, 1.0),
            make_row(T0 + 25 * 3600, 11.0, 1.0),
        ];
        let candles = convert(&rows, Some(tf(1440))).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].date_string(), "2021-01-01T00:00:00Z");
        assert_eq!(candles[1].date_string(), "2021-01-02T00:00:00Z");
    }
}

mod job_execution {
    use super::*;

    fn job(input: &str, output: &str, resample_to: Option<Timeframe>) -> ConversionJob {
        ConversionJob {
            input_path: PathBuf::from(input),
            fiat: "EUR".into(),
            source: Some(tf(1)),
            resample_to,
            output_path: PathBuf::from(output),
        }
    }

    #[test]
    fn reads_each_input_once_for_several_targets() {
        let rows_port = MockRowPort::new().with_rows("BTCEUR_1.csv", minute_rows(10));
        let sink = RecordingCandlePort::new();
        let jobs = vec![
            job("BTCEUR_1.csv", "BTC_EUR-1m.json", None),
            job("BTCEUR_1.csv", "BTC_EUR-5m.json", Some(tf(5))),
        ];

        let reports = run_jobs(&jobs, &rows_port, &sink).unwrap();

        assert_eq!(rows_port.reads.borrow().len(), 1);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].rows, 10);
        assert_eq!(reports[0].candles, 10);
        assert_eq!(reports[1].candles, 2);

        let written = sink.written.borrow();
        assert_eq!(written[0].0, PathBuf::from("BTC_EUR-1m.json"));
        assert_eq!(written[1].0, PathBuf::from("BTC_EUR-5m.json"));
        assert_eq!(written[1].1.len(), 2);
    }

    #[test]
    fn processes_files_in_order() {
        let rows_port = MockRowPort::new()
            .with_rows("ADAEUR_1.csv", minute_rows(3))
            .with_rows("BTCEUR_1.csv", minute_rows(4));
        let sink = RecordingCandlePort::new();
        let jobs = vec![
            job("ADAEUR_1.csv", "ADA_EUR-1m.json", None),
            job("BTCEUR_1.csv", "BTC_EUR-1m.json", None),
        ];

        run_jobs(&jobs, &rows_port, &sink).unwrap();

        let reads = rows_port.reads.borrow();
        assert_eq!(
            *reads,
            vec![PathBuf::from("ADAEUR_1.csv"), PathBuf::from("BTCEUR_1.csv")]
        );
    }

    #[test]
    fn read_failure_stops_the_run() {
        let rows_port = MockRowPort::new()
            .with_rows("ADAEUR_1.csv", minute_rows(3))
            .with_error("BTCEUR_1.csv", "invalid open value")
            .with_rows("ETHEUR_1.csv", minute_rows(3));
        let sink = RecordingCandlePort::new();
        let jobs = vec![
            job("ADAEUR_1.csv", "ADA_EUR-1m.json", None),
            job("BTCEUR_1.csv", "BTC_EUR-1m.json", None),
            job("ETHEUR_1.csv", "ETH_EUR-1m.json", None),
        ];

        let result = run_jobs(&jobs, &rows_port, &sink);

        assert!(matches!(result, Err(ConvertError::Parse { .. })));
        assert_eq!(sink.written.borrow().len(), 1);
    }
}

fn arb_rows() -> impl Strategy<Value = Vec<RawRow>> {
    let row = (
        0i64..20_000,
        1.0f64..1_000.0,
        0.0f64..50.0,
        prop_oneof![Just(0.0f64), 0.0001f64..500.0],
    )
        .prop_map(|(offset, price, spread, volume)| RawRow {
            timestamp: T0 + offset,
            open: price,
            high: price + spread,
            low: price - spread / 2.0,
            close: price + spread / 4.0,
            volume,
            trades: 1,
        });
    prop::collection::vec(row, 0..200)
}

proptest! {
    #[test]
    fn conversion_is_deterministic(rows in arb_rows(), minutes in prop::option::of(1u32..=240)) {
        let timeframe = minutes.and_then(Timeframe::from_minutes);
        let first = JsonAdapter::to_json_string(&convert(&rows, timeframe).unwrap()).unwrap();
        let second = JsonAdapter::to_json_string(&convert(&rows, timeframe).unwrap()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn every_candle_has_positive_volume(rows in arb_rows(), minutes in prop::option::of(1u32..=240)) {
        let candles = convert(&rows, minutes.and_then(Timeframe::from_minutes)).unwrap();
        for c in &candles {
            prop_assert!(c.volume > 0.0);
            prop_assert!(c.high >= c.low);
        }
    }

    #[test]
    fn dates_strictly_ascend(rows in arb_rows(), minutes in prop::option::of(1u32..=240)) {
        let candles = convert(&rows, minutes.and_then(Timeframe::from_minutes)).unwrap();
        for pair in candles.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn volume_is_conserved(rows in arb_rows(), minutes in prop::option::of(1u32..=240)) {
        let candles = convert(&rows, minutes.and_then(Timeframe::from_minutes)).unwrap();
        let input: f64 = rows.iter().map(|r| r.volume).sum();
        let output: f64 = candles.iter().map(|c| c.volume).sum();
        prop_assert!((input - output).abs() <= 1e-9 * input.max(1.0));
    }

    #[test]
    fn buckets_are_aligned(rows in arb_rows(), minutes in 1u32..=240) {
        let timeframe = Timeframe::from_minutes(minutes).unwrap();
        let candles = convert(&rows, Some(timeframe)).unwrap();
        for c in &candles {
            prop_assert_eq!(c.date.timestamp() % timeframe.seconds(), 0);
        }
    }
}
