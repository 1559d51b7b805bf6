//! Pipeline tests wiring real files through the adapters: INI config,
//! per-code bar CSVs, the shared zone table, and the text report.

mod common;

use common::*;
use std::fs;
use std::path::PathBuf;
use zonetrader::adapters::csv_adapter::CsvAdapter;
use zonetrader::adapters::file_config_adapter::FileConfigAdapter;
use zonetrader::adapters::text_report_adapter::TextReportAdapter;
use zonetrader::adapters::zone_csv_adapter::ZoneCsvAdapter;
use zonetrader::cli::{build_strategy_params, resolve_codes};
use zonetrader::domain::config_validation::{
    parse_date, validate_backtest_config, validate_data_config, validate_strategy_config,
};
use zonetrader::domain::engine::run_backtest;
use zonetrader::domain::params::BufferMethod;
use zonetrader::ports::config_port::ConfigPort;
use zonetrader::ports::data_port::DataPort;
use zonetrader::ports::report_port::ReportPort;
use zonetrader::ports::zone_port::ZonePort;

fn write_bars_csv(dir: &std::path::Path, code: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for bar in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
        ));
    }
    fs::write(dir.join(format!("{code}.csv")), content).unwrap();
}

/// Bars that walk through a full breakout trade on the CDIA zone table.
fn cdia_breakout_bars() -> Vec<OhlcvBar> {
    vec![
        close_bar("CDIA", 0, 1430.0),
        close_bar("CDIA", 1, 1430.0),
        close_bar("CDIA", 2, 1490.0),
        close_bar("CDIA", 3, 1495.0),
        close_bar("CDIA", 4, 1500.0),
        close_bar("CDIA", 5, 1505.0),
        ohlc_bar("CDIA", 6, 1510.0, 1520.0, 1500.0, 1515.0),
        ohlc_bar("CDIA", 7, 1620.0, 1650.0, 1600.0, 1630.0),
    ]
}

const ZONE_CSV: &str = "code,zone,low,high\n\
    CDIA,1,1440,1480\n\
    CDIA,2,1670,1735\n\
    CDIA,3,1950,2050\n";

#[test]
fn pipeline_from_files_to_report() {
    let dir = tempfile::TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    fs::create_dir(&data_dir).unwrap();
    write_bars_csv(&data_dir, "CDIA", &cdia_breakout_bars());
    let zone_path = dir.path().join("zones.csv");
    fs::write(&zone_path, ZONE_CSV).unwrap();

    let ini = format!(
        "[data]\ncsv_dir = {}\n[zones]\ncsv_path = {}\n\
         [strategy]\natr_len = 2\n[backtest]\ncodes = CDIA\n",
        data_dir.display(),
        zone_path.display()
    );
    let config = FileConfigAdapter::from_string(&ini).unwrap();
    validate_data_config(&config).unwrap();
    validate_backtest_config(&config).unwrap();
    validate_strategy_config(&config).unwrap();

    let params = build_strategy_params(&config);
    let codes = resolve_codes(None, &config);
    assert_eq!(codes, vec!["CDIA"]);

    let data_port = CsvAdapter::new(PathBuf::from(
        config.get_string("data", "csv_dir").unwrap(),
    ));
    let zone_port = ZoneCsvAdapter::from_file(&zone_path).unwrap();

    let mut results = Vec::new();
    for code in &codes {
        let bars = data_port.fetch_ohlcv(code, None, None).unwrap();
        let zones = zone_port.zones_for(code).unwrap();
        results.push(run_backtest(code, &bars, &zones, &params).unwrap());
    }

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].trade_count(), 1);
    assert!((results[0].trades[0].exit_price - 1670.0 * 0.98).abs() < 1e-9);

    let report_path = dir.path().join("report.txt");
    TextReportAdapter
        .write(&results, &params, report_path.to_str().unwrap())
        .unwrap();
    let report = fs::read_to_string(&report_path).unwrap();
    assert!(report.contains("=== CDIA ==="));
    assert!(report.contains("BO_HOLD"));
}

#[test]
fn date_window_clips_data_before_the_engine() {
    let dir = tempfile::TempDir::new().unwrap();
    write_bars_csv(dir.path(), "CDIA", &cdia_breakout_bars());
    let data_port = CsvAdapter::new(dir.path().to_path_buf());

    let start = parse_date(Some("2025-01-03"), "start_date").unwrap();
    let end = parse_date(Some("2025-01-06"), "end_date").unwrap();
    let bars = data_port.fetch_ohlcv("CDIA", start, end).unwrap();
    assert_eq!(bars.len(), 4);
    assert_eq!(bars[0].date, date(2025, 1, 3));
    assert_eq!(bars[3].date, date(2025, 1, 6));
}

#[test]
fn config_overrides_reach_the_engine_params() {
    let ini = "[strategy]\nbuffer_method = pct\npct_buffer = 0.01\natr_len = 5\n\
               max_hold_bars = 20\nconfirm_bars_retest = 2\n";
    let config = FileConfigAdapter::from_string(ini).unwrap();
    let params = build_strategy_params(&config);
    assert_eq!(params.buffer_method, BufferMethod::Pct);
    assert_eq!(params.pct_buffer, 0.01);
    assert_eq!(params.atr_len, 5);
    assert_eq!(params.max_hold_bars, 20);
    assert_eq!(params.confirm_bars_retest, 2);
}

#[test]
fn code_without_zone_rows_runs_empty() {
    let dir = tempfile::TempDir::new().unwrap();
    write_bars_csv(dir.path(), "BTCA", &cdia_breakout_bars());
    let data_port = CsvAdapter::new(dir.path().to_path_buf());
    let zone_port = ZoneCsvAdapter::from_string(ZONE_CSV).unwrap();

    let bars = data_port.fetch_ohlcv("BTCA", None, None).unwrap();
    let zones = zone_port.zones_for("BTCA").unwrap();
    assert!(zones.is_empty());

    let result = run_backtest("BTCA", &bars, &zones, &short_params()).unwrap();
    assert_eq!(result.trade_count(), 0);
    assert!(result.events.is_empty());
}

#[test]
fn mock_data_port_matches_csv_adapter_window_semantics() {
    let bars = cdia_breakout_bars();
    let port = MockDataPort::new().with_bars("CDIA", bars.clone());

    let all = port.fetch_ohlcv("CDIA", None, None).unwrap();
    assert_eq!(all.len(), bars.len());

    let clipped = port
        .fetch_ohlcv("CDIA", Some(date(2025, 1, 3)), Some(date(2025, 1, 6)))
        .unwrap();
    assert_eq!(clipped.len(), 4);
}
