//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report_adapter::TextReportAdapter;
use crate::adapters::zone_csv_adapter::ZoneCsvAdapter;
use crate::domain::config_validation::{
    parse_date, validate_backtest_config, validate_data_config, validate_strategy_config,
};
use crate::domain::engine::{self, BacktestResult};
use crate::domain::error::ZonetraderError;
use crate::domain::params::{BufferMethod, StrategyParams};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;
use crate::ports::zone_port::ZonePort;

#[derive(Parser, Debug)]
#[command(name = "zonetrader", about = "Zone retest/breakout signal backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Write the text report here as well as printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Backtest a single code, overriding the config
        #[arg(long)]
        code: Option<String>,
        /// Print the per-bar signal event log
        #[arg(short, long)]
        verbose: bool,
    },
    /// List codes with bar data available
    ListCodes {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            code,
            verbose,
        } => run_backtest(&config, output.as_ref(), code.as_deref(), verbose),
        Command::ListCodes { config } => run_list_codes(&config),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = ZonetraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn validate_all(adapter: &dyn ConfigPort) -> Result<(), ZonetraderError> {
    validate_data_config(adapter)?;
    validate_backtest_config(adapter)?;
    validate_strategy_config(adapter)?;
    Ok(())
}

pub fn build_strategy_params(adapter: &dyn ConfigPort) -> StrategyParams {
    let defaults = StrategyParams::default();
    let buffer_method = match adapter
        .get_string("strategy", "buffer_method")
        .unwrap_or_else(|| "atr".to_string())
        .to_lowercase()
        .as_str()
    {
        "pct" => BufferMethod::Pct,
        _ => BufferMethod::Atr,
    };

    StrategyParams {
        buffer_method,
        atr_len: adapter.get_int("strategy", "atr_len", defaults.atr_len as i64) as usize,
        atr_mult: adapter.get_double("strategy", "atr_mult", defaults.atr_mult),
        pct_buffer: adapter.get_double("strategy", "pct_buffer", defaults.pct_buffer),
        sl_pct: adapter.get_double("strategy", "sl_pct", defaults.sl_pct),
        tp_buffer_pct: adapter.get_double("strategy", "tp_buffer_pct", defaults.tp_buffer_pct),
        max_hold_bars: adapter.get_int("strategy", "max_hold_bars", defaults.max_hold_bars as i64)
            as usize,
        confirm_bars_retest: adapter.get_int(
            "strategy",
            "confirm_bars_retest",
            defaults.confirm_bars_retest as i64,
        ) as usize,
        confirm_closes_breakout: adapter.get_int(
            "strategy",
            "confirm_closes_breakout",
            defaults.confirm_closes_breakout as i64,
        ) as u32,
        not_late_pct: adapter.get_double("strategy", "not_late_pct", defaults.not_late_pct),
        use_volume_filter: adapter.get_bool("strategy", "use_volume_filter", false),
        vol_lookback: adapter.get_int("strategy", "vol_lookback", defaults.vol_lookback as i64)
            as usize,
        min_vol_ratio: adapter.get_double("strategy", "min_vol_ratio", defaults.min_vol_ratio),
        use_rsi_filter: adapter.get_bool("strategy", "use_rsi_filter", false),
        rsi_period: adapter.get_int("strategy", "rsi_period", defaults.rsi_period as i64) as usize,
        max_rsi: adapter.get_double("strategy", "max_rsi", defaults.max_rsi),
    }
}

pub fn resolve_codes(code_override: Option<&str>, config: &dyn ConfigPort) -> Vec<String> {
    if let Some(c) = code_override {
        return vec![c.to_uppercase()];
    }

    if let Some(codes_str) = config.get_string("backtest", "codes") {
        return codes_str
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Some(code) = config.get_string("backtest", "code") {
        let code = code.trim().to_uppercase();
        if !code.is_empty() {
            return vec![code];
        }
    }

    vec![]
}

fn run_backtest(
    config_path: &PathBuf,
    output_path: Option<&PathBuf>,
    code_override: Option<&str>,
    verbose: bool,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_all(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let params = build_strategy_params(&adapter);

    let codes = resolve_codes(code_override, &adapter);
    if codes.is_empty() {
        eprintln!("error: no codes configured");
        return ExitCode::from(2);
    }

    // validate_data_config guarantees both paths are present
    let csv_dir = adapter.get_string("data", "csv_dir").unwrap_or_default();
    let zone_path = adapter.get_string("zones", "csv_path").unwrap_or_default();

    let data_port = CsvAdapter::new(PathBuf::from(csv_dir));
    let zone_port = match ZoneCsvAdapter::from_file(&zone_path) {
        Ok(z) => z,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let start_date = match parse_date(
        adapter.get_string("backtest", "start_date").as_deref(),
        "start_date",
    ) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let end_date = match parse_date(
        adapter.get_string("backtest", "end_date").as_deref(),
        "end_date",
    ) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Running backtest: {} codes", codes.len());

    let mut results: Vec<BacktestResult> = Vec::with_capacity(codes.len());
    for code in &codes {
        let bars = match data_port.fetch_ohlcv(code, start_date, end_date) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("warning: skipping {} ({})", code, e);
                continue;
            }
        };
        let zones = match zone_port.zones_for(code) {
            Ok(z) => z,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        if zones.is_empty() {
            eprintln!("warning: no zones configured for {}", code);
        }

        match engine::run_backtest(code, &bars, &zones, &params) {
            Ok(result) => {
                eprintln!(
                    "  {}: {} bars, {} trades",
                    code,
                    bars.len(),
                    result.trade_count()
                );
                results.push(result);
            }
            Err(e) => {
                eprintln!("warning: skipping {} ({})", code, e);
            }
        }
    }

    if results.is_empty() {
        eprintln!("error: no valid codes with data to backtest");
        return ExitCode::from(5);
    }

    if verbose {
        for result in &results {
            eprintln!("\n--- {} events ---", result.code);
            for event in &result.events {
                eprintln!("  {event}");
            }
        }
    }

    print!("{}", TextReportAdapter::render(&results, &params));

    if let Some(output) = output_path {
        let report = TextReportAdapter;
        match report.write(&results, &params, &output.display().to_string()) {
            Ok(()) => eprintln!("Report written to: {}", output.display()),
            Err(e) => {
                eprintln!("error: failed to write report: {e}");
                return ExitCode::from(1);
            }
        }
    }

    ExitCode::SUCCESS
}

fn run_list_codes(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let csv_dir = match adapter.get_string("data", "csv_dir") {
        Some(d) if !d.trim().is_empty() => d,
        _ => {
            let err = ZonetraderError::ConfigMissing {
                section: "data".to_string(),
                key: "csv_dir".to_string(),
            };
            eprintln!("error: {err}");
            return (&err).into();
        }
    };

    let data_port = CsvAdapter::new(PathBuf::from(csv_dir));
    match data_port.list_codes() {
        Ok(codes) if codes.is_empty() => {
            eprintln!("No bar data found");
            ExitCode::SUCCESS
        }
        Ok(codes) => {
            for code in &codes {
                println!("{code}");
            }
            eprintln!("{} codes found", codes.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_all(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let params = build_strategy_params(&adapter);
    let codes = resolve_codes(None, &adapter);

    eprintln!("\nStrategy:");
    match params.buffer_method {
        BufferMethod::Atr => eprintln!(
            "  buffer: ATR({}) x {}",
            params.atr_len, params.atr_mult
        ),
        BufferMethod::Pct => eprintln!("  buffer: close x {}", params.pct_buffer),
    }
    eprintln!("  stop loss: {:.1}%", params.sl_pct * 100.0);
    eprintln!("  max hold: {} bars", params.max_hold_bars);
    eprintln!(
        "  confirmation: retest {} bars, breakout {} closes",
        params.confirm_bars_retest, params.confirm_closes_breakout
    );
    if params.use_volume_filter {
        eprintln!(
            "  volume filter: {}x over {} bars",
            params.min_vol_ratio, params.vol_lookback
        );
    }
    if params.use_rsi_filter {
        eprintln!(
            "  RSI filter: reject at RSI({}) >= {}",
            params.rsi_period, params.max_rsi
        );
    }
    eprintln!("  codes: {}", codes.join(", "));

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
