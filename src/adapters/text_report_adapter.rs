//! Plain-text report adapter.
//!
//! Renders per-instrument trade ledgers plus a cross-instrument summary
//! table; the same rendering backs both stdout output and `--output` files.

use crate::domain::engine::BacktestResult;
use crate::domain::error::ZonetraderError;
use crate::domain::params::{BufferMethod, StrategyParams};
use crate::ports::report_port::ReportPort;
use std::fs;

pub struct TextReportAdapter;

impl TextReportAdapter {
    pub fn render(results: &[BacktestResult], params: &StrategyParams) -> String {
        let mut out = String::new();
        out.push_str(&render_params(params));
        for result in results {
            out.push('\n');
            out.push_str(&render_code(result));
        }
        if results.len() > 1 {
            out.push('\n');
            out.push_str(&render_summary(results));
        }
        out
    }
}

fn render_params(params: &StrategyParams) -> String {
    let buffer = match params.buffer_method {
        BufferMethod::Atr => format!("ATR({}) x {}", params.atr_len, params.atr_mult),
        BufferMethod::Pct => format!("close x {}", params.pct_buffer),
    };
    format!(
        "zone backtest | buffer {} | SL {:.1}% | max hold {} bars\n",
        buffer,
        params.sl_pct * 100.0,
        params.max_hold_bars
    )
}

fn render_code(result: &BacktestResult) -> String {
    let mut out = format!("=== {} ===\n", result.code);

    if result.trades.is_empty() {
        out.push_str("no closed trades\n");
    } else {
        out.push_str(&format!(
            "{:<12} {:<12} {:<12} {:>4} {:>10} {:>10} {:>9} {:>8} {:>5}\n",
            "ENTRY", "EXIT", "KIND", "ZONE", "ENTRY_PX", "EXIT_PX", "REASON", "PNL%", "HELD"
        ));
        for trade in &result.trades {
            out.push_str(&format!(
                "{:<12} {:<12} {:<12} {:>4} {:>10.2} {:>10.2} {:>9} {:>+8.2} {:>5}\n",
                trade.entry_date,
                trade.exit_date,
                trade.kind.to_string(),
                trade.zone_number,
                trade.entry_price,
                trade.exit_price,
                trade.exit_reason.to_string(),
                trade.pnl_pct,
                trade.bars_held,
            ));
        }
    }

    if let Some(pos) = &result.open_position {
        out.push_str(&format!(
            "open: {} zone {} entered {} @ {:.2} (SL {:.2}, TP {:.2})\n",
            pos.kind, pos.zone_number, pos.entry_date, pos.entry_price, pos.stop_loss, pos.take_profit
        ));
    }

    out.push_str(&format!(
        "trades {} | wins {} | losses {} | win rate {:.1}% | total PnL {:+.2}% | avg {:+.2}%\n",
        result.trade_count(),
        result.win_count(),
        result.loss_count(),
        result.win_rate() * 100.0,
        result.total_pnl_pct(),
        result.avg_pnl_pct(),
    ));
    out
}

fn render_summary(results: &[BacktestResult]) -> String {
    let mut out = String::from("=== SUMMARY ===\n");
    out.push_str(&format!(
        "{:<10} {:>6} {:>5} {:>6} {:>8} {:>10}\n",
        "CODE", "TRADES", "WINS", "LOSSES", "WINRATE", "TOTAL_PNL%"
    ));
    for result in results {
        out.push_str(&format!(
            "{:<10} {:>6} {:>5} {:>6} {:>7.1}% {:>+10.2}\n",
            result.code,
            result.trade_count(),
            result.win_count(),
            result.loss_count(),
            result.win_rate() * 100.0,
            result.total_pnl_pct(),
        ));
    }
    let total: usize = results.iter().map(|r| r.trade_count()).sum();
    let wins: usize = results.iter().map(|r| r.win_count()).sum();
    let pnl: f64 = results.iter().map(|r| r.total_pnl_pct()).sum();
    let rate = if total > 0 {
        wins as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    out.push_str(&format!(
        "{:<10} {:>6} {:>5} {:>6} {:>7.1}% {:>+10.2}\n",
        "ALL",
        total,
        wins,
        total - wins,
        rate,
        pnl,
    ));
    out
}

impl ReportPort for TextReportAdapter {
    fn write(
        &self,
        results: &[BacktestResult],
        params: &StrategyParams,
        output_path: &str,
    ) -> Result<(), ZonetraderError> {
        fs::write(output_path, Self::render(results, params))?;
        Ok(())
    }
}
