//! Configuration validation.
//!
//! Validates all config fields before a backtest runs, so bad values fail
//! fast with a section/key error instead of surfacing mid-run.

use crate::domain::error::ZonetraderError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), ZonetraderError> {
    require_string(config, "data", "csv_dir")?;
    require_string(config, "zones", "csv_path")?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), ZonetraderError> {
    validate_codes(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), ZonetraderError> {
    validate_buffer_method(config)?;
    validate_atr(config)?;
    validate_pct_buffer(config)?;
    validate_exit_params(config)?;
    validate_confirmation_params(config)?;
    validate_volume_filter(config)?;
    validate_rsi_filter(config)?;
    Ok(())
}

fn require_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), ZonetraderError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(ZonetraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_codes(config: &dyn ConfigPort) -> Result<(), ZonetraderError> {
    let codes = config.get_string("backtest", "codes");
    let code = config.get_string("backtest", "code");

    match (codes, code) {
        (Some(c), _) if !c.trim().is_empty() => Ok(()),
        (None, Some(c)) if !c.trim().is_empty() => Ok(()),
        _ => Err(ZonetraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "code".to_string(),
        }),
    }
}

/// start_date and end_date are optional (absent means the full data range),
/// but when both are present the window must be non-empty.
fn validate_dates(config: &dyn ConfigPort) -> Result<(), ZonetraderError> {
    let start = parse_date(config.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end = parse_date(config.get_string("backtest", "end_date").as_deref(), "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(ZonetraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must be before end_date".to_string(),
            });
        }
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>, ZonetraderError> {
    match value {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Some).map_err(|_| {
            ZonetraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn validate_buffer_method(config: &dyn ConfigPort) -> Result<(), ZonetraderError> {
    let value = config
        .get_string("strategy", "buffer_method")
        .unwrap_or_else(|| "atr".to_string());
    match value.to_lowercase().as_str() {
        "atr" | "pct" => Ok(()),
        _ => Err(ZonetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "buffer_method".to_string(),
            reason: "buffer_method must be atr or pct".to_string(),
        }),
    }
}

fn validate_atr(config: &dyn ConfigPort) -> Result<(), ZonetraderError> {
    let len = config.get_int("strategy", "atr_len", 14);
    if len < 1 {
        return Err(ZonetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "atr_len".to_string(),
            reason: "atr_len must be at least 1".to_string(),
        });
    }
    let mult = config.get_double("strategy", "atr_mult", 0.20);
    if mult <= 0.0 {
        return Err(ZonetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "atr_mult".to_string(),
            reason: "atr_mult must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_pct_buffer(config: &dyn ConfigPort) -> Result<(), ZonetraderError> {
    let value = config.get_double("strategy", "pct_buffer", 0.005);
    if value <= 0.0 {
        return Err(ZonetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "pct_buffer".to_string(),
            reason: "pct_buffer must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_exit_params(config: &dyn ConfigPort) -> Result<(), ZonetraderError> {
    let sl = config.get_double("strategy", "sl_pct", 0.05);
    if sl <= 0.0 || sl >= 1.0 {
        return Err(ZonetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "sl_pct".to_string(),
            reason: "sl_pct must be between 0 and 1".to_string(),
        });
    }
    let tp = config.get_double("strategy", "tp_buffer_pct", 0.02);
    if tp < 0.0 || tp >= 1.0 {
        return Err(ZonetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "tp_buffer_pct".to_string(),
            reason: "tp_buffer_pct must be between 0 and 1".to_string(),
        });
    }
    let max_hold = config.get_int("strategy", "max_hold_bars", 60);
    if max_hold < 1 {
        return Err(ZonetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "max_hold_bars".to_string(),
            reason: "max_hold_bars must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_confirmation_params(config: &dyn ConfigPort) -> Result<(), ZonetraderError> {
    let retest = config.get_int("strategy", "confirm_bars_retest", 3);
    if retest < 1 {
        return Err(ZonetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "confirm_bars_retest".to_string(),
            reason: "confirm_bars_retest must be at least 1".to_string(),
        });
    }
    let breakout = config.get_int("strategy", "confirm_closes_breakout", 2);
    if breakout < 1 {
        return Err(ZonetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "confirm_closes_breakout".to_string(),
            reason: "confirm_closes_breakout must be at least 1".to_string(),
        });
    }
    let not_late = config.get_double("strategy", "not_late_pct", 0.35);
    if not_late <= 0.0 || not_late > 1.0 {
        return Err(ZonetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "not_late_pct".to_string(),
            reason: "not_late_pct must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_volume_filter(config: &dyn ConfigPort) -> Result<(), ZonetraderError> {
    if !config.get_bool("strategy", "use_volume_filter", false) {
        return Ok(());
    }
    let lookback = config.get_int("strategy", "vol_lookback", 20);
    if lookback < 1 {
        return Err(ZonetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "vol_lookback".to_string(),
            reason: "vol_lookback must be at least 1".to_string(),
        });
    }
    let ratio = config.get_double("strategy", "min_vol_ratio", 1.0);
    if ratio <= 0.0 {
        return Err(ZonetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "min_vol_ratio".to_string(),
            reason: "min_vol_ratio must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_rsi_filter(config: &dyn ConfigPort) -> Result<(), ZonetraderError> {
    if !config.get_bool("strategy", "use_rsi_filter", false) {
        return Ok(());
    }
    let period = config.get_int("strategy", "rsi_period", 14);
    if period < 1 {
        return Err(ZonetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "rsi_period".to_string(),
            reason: "rsi_period must be at least 1".to_string(),
        });
    }
    let max_rsi = config.get_double("strategy", "max_rsi", 70.0);
    if max_rsi <= 0.0 || max_rsi > 100.0 {
        return Err(ZonetraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "max_rsi".to_string(),
            reason: "max_rsi must be between 0 and 100".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn valid_data_config_passes() {
        let config = make_config("[data]\ncsv_dir = ./data\n[zones]\ncsv_path = ./zones.csv\n");
        assert!(validate_data_config(&config).is_ok());
    }

    #[test]
    fn missing_csv_dir_fails() {
        let config = make_config("[zones]\ncsv_path = ./zones.csv\n");
        let err = validate_data_config(&config).unwrap_err();
        assert!(matches!(err, ZonetraderError::ConfigMissing { key, .. } if key == "csv_dir"));
    }

    #[test]
    fn missing_zone_path_fails() {
        let config = make_config("[data]\ncsv_dir = ./data\n");
        let err = validate_data_config(&config).unwrap_err();
        assert!(matches!(err, ZonetraderError::ConfigMissing { key, .. } if key == "csv_path"));
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            "[backtest]\ncodes = CDIA,BTCA\nstart_date = 2024-01-01\nend_date = 2025-06-30\n",
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn single_code_accepted() {
        let config = make_config("[backtest]\ncode = CDIA\n");
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn missing_code_fails() {
        let config = make_config("[backtest]\nstart_date = 2024-01-01\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, ZonetraderError::ConfigMissing { key, .. } if key == "code"));
    }

    #[test]
    fn dates_are_optional() {
        let config = make_config("[backtest]\ncode = CDIA\n");
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn invalid_date_format_fails() {
        let config = make_config("[backtest]\ncode = CDIA\nstart_date = 2024/01/01\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, ZonetraderError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn start_after_end_fails() {
        let config = make_config(
            "[backtest]\ncode = CDIA\nstart_date = 2025-06-30\nend_date = 2024-01-01\n",
        );
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, ZonetraderError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn defaults_pass_strategy_validation() {
        let config = make_config("[strategy]\n");
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn unknown_buffer_method_fails() {
        let config = make_config("[strategy]\nbuffer_method = wilder\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, ZonetraderError::ConfigInvalid { key, .. } if key == "buffer_method"));
    }

    #[test]
    fn atr_len_zero_fails() {
        let config = make_config("[strategy]\natr_len = 0\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, ZonetraderError::ConfigInvalid { key, .. } if key == "atr_len"));
    }

    #[test]
    fn atr_mult_negative_fails() {
        let config = make_config("[strategy]\natr_mult = -0.2\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, ZonetraderError::ConfigInvalid { key, .. } if key == "atr_mult"));
    }

    #[test]
    fn sl_pct_out_of_range_fails() {
        let config = make_config("[strategy]\nsl_pct = 1.5\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, ZonetraderError::ConfigInvalid { key, .. } if key == "sl_pct"));
    }

    #[test]
    fn max_hold_zero_fails() {
        let config = make_config("[strategy]\nmax_hold_bars = 0\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, ZonetraderError::ConfigInvalid { key, .. } if key == "max_hold_bars"));
    }

    #[test]
    fn not_late_above_one_fails() {
        let config = make_config("[strategy]\nnot_late_pct = 1.2\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, ZonetraderError::ConfigInvalid { key, .. } if key == "not_late_pct"));
    }

    #[test]
    fn volume_filter_params_ignored_when_disabled() {
        let config = make_config("[strategy]\nvol_lookback = 0\n");
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn volume_filter_params_checked_when_enabled() {
        let config = make_config("[strategy]\nuse_volume_filter = true\nvol_lookback = 0\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, ZonetraderError::ConfigInvalid { key, .. } if key == "vol_lookback"));
    }

    #[test]
    fn rsi_filter_params_checked_when_enabled() {
        let config = make_config("[strategy]\nuse_rsi_filter = true\nmax_rsi = 150\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, ZonetraderError::ConfigInvalid { key, .. } if key == "max_rsi"));
    }
}
