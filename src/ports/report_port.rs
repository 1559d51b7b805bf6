//! Report generation port trait.

use crate::domain::engine::BacktestResult;
use crate::domain::error::ZonetraderError;
use crate::domain::params::StrategyParams;

/// Port for writing backtest reports covering one or more instruments.
pub trait ReportPort {
    fn write(
        &self,
        results: &[BacktestResult],
        params: &StrategyParams,
        output_path: &str,
    ) -> Result<(), ZonetraderError>;
}
