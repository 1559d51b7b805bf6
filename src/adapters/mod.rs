//! Adapter implementations of the port traits.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod text_report_adapter;
pub mod zone_csv_adapter;
