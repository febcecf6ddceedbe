//! OpenAlpha Runner — simulation orchestration, configuration files and reports.
//!
//! This crate builds on `openalpha-core` to provide:
//! - TOML simulation files with per-alpha option tables
//! - The multi-alpha simulation driver (sequential or rayon-parallel)
//! - Per-alpha `perf.csv` and `summary.json` reports
//! - Summary performance metrics

pub mod config;
pub mod driver;
pub mod metrics;
pub mod report;
pub mod runner;

pub use config::{ConfigError, SimulationConfig};
pub use driver::{ExecutionMode, Simulation, SimulationError};
pub use metrics::PerfSummary;
pub use report::{
    fingerprint, write_alpha_report, AlphaSummary, PerfReport, PerfRow, WrittenReport,
    SCHEMA_VERSION,
};
pub use runner::{build_alpha, run_from_config, run_simulation, RunError, RunOutcome};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn simulation_is_send() {
        assert_send::<Simulation>();
    }

    #[test]
    fn report_types_are_send_sync() {
        assert_send::<PerfReport>();
        assert_sync::<PerfReport>();
        assert_send::<AlphaSummary>();
        assert_sync::<AlphaSummary>();
        assert_send::<PerfSummary>();
        assert_sync::<PerfSummary>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<SimulationConfig>();
        assert_sync::<SimulationConfig>();
        assert_send::<ExecutionMode>();
        assert_sync::<ExecutionMode>();
    }
}
