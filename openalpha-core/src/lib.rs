//! OpenAlpha Core — data, signal grid, universe selection, generation contract,
//! portfolio construction and per-alpha accounting.
//!
//! This crate contains the simulation engine itself:
//! - Data provider trait with Parquet-backed and in-memory implementations
//! - Dense per-alpha signal grid
//! - Liquidity-ranked universe selection
//! - Pluggable signal generators plus built-ins
//! - Decay, group neutralization, exposure capping, book scaling, return and turnover
//! - The `Alpha` lifecycle tying them together date by date

pub mod alpha;
pub mod config;
pub mod data;
pub mod generator;
pub mod grid;
pub mod portfolio;
pub mod universe;

pub use alpha::{Alpha, AlphaError};
pub use config::{AlphaConfig, ConfigError, Neutralization, ParamMap};
pub use generator::{create_generator, GenerateContext, GenerateError, SignalGenerator};
pub use grid::SignalGrid;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: alphas can be stepped on worker threads and the
    /// shared data types can be read from many at once.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Alpha>();
        require_send::<Box<dyn SignalGenerator>>();
        require_send::<SignalGrid>();
        require_sync::<SignalGrid>();
        require_send::<AlphaConfig>();
        require_sync::<AlphaConfig>();

        require_send::<data::Dataset>();
        require_sync::<data::Dataset>();
        require_send::<data::Calendar>();
        require_sync::<data::Calendar>();
        require_send::<data::ParquetStore>();
        require_sync::<data::ParquetStore>();
        require_send::<data::MemoryProvider>();
        require_sync::<data::MemoryProvider>();

        require_send::<portfolio::PortfolioEngine>();
        require_sync::<portfolio::PortfolioEngine>();
    }

    /// Architecture contract: generators never see positions.
    ///
    /// `generate()` takes only the context, the date and the raw row. If a
    /// position parameter is ever added the trait changes and this breaks.
    #[test]
    fn signal_generator_trait_has_no_position_parameter() {
        fn _check_trait_object_builds(
            generator: &mut dyn SignalGenerator,
            ctx: &GenerateContext<'_>,
            row: &mut [f64],
        ) -> Result<(), GenerateError> {
            generator.generate(ctx, 0, row)
        }
    }
}
