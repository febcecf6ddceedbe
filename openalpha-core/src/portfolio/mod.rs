//! Portfolio engine: raw signal row → neutralized, capped, book-scaled positions
//! plus the date's return and turnover.

mod accounting;
mod decay;
mod neutralize;

pub use accounting::{daily_return, scale_to_book, turnover};
pub use decay::decayed_value;
pub use neutralize::{
    build_groups, clamp_to_cap, demean_groups, neutralize, Grouping, Groups, Neutralized,
    BREACH_TOLERANCE, MAX_CAP_PASSES,
};

use tracing::debug;

use crate::config::AlphaConfig;
use crate::grid::SignalGrid;

/// Auxiliary per-date market data the engine reads. Rows are already lagged
/// by the caller where the lag applies.
#[derive(Debug, Clone, Copy)]
pub struct MarketInputs<'a> {
    pub grouping: Grouping<'a>,
    /// Close prices on the scored date.
    pub close: Option<&'a [f64]>,
    /// Close prices on the date before.
    pub close_prev: Option<&'a [f64]>,
}

/// Result of one date's calculation, committed by the owning alpha.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyOutcome {
    pub positions: Vec<f64>,
    pub ret: f64,
    pub turnover: f64,
}

/// Stateless per-date position builder for one alpha's configuration.
#[derive(Debug, Clone)]
pub struct PortfolioEngine {
    config: AlphaConfig,
}

impl PortfolioEngine {
    pub fn new(config: AlphaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlphaConfig {
        &self.config
    }

    /// Build the positions for `date` and score them.
    ///
    /// Raw values outside the date's universe are forced to NaN in the grid;
    /// that is the only write and it is idempotent. Returns `None` when the
    /// neutralized gross exposure is zero (no trade for the date).
    pub fn calculate(
        &self,
        grid: &mut SignalGrid,
        date: usize,
        prev_positions: &[f64],
        inputs: &MarketInputs<'_>,
    ) -> Option<DailyOutcome> {
        apply_universe(grid, date);

        let mut positions = self.smoothed_row(grid, date);
        let mut groups = build_groups(&mut positions, inputs.grouping);
        let neutralized = neutralize(&mut positions, &mut groups, self.config.max_stock_weight);
        if neutralized.gross_exposure == 0.0 {
            debug!(date, "zero gross exposure, no trade");
            return None;
        }
        if neutralized.clamp_passes > 0 {
            debug!(date, passes = neutralized.clamp_passes, "positions capped");
        }

        let book = self.config.book_size;
        scale_to_book(&mut positions, neutralized.gross_exposure, book);
        let ret = daily_return(&positions, inputs.close, inputs.close_prev, book);
        let turnover = turnover(&positions, prev_positions, book);

        Some(DailyOutcome {
            positions,
            ret,
            turnover,
        })
    }

    /// A symbol with no raw value today stays NaN whatever its history.
    fn smoothed_row(&self, grid: &SignalGrid, date: usize) -> Vec<f64> {
        let decay = self.config.decay;
        if decay <= 1 {
            return grid.row(date).to_vec();
        }
        grid.valid_row(date)
            .iter()
            .zip(grid.row(date))
            .enumerate()
            .map(|(s, (&valid, &raw))| {
                if valid && !raw.is_nan() {
                    decayed_value(grid, date, s, decay)
                } else {
                    f64::NAN
                }
            })
            .collect()
    }
}

fn apply_universe(grid: &mut SignalGrid, date: usize) {
    let (row, valid) = grid.row_with_mask_mut(date);
    for (v, &ok) in row.iter_mut().zip(valid) {
        if !ok {
            *v = f64::NAN;
        }
    }
}
