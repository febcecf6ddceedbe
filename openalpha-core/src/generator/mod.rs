//! Signal generation contract.
//!
//! A generator fills one date's raw signal row for its alpha. It sees the
//! alpha's options, the shared data provider and the universe masks of the
//! current and earlier dates, never positions or other alphas.

mod constant;
mod factory;
mod momentum;
mod reversal;

pub use constant::Constant;
pub use factory::{create_generator, GENERATOR_KEY};
pub use momentum::Momentum;
pub use reversal::Reversal;

use thiserror::Error;

use crate::config::{AlphaConfig, ParamMap};
use crate::data::{DataError, DataProvider, CLOSE};

/// Errors raised while constructing or running a generator.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("unknown generator '{0}'")]
    UnknownGenerator(String),

    #[error("generator option '{key}' = '{value}' is invalid")]
    InvalidParam { key: String, value: String },

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("{0}")]
    Failed(String),
}

/// Read-only view handed to a generator for one date.
pub struct GenerateContext<'a> {
    pub name: &'a str,
    pub params: &'a ParamMap,
    pub config: &'a AlphaConfig,
    data: &'a dyn DataProvider,
    /// Universe flags for dates `0..=date`, date-major.
    valid: &'a [bool],
    num_symbols: usize,
}

impl<'a> GenerateContext<'a> {
    pub fn new(
        name: &'a str,
        params: &'a ParamMap,
        config: &'a AlphaConfig,
        data: &'a dyn DataProvider,
        valid: &'a [bool],
        num_symbols: usize,
    ) -> Self {
        Self {
            name,
            params,
            config,
            data,
            valid,
            num_symbols,
        }
    }

    pub fn delay(&self) -> usize {
        self.config.delay
    }

    pub fn decay(&self) -> usize {
        self.config.decay
    }

    pub fn num_symbols(&self) -> usize {
        self.num_symbols
    }

    pub fn data(&self) -> &dyn DataProvider {
        self.data
    }

    /// Universe flags of `date`, or `None` for dates after the one being generated.
    pub fn valid_row(&self, date: usize) -> Option<&[bool]> {
        let start = date.checked_mul(self.num_symbols)?;
        self.valid.get(start..start + self.num_symbols)
    }
}

/// A pluggable per-date signal source.
///
/// `row` arrives filled with NaN; entries left NaN carry no signal. `date`
/// is always past the alpha's warm-up.
pub trait SignalGenerator: Send {
    /// Short identifier used in logs (e.g. "reversal").
    fn name(&self) -> &str;

    fn generate(
        &mut self,
        ctx: &GenerateContext<'_>,
        date: usize,
        row: &mut [f64],
    ) -> Result<(), GenerateError>;
}

/// Fill `row` with `sign × (close[date − near] / close[date − far] − 1)` for
/// symbols in the date's universe. Dates too early for the lookback are left
/// NaN.
pub(crate) fn fill_price_change(
    ctx: &GenerateContext<'_>,
    date: usize,
    near: usize,
    far: usize,
    sign: f64,
    row: &mut [f64],
) -> Result<(), GenerateError> {
    let (Some(near_date), Some(far_date)) = (date.checked_sub(near), date.checked_sub(far)) else {
        return Ok(());
    };
    let close = ctx.data().get(CLOSE)?;
    let (Some(now), Some(then)) = (close.f64_row(near_date), close.f64_row(far_date)) else {
        return Err(GenerateError::Failed(format!(
            "close has no row for date {near_date} or {far_date}"
        )));
    };
    let valid = ctx
        .valid_row(date)
        .ok_or_else(|| GenerateError::Failed(format!("no universe for date {date}")))?;
    let prices = now.iter().zip(then);
    for ((out, &ok), (c_near, c_far)) in row.iter_mut().zip(valid).zip(prices) {
        let change = c_near / c_far - 1.0;
        if ok && change.is_finite() {
            *out = sign * change;
        }
    }
    Ok(())
}
