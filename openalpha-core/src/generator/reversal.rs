//! Short-horizon reversal: bet against the lagged `window`-date price move.

use super::{fill_price_change, GenerateContext, GenerateError, SignalGenerator};

/// Signal `−(close[d − delay] / close[d − delay − window] − 1)`.
#[derive(Debug, Clone)]
pub struct Reversal {
    pub window: usize,
}

impl Reversal {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl SignalGenerator for Reversal {
    fn name(&self) -> &str {
        "reversal"
    }

    fn generate(
        &mut self,
        ctx: &GenerateContext<'_>,
        date: usize,
        row: &mut [f64],
    ) -> Result<(), GenerateError> {
        let delay = ctx.delay();
        fill_price_change(ctx, date, delay, delay + self.window, -1.0, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AlphaConfig, ParamMap};
    use crate::data::{Calendar, Dataset, MemoryProvider, CLOSE};

    fn provider() -> MemoryProvider {
        // Date-major closes for two symbols over four dates.
        let close = vec![10.0, 20.0, 11.0, 20.0, 12.0, 18.0, 13.0, f64::NAN];
        MemoryProvider::new(Calendar::new(vec![1, 2, 3, 4], vec!["A".into(), "B".into()]))
            .with(Dataset::float(CLOSE, 4, 2, close).unwrap())
    }

    #[test]
    fn signals_against_lagged_move() {
        let data = provider();
        let params = ParamMap::new();
        let config = AlphaConfig::default();
        let valid = [true; 8];
        let ctx = GenerateContext::new("rev", &params, &config, &data, &valid, 2);

        let mut row = [f64::NAN; 2];
        Reversal::new(2).generate(&ctx, 3, &mut row).unwrap();
        // Lagged date 2 vs date 0.
        assert!((row[0] + 0.2).abs() < 1e-12);
        assert!((row[1] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn too_early_dates_stay_nan() {
        let data = provider();
        let params = ParamMap::new();
        let config = AlphaConfig::default();
        let valid = [true; 4];
        let ctx = GenerateContext::new("rev", &params, &config, &data, &valid, 2);

        let mut row = [f64::NAN; 2];
        Reversal::new(2).generate(&ctx, 1, &mut row).unwrap();
        assert!(row.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn skips_symbols_outside_universe() {
        let data = provider();
        let params = ParamMap::new();
        let config = AlphaConfig::default();
        let mut valid = [true; 8];
        valid[6] = false;
        let ctx = GenerateContext::new("rev", &params, &config, &data, &valid, 2);

        let mut row = [f64::NAN; 2];
        Reversal::new(2).generate(&ctx, 3, &mut row).unwrap();
        assert!(row[0].is_nan());
        assert!(row[1].is_finite());
    }
}
