//! Cross-sectional momentum with an optional skip of the most recent dates.

use super::{fill_price_change, GenerateContext, GenerateError, SignalGenerator};

/// Signal `close[d − delay − skip] / close[d − delay − window] − 1`.
#[derive(Debug, Clone)]
pub struct Momentum {
    pub window: usize,
    pub skip: usize,
}

impl Momentum {
    pub fn new(window: usize, skip: usize) -> Self {
        Self { window, skip }
    }
}

impl SignalGenerator for Momentum {
    fn name(&self) -> &str {
        "momentum"
    }

    fn generate(
        &mut self,
        ctx: &GenerateContext<'_>,
        date: usize,
        row: &mut [f64],
    ) -> Result<(), GenerateError> {
        let delay = ctx.delay();
        fill_price_change(ctx, date, delay + self.skip, delay + self.window, 1.0, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AlphaConfig, ParamMap};
    use crate::data::{Calendar, DataError, Dataset, MemoryProvider, CLOSE};

    #[test]
    fn skip_excludes_recent_move() {
        let close = vec![10.0, 12.0, 15.0, 1.0];
        let data = MemoryProvider::new(Calendar::new(vec![1, 2, 3, 4], vec!["A".into()]))
            .with(Dataset::float(CLOSE, 4, 1, close).unwrap());
        let params = ParamMap::new();
        let config = AlphaConfig {
            delay: 0,
            ..AlphaConfig::default()
        };
        let valid = [true; 4];
        let ctx = GenerateContext::new("mom", &params, &config, &data, &valid, 1);

        let mut row = [f64::NAN];
        Momentum::new(3, 1).generate(&ctx, 3, &mut row).unwrap();
        // close[2] / close[0] - 1
        assert!((row[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn missing_close_is_an_error() {
        let data = MemoryProvider::new(Calendar::new(vec![1, 2, 3], vec!["A".into()]));
        let params = ParamMap::new();
        let config = AlphaConfig::default();
        let valid = [true; 3];
        let ctx = GenerateContext::new("mom", &params, &config, &data, &valid, 1);

        let mut row = [f64::NAN];
        let err = Momentum::new(1, 0).generate(&ctx, 2, &mut row).unwrap_err();
        assert!(matches!(err, GenerateError::Data(DataError::NotFound { .. })));
    }
}
