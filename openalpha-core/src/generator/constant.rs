//! Fills every symbol in the universe with one value.

use super::{GenerateContext, GenerateError, SignalGenerator};

#[derive(Debug, Clone)]
pub struct Constant {
    pub value: f64,
}

impl Constant {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl SignalGenerator for Constant {
    fn name(&self) -> &str {
        "constant"
    }

    fn generate(
        &mut self,
        ctx: &GenerateContext<'_>,
        date: usize,
        row: &mut [f64],
    ) -> Result<(), GenerateError> {
        let valid = ctx
            .valid_row(date)
            .ok_or_else(|| GenerateError::Failed(format!("no universe for date {date}")))?;
        for (out, &ok) in row.iter_mut().zip(valid) {
            if ok {
                *out = self.value;
            }
        }
        Ok(())
    }
}
