//! Dense per-alpha signal storage.
//!
//! One contiguous `f64` buffer and one contiguous `bool` buffer, each
//! `num_dates × num_symbols`, addressed by date row with stride `num_symbols`.
//! Rows are handed out as slices; no row pointers escape the grid.

/// Raw signal values and universe flags for one alpha.
#[derive(Debug, Clone)]
pub struct SignalGrid {
    num_dates: usize,
    num_symbols: usize,
    values: Vec<f64>,
    valid: Vec<bool>,
}

impl SignalGrid {
    /// Allocate a grid with every value NaN and every flag false.
    pub fn new(num_dates: usize, num_symbols: usize) -> Self {
        let n = num_dates * num_symbols;
        Self {
            num_dates,
            num_symbols,
            values: vec![f64::NAN; n],
            valid: vec![false; n],
        }
    }

    pub fn num_dates(&self) -> usize {
        self.num_dates
    }

    pub fn num_symbols(&self) -> usize {
        self.num_symbols
    }

    fn span(&self, date: usize) -> std::ops::Range<usize> {
        assert!(
            date < self.num_dates,
            "date {date} out of range ({} dates)",
            self.num_dates
        );
        date * self.num_symbols..(date + 1) * self.num_symbols
    }

    pub fn row(&self, date: usize) -> &[f64] {
        &self.values[self.span(date)]
    }

    pub fn row_mut(&mut self, date: usize) -> &mut [f64] {
        let span = self.span(date);
        &mut self.values[span]
    }

    pub fn valid_row(&self, date: usize) -> &[bool] {
        &self.valid[self.span(date)]
    }

    pub fn valid_row_mut(&mut self, date: usize) -> &mut [bool] {
        let span = self.span(date);
        &mut self.valid[span]
    }

    pub fn value(&self, date: usize, symbol: usize) -> f64 {
        self.row(date)[symbol]
    }

    pub fn is_valid(&self, date: usize, symbol: usize) -> bool {
        self.valid_row(date)[symbol]
    }

    /// Mutable value row together with the same date's universe flags.
    pub fn row_with_mask_mut(&mut self, date: usize) -> (&mut [f64], &[bool]) {
        let span = self.span(date);
        (&mut self.values[span.clone()], &self.valid[span])
    }

    /// Mutable value row for `date` plus the universe flags of dates `0..=date`.
    ///
    /// Flags are returned date-major, so date `k` occupies
    /// `[k * num_symbols, (k + 1) * num_symbols)`.
    pub fn generation_view(&mut self, date: usize) -> (&mut [f64], &[bool]) {
        let span = self.span(date);
        (&mut self.values[span.clone()], &self.valid[..span.end])
    }
}
