//! Data provider trait, dense panel datasets, and structured error types.
//!
//! The DataProvider trait abstracts over where named time series come from
//! (the on-disk Parquet store, an in-memory provider for tests and synthetic
//! runs) so the engine never depends on a concrete source.

use std::sync::Arc;
use thiserror::Error;

/// Structured error types for data operations.
///
/// Errors are `Clone` so a failed load can be memoized alongside successful ones.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DataError {
    #[error("dataset '{name}' not found")]
    NotFound { name: String },

    #[error("dataset '{name}' is malformed: {reason}")]
    Malformed { name: String, reason: String },

    #[error("calendar unavailable: {0}")]
    CalendarUnavailable(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("store I/O error: {0}")]
    Io(String),
}

/// The shared date axis and symbol universe every panel is aligned to.
#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    /// Calendar dates as `yyyymmdd` integers, ascending.
    pub dates: Vec<i64>,
    pub symbols: Vec<String>,
}

impl Calendar {
    pub fn new(dates: Vec<i64>, symbols: Vec<String>) -> Self {
        Self { dates, symbols }
    }

    pub fn num_dates(&self) -> usize {
        self.dates.len()
    }

    pub fn num_symbols(&self) -> usize {
        self.symbols.len()
    }

    /// Calendar date for a date index, if in range.
    pub fn date_at(&self, date: usize) -> Option<i64> {
        self.dates.get(date).copied()
    }
}

/// Element type of a panel dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Float,
    Int,
}

#[derive(Debug, Clone, PartialEq)]
enum PanelValues {
    /// Missing entries are NaN.
    Float(Vec<f64>),
    Int(Vec<Option<i64>>),
}

/// A dense `num_dates × num_symbols` panel stored date-major.
///
/// Row `date` is the contiguous slice `[date * num_symbols, (date + 1) * num_symbols)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    num_dates: usize,
    num_symbols: usize,
    values: PanelValues,
}

impl Dataset {
    /// Build a float panel. `values` must hold `num_dates * num_symbols` entries.
    pub fn float(
        name: impl Into<String>,
        num_dates: usize,
        num_symbols: usize,
        values: Vec<f64>,
    ) -> Result<Self, DataError> {
        let name = name.into();
        check_len(&name, num_dates, num_symbols, values.len())?;
        Ok(Self {
            name,
            num_dates,
            num_symbols,
            values: PanelValues::Float(values),
        })
    }

    /// Build an integer-coded panel (group ids and similar).
    pub fn int(
        name: impl Into<String>,
        num_dates: usize,
        num_symbols: usize,
        values: Vec<Option<i64>>,
    ) -> Result<Self, DataError> {
        let name = name.into();
        check_len(&name, num_dates, num_symbols, values.len())?;
        Ok(Self {
            name,
            num_dates,
            num_symbols,
            values: PanelValues::Int(values),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DatasetKind {
        match self.values {
            PanelValues::Float(_) => DatasetKind::Float,
            PanelValues::Int(_) => DatasetKind::Int,
        }
    }

    pub fn num_dates(&self) -> usize {
        self.num_dates
    }

    pub fn num_symbols(&self) -> usize {
        self.num_symbols
    }

    fn span(&self, date: usize) -> Option<std::ops::Range<usize>> {
        (date < self.num_dates).then(|| date * self.num_symbols..(date + 1) * self.num_symbols)
    }

    /// Float row for `date`. `None` if out of range or the panel is integer-coded.
    pub fn f64_row(&self, date: usize) -> Option<&[f64]> {
        match &self.values {
            PanelValues::Float(v) => self.span(date).map(|r| &v[r]),
            PanelValues::Int(_) => None,
        }
    }

    /// Integer row for `date`. `None` if out of range or the panel holds floats.
    pub fn i64_row(&self, date: usize) -> Option<&[Option<i64>]> {
        match &self.values {
            PanelValues::Int(v) => self.span(date).map(|r| &v[r]),
            PanelValues::Float(_) => None,
        }
    }

    /// Value as f64; NaN when missing or out of range. Integer panels are widened.
    pub fn value_f64(&self, date: usize, symbol: usize) -> f64 {
        if symbol >= self.num_symbols {
            return f64::NAN;
        }
        let Some(range) = self.span(date) else {
            return f64::NAN;
        };
        let idx = range.start + symbol;
        match &self.values {
            PanelValues::Float(v) => v[idx],
            PanelValues::Int(v) => v[idx].map_or(f64::NAN, |x| x as f64),
        }
    }

    /// Value as i64; `None` when missing, out of range, or the panel holds floats.
    pub fn value_i64(&self, date: usize, symbol: usize) -> Option<i64> {
        if symbol >= self.num_symbols {
            return None;
        }
        self.i64_row(date).and_then(|row| row[symbol])
    }
}

fn check_len(name: &str, num_dates: usize, num_symbols: usize, len: usize) -> Result<(), DataError> {
    if len != num_dates * num_symbols {
        return Err(DataError::Malformed {
            name: name.to_string(),
            reason: format!("expected {num_dates}x{num_symbols} values, got {len}"),
        });
    }
    Ok(())
}

/// Trait for sources of named panel datasets.
///
/// Implementations memoize: repeated `get` calls for the same name return the
/// same `Arc` without reloading. Concurrent first access must load once.
pub trait DataProvider: Send + Sync {
    /// The calendar (dates and symbols) every dataset is aligned to.
    fn calendar(&self) -> Result<Arc<Calendar>, DataError>;

    /// Fetch a named dataset, loading it on first reference.
    fn get(&self, name: &str) -> Result<Arc<Dataset>, DataError>;

    /// Whether a dataset with this name exists (without loading it).
    fn has(&self, name: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_panel_rows_are_date_major() {
        let ds = Dataset::float("close", 2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(ds.f64_row(1).unwrap(), &[4.0, 5.0, 6.0]);
        assert_eq!(ds.value_f64(0, 2), 3.0);
        assert!(ds.value_f64(2, 0).is_nan());
        assert!(ds.value_f64(0, 3).is_nan());
        assert!(ds.i64_row(0).is_none());
    }

    #[test]
    fn int_panel_widens_to_f64() {
        let ds = Dataset::int("sector", 1, 2, vec![Some(7), None]).unwrap();
        assert_eq!(ds.kind(), DatasetKind::Int);
        assert_eq!(ds.value_i64(0, 0), Some(7));
        assert_eq!(ds.value_i64(0, 1), None);
        assert_eq!(ds.value_f64(0, 0), 7.0);
        assert!(ds.value_f64(0, 1).is_nan());
    }

    #[test]
    fn wrong_length_is_malformed() {
        let err = Dataset::float("close", 2, 2, vec![1.0]).unwrap_err();
        assert!(matches!(err, DataError::Malformed { .. }));
    }
}
