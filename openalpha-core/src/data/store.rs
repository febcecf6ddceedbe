//! Parquet-backed dataset store with lazy, memoized loading.
//!
//! Layout: `{cache_dir}/{name}.parquet`
//!
//! - `date.parquet`: one Int64 column `date`, one row per calendar date
//! - `symbol.parquet`: one Utf8 column `symbol`, one row per symbol
//! - every other dataset: one column per calendar date (in calendar order),
//!   one row per symbol; Float64 for prices/liquidity, Int64 for group ids
//!
//! Each dataset is loaded at most once. Loads go through a per-name `OnceLock`,
//! so threads racing on the first reference block on a single load instead of
//! duplicating it. Failed loads are memoized too and logged once.

use super::provider::{Calendar, DataError, DataProvider, Dataset};
use super::{DATE, SYMBOL};
use polars::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{info, warn};

type Slot<T> = Arc<OnceLock<Result<Arc<T>, DataError>>>;

/// The Parquet dataset store.
pub struct ParquetStore {
    cache_dir: PathBuf,
    calendar: OnceLock<Result<Arc<Calendar>, DataError>>,
    loaded: Mutex<HashMap<String, Slot<Dataset>>>,
}

impl ParquetStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            calendar: OnceLock::new(),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Root directory of the store.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn dataset_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{name}.parquet"))
    }

    /// Names of all datasets present on disk, sorted.
    pub fn list(&self) -> Result<Vec<String>, DataError> {
        let entries = fs::read_dir(&self.cache_dir)
            .map_err(|e| DataError::Io(format!("read {}: {e}", self.cache_dir.display())))?;
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("parquet"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Write the calendar as `date.parquet` and `symbol.parquet`.
    pub fn write_calendar(&self, calendar: &Calendar) -> Result<(), DataError> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::Io(format!("failed to create dir: {e}")))?;

        let dates = DataFrame::new(vec![Column::new(DATE.into(), calendar.dates.clone())])
            .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))?;
        write_atomic(&dates, &self.dataset_path(DATE))?;

        let symbols = DataFrame::new(vec![Column::new(SYMBOL.into(), calendar.symbols.clone())])
            .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))?;
        write_atomic(&symbols, &self.dataset_path(SYMBOL))?;
        Ok(())
    }

    /// Write a panel dataset with one column per calendar date.
    ///
    /// Any memoized copy of the same name is dropped so the next `get` reloads it.
    pub fn write(&self, dataset: &Dataset, calendar: &Calendar) -> Result<(), DataError> {
        if dataset.num_dates() != calendar.num_dates()
            || dataset.num_symbols() != calendar.num_symbols()
        {
            return Err(DataError::Malformed {
                name: dataset.name().to_string(),
                reason: format!(
                    "shape {}x{} does not match calendar {}x{}",
                    dataset.num_dates(),
                    dataset.num_symbols(),
                    calendar.num_dates(),
                    calendar.num_symbols()
                ),
            });
        }
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::Io(format!("failed to create dir: {e}")))?;

        let df = dataset_to_dataframe(dataset, calendar)?;
        write_atomic(&df, &self.dataset_path(dataset.name()))?;

        self.loaded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(dataset.name());
        Ok(())
    }

    fn slot(&self, name: &str) -> Slot<Dataset> {
        let mut loaded = self
            .loaded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        loaded.entry(name.to_string()).or_default().clone()
    }

    fn load_calendar(&self) -> Result<Arc<Calendar>, DataError> {
        let dates_df = read_parquet(DATE, &self.dataset_path(DATE))?;
        let dates = dates_df
            .column(DATE)
            .and_then(|c| c.cast(&DataType::Int64))
            .map_err(|e| DataError::Malformed {
                name: DATE.into(),
                reason: format!("date column: {e}"),
            })?;
        let dates: Vec<i64> = dates
            .i64()
            .map_err(|e| DataError::ParquetError(format!("date column type: {e}")))?
            .into_iter()
            .enumerate()
            .map(|(i, d)| {
                d.ok_or_else(|| DataError::Malformed {
                    name: DATE.into(),
                    reason: format!("null date at row {i}"),
                })
            })
            .collect::<Result<_, _>>()?;

        let symbols_df = read_parquet(SYMBOL, &self.dataset_path(SYMBOL))?;
        let symbols: Vec<String> = symbols_df
            .column(SYMBOL)
            .and_then(|c| {
                c.str().map(|ca| {
                    ca.into_iter()
                        .map(|s| s.unwrap_or_default().to_string())
                        .collect()
                })
            })
            .map_err(|e| DataError::Malformed {
                name: SYMBOL.into(),
                reason: format!("symbol column: {e}"),
            })?;

        info!(
            dates = dates.len(),
            symbols = symbols.len(),
            "calendar loaded"
        );
        Ok(Arc::new(Calendar::new(dates, symbols)))
    }

    fn load(&self, name: &str) -> Result<Arc<Dataset>, DataError> {
        let calendar = self.calendar()?;
        let df = read_parquet(name, &self.dataset_path(name))?;
        let dataset = dataframe_to_dataset(name, &df, calendar.num_dates(), calendar.num_symbols())?;
        info!(dataset = name, "dataset loaded");
        Ok(Arc::new(dataset))
    }
}

impl DataProvider for ParquetStore {
    fn calendar(&self) -> Result<Arc<Calendar>, DataError> {
        self.calendar
            .get_or_init(|| {
                self.load_calendar().map_err(|e| {
                    warn!(error = %e, "failed to load calendar");
                    DataError::CalendarUnavailable(e.to_string())
                })
            })
            .clone()
    }

    fn get(&self, name: &str) -> Result<Arc<Dataset>, DataError> {
        self.slot(name)
            .get_or_init(|| {
                self.load(name).map_err(|e| {
                    warn!(dataset = name, error = %e, "failed to load dataset");
                    e
                })
            })
            .clone()
    }

    fn has(&self, name: &str) -> bool {
        self.dataset_path(name).exists()
    }
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn read_parquet(name: &str, path: &Path) -> Result<DataFrame, DataError> {
    if !path.exists() {
        return Err(DataError::NotFound { name: name.into() });
    }
    let file = fs::File::open(path).map_err(|e| DataError::Io(format!("open: {e}")))?;
    ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read {name}: {e}")))
}

/// Write to `{path}.tmp`, then rename into place.
fn write_atomic(df: &DataFrame, path: &Path) -> Result<(), DataError> {
    let tmp_path = path.with_extension("parquet.tmp");
    let file = fs::File::create(&tmp_path)
        .map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df.clone())
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DataError::Io(format!("atomic rename failed: {e}"))
    })
}

fn dataset_to_dataframe(dataset: &Dataset, calendar: &Calendar) -> Result<DataFrame, DataError> {
    let columns: Vec<Column> = calendar
        .dates
        .iter()
        .enumerate()
        .map(|(date, label)| {
            let name = label.to_string();
            match (dataset.f64_row(date), dataset.i64_row(date)) {
                (Some(row), _) => Column::new(name.into(), row.to_vec()),
                (_, Some(row)) => Column::new(name.into(), row.to_vec()),
                (None, None) => Column::new(name.into(), Vec::<f64>::new()),
            }
        })
        .collect();
    DataFrame::new(columns).map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

/// Convert a one-column-per-date frame into a date-major panel.
fn dataframe_to_dataset(
    name: &str,
    df: &DataFrame,
    num_dates: usize,
    num_symbols: usize,
) -> Result<Dataset, DataError> {
    if df.width() != num_dates || df.height() != num_symbols {
        return Err(DataError::Malformed {
            name: name.into(),
            reason: format!(
                "expected {num_symbols} rows x {num_dates} date columns, got {} x {}",
                df.height(),
                df.width()
            ),
        });
    }

    let columns = df.get_columns();
    let map_err = |e: PolarsError| DataError::Malformed {
        name: name.into(),
        reason: format!("column read: {e}"),
    };

    if columns.iter().all(|c| c.dtype().is_integer()) {
        let mut values = Vec::with_capacity(num_dates * num_symbols);
        for column in columns {
            let cast = column.cast(&DataType::Int64).map_err(map_err)?;
            values.extend(cast.i64().map_err(map_err)?.into_iter());
        }
        return Dataset::int(name, num_dates, num_symbols, values);
    }

    let mut values = Vec::with_capacity(num_dates * num_symbols);
    for column in columns {
        if !(column.dtype().is_float() || column.dtype().is_integer()) {
            return Err(DataError::Malformed {
                name: name.into(),
                reason: format!("column '{}' has non-numeric type {}", column.name(), column.dtype()),
            });
        }
        let cast = column.cast(&DataType::Float64).map_err(map_err)?;
        values.extend(
            cast.f64()
                .map_err(map_err)?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN)),
        );
    }
    Dataset::float(name, num_dates, num_symbols, values)
}
