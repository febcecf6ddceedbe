//! One alpha: configuration, signal grid, generator and per-date accounting.
//!
//! Each date past warm-up runs three stages in order: universe selection,
//! signal generation, then position construction and scoring. Generation
//! failures (errors or panics) only blank that date's row.

use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{AlphaConfig, ConfigError, ParamMap};
use crate::data::{Calendar, DataError, DataProvider, Dataset, CLOSE, LIQUIDITY};
use crate::generator::{GenerateContext, SignalGenerator};
use crate::grid::SignalGrid;
use crate::portfolio::{Grouping, MarketInputs, PortfolioEngine};
use crate::universe::select_universe;

/// Fatal errors that prevent an alpha from being built.
#[derive(Debug, Error)]
pub enum AlphaError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("calendar unavailable: {0}")]
    Calendar(#[source] DataError),
}

pub struct Alpha {
    name: String,
    params: ParamMap,
    config: AlphaConfig,
    calendar: Arc<Calendar>,
    data: Arc<dyn DataProvider>,
    generator: Box<dyn SignalGenerator>,
    grid: SignalGrid,
    engine: PortfolioEngine,
    /// Positions of the most recently calculated date.
    positions: Vec<f64>,
    daily_returns: Vec<f64>,
    daily_turnover: Vec<f64>,
    /// Datasets already reported missing, so each is warned about once.
    warned: BTreeSet<String>,
}

impl std::fmt::Debug for Alpha {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alpha")
            .field("name", &self.name)
            .field("generator", &self.generator.name())
            .field("config", &self.config)
            .field("num_dates", &self.num_dates())
            .field("num_symbols", &self.num_symbols())
            .finish()
    }
}

impl Alpha {
    /// Parse the configuration, read the calendar and allocate storage.
    pub fn initialize(
        name: impl Into<String>,
        params: ParamMap,
        data: Arc<dyn DataProvider>,
        generator: Box<dyn SignalGenerator>,
    ) -> Result<Self, AlphaError> {
        let name = name.into();
        let config = AlphaConfig::from_params(&params)?;
        let calendar = data.calendar().map_err(AlphaError::Calendar)?;
        let (nd, ns) = (calendar.num_dates(), calendar.num_symbols());

        info!(
            alpha = %name,
            generator = generator.name(),
            dates = nd,
            symbols = ns,
            %config,
            "alpha initialized"
        );

        Ok(Self {
            engine: PortfolioEngine::new(config.clone()),
            grid: SignalGrid::new(nd, ns),
            positions: vec![f64::NAN; ns],
            daily_returns: vec![f64::NAN; nd],
            daily_turnover: vec![f64::NAN; nd],
            warned: BTreeSet::new(),
            name,
            params,
            config,
            calendar,
            data,
            generator,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &ParamMap {
        &self.params
    }

    pub fn config(&self) -> &AlphaConfig {
        &self.config
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn num_dates(&self) -> usize {
        self.grid.num_dates()
    }

    pub fn num_symbols(&self) -> usize {
        self.grid.num_symbols()
    }

    pub fn delay(&self) -> usize {
        self.config.delay
    }

    pub fn decay(&self) -> usize {
        self.config.decay
    }

    pub fn lookback_days(&self) -> usize {
        self.config.lookback_days
    }

    pub fn grid(&self) -> &SignalGrid {
        &self.grid
    }

    /// Positions from the latest calculated date.
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    pub fn daily_returns(&self) -> &[f64] {
        &self.daily_returns
    }

    pub fn daily_turnover(&self) -> &[f64] {
        &self.daily_turnover
    }

    /// Dates before this index are never generated or scored.
    pub fn warmup_dates(&self) -> usize {
        self.config.warmup_dates()
    }

    pub fn is_warm(&self, date: usize) -> bool {
        date >= self.warmup_dates()
    }

    /// Run one date. Returns `false` if the date was skipped (date 0, still
    /// warming up, or past the calendar).
    ///
    /// Dates must be stepped in increasing order.
    pub fn step(&mut self, date: usize) -> bool {
        if date == 0 || date >= self.num_dates() || !self.is_warm(date) {
            return false;
        }
        self.update_valid(date);
        self.generate(date);
        self.calculate(date);
        true
    }

    /// Mark the date's tradable universe from liquidity at `date - delay`.
    fn update_valid(&mut self, date: usize) {
        self.grid.valid_row_mut(date).fill(false);

        let Some(liquidity) = self.dataset(LIQUIDITY) else {
            return;
        };
        let lagged = date - self.config.delay;
        let Some(row) = liquidity.f64_row(lagged) else {
            self.warn_once(LIQUIDITY, "no float row for the lagged date");
            return;
        };

        let selected = select_universe(row, self.config.universe_size, self.grid.valid_row_mut(date));
        debug!(alpha = %self.name, date, selected, "universe selected");
    }

    /// Fill the date's raw row from the generator. Errors and panics leave it NaN.
    fn generate(&mut self, date: usize) {
        let ns = self.grid.num_symbols();
        let (row, valid) = self.grid.generation_view(date);
        row.fill(f64::NAN);

        let ctx = GenerateContext::new(
            &self.name,
            &self.params,
            &self.config,
            self.data.as_ref(),
            valid,
            ns,
        );
        let generator = &mut self.generator;
        let result = panic::catch_unwind(AssertUnwindSafe(|| generator.generate(&ctx, date, row)));

        let failure = match result {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };
        warn!(alpha = %self.name, date, error = %failure, "signal generation failed");
        self.grid.row_mut(date).fill(f64::NAN);
    }

    /// Build positions for the date and record return and turnover.
    fn calculate(&mut self, date: usize) {
        let lagged = date - self.config.delay;
        let close = self.dataset(CLOSE);
        let groups = self
            .config
            .neutralization
            .group_dataset()
            .map(|name| self.dataset(name));

        let grouping = match &groups {
            None => Grouping::Market,
            Some(Some(ids)) => ids.i64_row(lagged).map_or(Grouping::Unavailable, Grouping::ById),
            Some(None) => Grouping::Unavailable,
        };
        let inputs = MarketInputs {
            grouping,
            close: close.as_deref().and_then(|c| c.f64_row(date)),
            close_prev: close.as_deref().and_then(|c| c.f64_row(date - 1)),
        };

        match self
            .engine
            .calculate(&mut self.grid, date, &self.positions, &inputs)
        {
            Some(outcome) => {
                self.daily_returns[date] = outcome.ret;
                self.daily_turnover[date] = outcome.turnover;
                self.positions = outcome.positions;
            }
            None => self.positions.fill(f64::NAN),
        }
    }

    /// Fetch a dataset, warning once per alpha if it is missing or misshapen.
    fn dataset(&mut self, name: &str) -> Option<Arc<Dataset>> {
        match self.data.get(name) {
            Ok(ds) if ds.num_symbols() == self.num_symbols() && ds.num_dates() == self.num_dates() => {
                Some(ds)
            }
            Ok(ds) => {
                let reason = format!(
                    "shape {}x{} does not match calendar {}x{}",
                    ds.num_dates(),
                    ds.num_symbols(),
                    self.num_dates(),
                    self.num_symbols()
                );
                self.warn_once(name, &reason);
                None
            }
            Err(e) => {
                self.warn_once(name, &e.to_string());
                None
            }
        }
    }

    fn warn_once(&mut self, dataset: &str, reason: &str) {
        if self.warned.insert(dataset.to_string()) {
            warn!(alpha = %self.name, dataset, reason, "dataset unavailable, treating as missing");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
