//! Simulation driver: steps every registered alpha through the calendar.
//!
//! Sequential mode is date-major (every alpha finishes date `d` before any
//! starts `d + 1`). Parallel mode gives each alpha its own rayon task that
//! walks all dates in order; alphas share nothing mutable, so both modes
//! produce identical series.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use openalpha_core::data::{Calendar, DataError, DataProvider};
use openalpha_core::Alpha;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::report::PerfReport;

/// How alphas are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    #[default]
    Sequential,
    /// One task per alpha on a private pool; `threads == 0` uses rayon's default.
    Parallel { threads: usize },
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("calendar unavailable: {0}")]
    Calendar(#[from] DataError),

    #[error("alpha '{0}' is already registered")]
    DuplicateAlpha(String),

    #[error(
        "alpha '{name}' is {dates}x{symbols} but the simulation calendar is {expected_dates}x{expected_symbols}"
    )]
    ShapeMismatch {
        name: String,
        dates: usize,
        symbols: usize,
        expected_dates: usize,
        expected_symbols: usize,
    },

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A set of alphas sharing one calendar.
#[derive(Debug)]
pub struct Simulation {
    calendar: Arc<Calendar>,
    alphas: BTreeMap<String, Alpha>,
    mode: ExecutionMode,
}

impl Simulation {
    pub fn new(data: &dyn DataProvider) -> Result<Self, SimulationError> {
        Ok(Self {
            calendar: data.calendar()?,
            alphas: BTreeMap::new(),
            mode: ExecutionMode::default(),
        })
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Register an alpha. Names must be unique and the shape must match the calendar.
    pub fn add_alpha(&mut self, alpha: Alpha) -> Result<(), SimulationError> {
        let (nd, ns) = (self.calendar.num_dates(), self.calendar.num_symbols());
        if alpha.num_dates() != nd || alpha.num_symbols() != ns {
            return Err(SimulationError::ShapeMismatch {
                name: alpha.name().to_string(),
                dates: alpha.num_dates(),
                symbols: alpha.num_symbols(),
                expected_dates: nd,
                expected_symbols: ns,
            });
        }
        if self.alphas.contains_key(alpha.name()) {
            return Err(SimulationError::DuplicateAlpha(alpha.name().to_string()));
        }
        self.alphas.insert(alpha.name().to_string(), alpha);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.alphas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alphas.is_empty()
    }

    pub fn alpha(&self, name: &str) -> Option<&Alpha> {
        self.alphas.get(name)
    }

    /// Alphas in name order.
    pub fn alphas(&self) -> impl Iterator<Item = &Alpha> {
        self.alphas.values()
    }

    /// Step every alpha through dates `1..num_dates`.
    pub fn run(&mut self) -> Result<(), SimulationError> {
        let nd = self.calendar.num_dates();
        info!(
            alphas = self.alphas.len(),
            dates = nd,
            symbols = self.calendar.num_symbols(),
            mode = ?self.mode,
            "simulation started"
        );
        let start = Instant::now();

        match self.mode {
            ExecutionMode::Sequential => {
                for date in 1..nd {
                    for alpha in self.alphas.values_mut() {
                        alpha.step(date);
                    }
                    debug!(date, "date complete");
                }
            }
            ExecutionMode::Parallel { threads } => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?;
                pool.install(|| {
                    self.alphas.par_iter_mut().for_each(|(_, alpha)| {
                        for date in 1..nd {
                            alpha.step(date);
                        }
                    });
                });
            }
        }

        info!(
            alphas = self.alphas.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "simulation finished"
        );
        Ok(())
    }

    /// One report per alpha, in name order.
    pub fn reports(&self) -> Vec<PerfReport> {
        self.alphas.values().map(PerfReport::from_alpha).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openalpha_core::data::{generate_market, MemoryProvider, SyntheticConfig};
    use openalpha_core::generator::Constant;
    use openalpha_core::ParamMap;

    fn provider(num_dates: usize, num_symbols: usize) -> Arc<dyn DataProvider> {
        let market = generate_market(&SyntheticConfig {
            num_dates,
            num_symbols,
            ..SyntheticConfig::default()
        })
        .unwrap();
        Arc::new(market.into_provider())
    }

    fn constant_alpha(name: &str, data: Arc<dyn DataProvider>) -> Alpha {
        Alpha::initialize(name, ParamMap::new(), data, Box::new(Constant::new(1.0))).unwrap()
    }

    #[test]
    fn rejects_duplicate_names() {
        let data = provider(5, 4);
        let mut sim = Simulation::new(data.as_ref()).unwrap();
        sim.add_alpha(constant_alpha("a", data.clone())).unwrap();
        let err = sim.add_alpha(constant_alpha("a", data)).unwrap_err();
        assert!(matches!(err, SimulationError::DuplicateAlpha(ref n) if n == "a"));
        assert_eq!(sim.len(), 1);
    }

    #[test]
    fn rejects_shape_mismatch() {
        let data = provider(5, 4);
        let mut sim = Simulation::new(data.as_ref()).unwrap();
        let err = sim
            .add_alpha(constant_alpha("other", provider(6, 4)))
            .unwrap_err();
        assert!(matches!(err, SimulationError::ShapeMismatch { dates: 6, .. }));
        assert!(sim.is_empty());
    }

    #[test]
    fn missing_calendar_fails() {
        let err = Simulation::new(&MemoryProvider::without_calendar()).unwrap_err();
        assert!(matches!(err, SimulationError::Calendar(_)));
    }

    #[test]
    fn alphas_iterate_in_name_order() {
        let data = provider(5, 4);
        let mut sim = Simulation::new(data.as_ref()).unwrap();
        for name in ["zeta", "alpha", "mid"] {
            sim.add_alpha(constant_alpha(name, data.clone())).unwrap();
        }
        let names: Vec<&str> = sim.alphas().map(Alpha::name).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }
}
