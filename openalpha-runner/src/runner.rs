//! Simulation runner — wires configuration, alpha construction, the driver
//! and report writing.
//!
//! Two entry points:
//! - `run_from_config()`: opens the Parquet store named by the config. Used by CLI.
//! - `run_simulation()`: takes an already-built data provider. Used by tests
//!   and in-memory runs.
//!
//! An alpha that fails to build is logged and skipped; the run continues with
//! the rest.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use openalpha_core::data::{DataProvider, ParquetStore};
use openalpha_core::generator::GENERATOR_KEY;
use openalpha_core::{create_generator, Alpha, AlphaError, GenerateError, ParamMap};
use thiserror::Error;
use tracing::{error, info};

use crate::config::{ConfigError, SimulationConfig};
use crate::driver::Simulation;
use crate::report::{write_alpha_report, WrittenReport};

/// Errors that stop a single alpha from being built.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("alpha '{0}' has no 'generator' option")]
    MissingGenerator(String),

    #[error("alpha '{name}': {source}")]
    Generator {
        name: String,
        #[source]
        source: GenerateError,
    },

    #[error("alpha '{name}': {source}")]
    Alpha {
        name: String,
        #[source]
        source: AlphaError,
    },
}

/// Result of a completed run.
#[derive(Debug)]
pub struct RunOutcome {
    pub reports: Vec<WrittenReport>,
    /// Alphas that failed to build, with the reason.
    pub skipped: Vec<(String, String)>,
}

/// Create the named generator and initialize the alpha.
pub fn build_alpha(
    name: &str,
    params: ParamMap,
    data: Arc<dyn DataProvider>,
) -> Result<Alpha, RunError> {
    let generator_name = params
        .get(GENERATOR_KEY)
        .ok_or_else(|| RunError::MissingGenerator(name.to_string()))?;
    let generator =
        create_generator(generator_name, &params).map_err(|source| RunError::Generator {
            name: name.to_string(),
            source,
        })?;
    Alpha::initialize(name, params, data, generator).map_err(|source| RunError::Alpha {
        name: name.to_string(),
        source,
    })
}

/// Build every configured alpha against `data`, run them and write reports
/// under `config.store_path`.
pub fn run_simulation(config: &SimulationConfig, data: Arc<dyn DataProvider>) -> Result<RunOutcome> {
    let mut simulation = Simulation::new(data.as_ref())
        .context("failed to open simulation calendar")?
        .with_mode(config.execution_mode());

    let mut skipped = Vec::new();
    for name in config.alphas.keys() {
        let built = config
            .alpha_params(name)
            .map_err(RunError::from)
            .and_then(|params| build_alpha(name, params, data.clone()));
        let added = built.map_err(|e| e.to_string()).and_then(|alpha| {
            simulation.add_alpha(alpha).map_err(|e| e.to_string())
        });
        if let Err(reason) = added {
            error!(alpha = %name, %reason, "alpha skipped");
            skipped.push((name.clone(), reason));
        }
    }
    if simulation.is_empty() {
        bail!(
            "no alpha could be initialized ({} configured, {} failed)",
            config.alphas.len(),
            skipped.len()
        );
    }

    simulation.run()?;

    let reports = simulation
        .alphas()
        .map(|alpha| write_alpha_report(alpha, &config.store_path))
        .collect::<Result<Vec<_>>>()?;
    info!(
        written = reports.len(),
        skipped = skipped.len(),
        store = %config.store_path.display(),
        "run complete"
    );
    Ok(RunOutcome { reports, skipped })
}

/// Open the Parquet store at `config.cache_dir` and run.
pub fn run_from_config(config: &SimulationConfig) -> Result<RunOutcome> {
    let store = ParquetStore::new(&config.cache_dir);
    run_simulation(config, Arc::new(store))
}
