//! Simulation file: store locations, execution mode and per-alpha option tables.
//!
//! ```toml
//! cache_dir = "data"
//! store_path = "alphas"
//! parallel = true
//! threads = 0
//!
//! [alphas.rev5]
//! generator = "reversal"
//! window = 5
//! decay = 4
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use openalpha_core::ParamMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::driver::ExecutionMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid simulation file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("alpha '{alpha}': option '{key}' must be a string, number or boolean")]
    UnsupportedValue { alpha: String, key: String },

    #[error("no alpha named '{0}'")]
    UnknownAlpha(String),
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_store_path() -> PathBuf {
    PathBuf::from("alphas")
}

/// Parsed simulation file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Parquet store with the calendar and panels.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Root directory for per-alpha reports.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    #[serde(default)]
    pub parallel: bool,

    /// Worker threads in parallel mode; 0 lets rayon decide.
    #[serde(default)]
    pub threads: usize,

    /// Alpha name → raw option table.
    #[serde(default)]
    pub alphas: BTreeMap<String, toml::Table>,
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        if self.parallel {
            ExecutionMode::Parallel {
                threads: self.threads,
            }
        } else {
            ExecutionMode::Sequential
        }
    }

    /// Flatten one alpha's table into string options.
    pub fn alpha_params(&self, alpha: &str) -> Result<ParamMap, ConfigError> {
        let table = self
            .alphas
            .get(alpha)
            .ok_or_else(|| ConfigError::UnknownAlpha(alpha.to_string()))?;
        table
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    toml::Value::String(s) => s.clone(),
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    toml::Value::Boolean(b) => b.to_string(),
                    _ => {
                        return Err(ConfigError::UnsupportedValue {
                            alpha: alpha.to_string(),
                            key: key.clone(),
                        })
                    }
                };
                Ok((key.clone(), text))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
cache_dir = "store"
parallel = true
threads = 4

[alphas.rev5]
generator = "reversal"
window = 5
book_size = 1e6
max_stock_weight = 0.05
neutralization = "sector"

[alphas.flat]
generator = "constant"
"#;

    #[test]
    fn parses_sample() {
        let config = SimulationConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.cache_dir, PathBuf::from("store"));
        assert_eq!(config.store_path, PathBuf::from("alphas"));
        assert_eq!(config.execution_mode(), ExecutionMode::Parallel { threads: 4 });
        assert_eq!(config.alphas.len(), 2);
    }

    #[test]
    fn scalars_are_stringified() {
        let config = SimulationConfig::from_toml(SAMPLE).unwrap();
        let params = config.alpha_params("rev5").unwrap();
        assert_eq!(params["generator"], "reversal");
        assert_eq!(params["window"], "5");
        assert_eq!(params["book_size"], "1000000");
        assert_eq!(params["max_stock_weight"], "0.05");

        let core = openalpha_core::AlphaConfig::from_params(&params).unwrap();
        assert_eq!(core.book_size, 1e6);
    }

    #[test]
    fn defaults_apply() {
        let config = SimulationConfig::from_toml("").unwrap();
        assert_eq!(config.execution_mode(), ExecutionMode::Sequential);
        assert!(config.alphas.is_empty());
    }

    #[test]
    fn arrays_are_rejected() {
        let config = SimulationConfig::from_toml("[alphas.a]\nwindow = [1, 2]\n").unwrap();
        assert!(matches!(
            config.alpha_params("a"),
            Err(ConfigError::UnsupportedValue { .. })
        ));
    }

    #[test]
    fn from_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = SimulationConfig::from_file(&path).unwrap();
        assert_eq!(config.alpha_params("flat").unwrap()["generator"], "constant");
        assert!(SimulationConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
