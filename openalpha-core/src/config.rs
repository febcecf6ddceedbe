//! Alpha configuration parsed from a flat string-keyed option map.
//!
//! Recognized keys: `delay`, `decay`, `universe`, `lookback_days`, `book_size`,
//! `max_stock_weight`, `neutralization`. Anything else is ignored here; the
//! runner reads generator options from the same map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::data::{INDUSTRY, SECTOR, SUBINDUSTRY};

/// Flat per-alpha option map.
pub type ParamMap = BTreeMap<String, String>;

/// Errors from parsing an alpha's options. All are fatal for that alpha.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("option '{key}' = '{value}': {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error("unknown neutralization '{0}' (expected market, sector, industry or subindustry)")]
    UnknownNeutralization(String),
}

/// Which groups positions are demeaned within.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Neutralization {
    /// One group containing every eligible symbol.
    #[default]
    Market,
    Sector,
    Industry,
    SubIndustry,
}

impl Neutralization {
    /// Name of the integer panel holding group ids; `None` for Market.
    pub fn group_dataset(self) -> Option<&'static str> {
        match self {
            Self::Market => None,
            Self::Sector => Some(SECTOR),
            Self::Industry => Some(INDUSTRY),
            Self::SubIndustry => Some(SUBINDUSTRY),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Sector => "sector",
            Self::Industry => "industry",
            Self::SubIndustry => "subindustry",
        }
    }
}

impl fmt::Display for Neutralization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Neutralization {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market" => Ok(Self::Market),
            "sector" => Ok(Self::Sector),
            "industry" => Ok(Self::Industry),
            "subindustry" | "sub_industry" => Ok(Self::SubIndustry),
            other => Err(ConfigError::UnknownNeutralization(other.to_string())),
        }
    }
}

/// Resolved configuration for one alpha.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaConfig {
    /// Lag, in dates, applied to every auxiliary data lookup.
    pub delay: usize,
    /// Length of the trailing smoothing window (1 = no smoothing).
    pub decay: usize,
    /// Maximum tradable symbols per date.
    pub universe_size: usize,
    /// Dates of warm-up before trading, on top of `delay`.
    pub lookback_days: usize,
    /// Target gross exposure.
    pub book_size: f64,
    /// Cap on any single position as a fraction of gross exposure; `<= 0` disables.
    pub max_stock_weight: f64,
    pub neutralization: Neutralization,
}

impl Default for AlphaConfig {
    fn default() -> Self {
        Self {
            delay: 1,
            decay: 1,
            universe_size: 3000,
            lookback_days: 0,
            book_size: 20_000_000.0,
            max_stock_weight: 0.0,
            neutralization: Neutralization::Market,
        }
    }
}

impl AlphaConfig {
    /// Parse recognized keys from `params`, falling back to defaults for absent keys.
    pub fn from_params(params: &ParamMap) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            delay: parse_usize(params, "delay", defaults.delay)?,
            decay: parse_usize(params, "decay", defaults.decay)?,
            universe_size: parse_usize(params, "universe", defaults.universe_size)?,
            lookback_days: parse_usize(params, "lookback_days", defaults.lookback_days)?,
            book_size: parse_f64(params, "book_size", defaults.book_size)?,
            max_stock_weight: parse_f64(params, "max_stock_weight", defaults.max_stock_weight)?,
            neutralization: match params.get("neutralization") {
                Some(v) => v.parse()?,
                None => defaults.neutralization,
            },
        };
        config.validate(params)?;
        Ok(config)
    }

    fn validate(&self, params: &ParamMap) -> Result<(), ConfigError> {
        let invalid = |key: &str, reason: &str| ConfigError::Invalid {
            key: key.to_string(),
            value: params.get(key).cloned().unwrap_or_default(),
            reason: reason.to_string(),
        };
        if self.decay < 1 {
            return Err(invalid("decay", "must be at least 1"));
        }
        if self.book_size <= 0.0 {
            return Err(invalid("book_size", "must be positive"));
        }
        Ok(())
    }

    /// First date index an alpha with this config may trade.
    pub fn warmup_dates(&self) -> usize {
        self.lookback_days + self.delay
    }

    /// Whether capping is active.
    pub fn caps_positions(&self) -> bool {
        self.max_stock_weight > 0.0
    }
}

impl fmt::Display for AlphaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "delay={} decay={} universe={} lookback_days={} book_size={} max_stock_weight={} neutralization={}",
            self.delay,
            self.decay,
            self.universe_size,
            self.lookback_days,
            self.book_size,
            self.max_stock_weight,
            self.neutralization
        )
    }
}

fn parse_usize(params: &ParamMap, key: &str, default: usize) -> Result<usize, ConfigError> {
    match params.get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<usize>().map_err(|e| ConfigError::Invalid {
            key: key.to_string(),
            value: raw.clone(),
            reason: format!("expected a non-negative integer ({e})"),
        }),
    }
}

fn parse_f64(params: &ParamMap, key: &str, default: f64) -> Result<f64, ConfigError> {
    match params.get(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            Ok(_) => Err(ConfigError::Invalid {
                key: key.to_string(),
                value: raw.clone(),
                reason: "must be finite".into(),
            }),
            Err(e) => Err(ConfigError::Invalid {
                key: key.to_string(),
                value: raw.clone(),
                reason: format!("expected a number ({e})"),
            }),
        },
    }
}
