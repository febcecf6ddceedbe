//! Built-in generators created by name from an alpha's option map.

use crate::config::ParamMap;

use super::{Constant, GenerateError, Momentum, Reversal, SignalGenerator};

/// Option key naming the generator of an alpha.
pub const GENERATOR_KEY: &str = "generator";

/// Extract a named usize option, falling back to `default` when absent.
pub(crate) fn param_usize(
    params: &ParamMap,
    name: &str,
    default: usize,
) -> Result<usize, GenerateError> {
    match params.get(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| GenerateError::InvalidParam {
            key: name.to_string(),
            value: raw.clone(),
        }),
    }
}

/// Extract a named finite f64 option, falling back to `default` when absent.
pub(crate) fn param_f64(params: &ParamMap, name: &str, default: f64) -> Result<f64, GenerateError> {
    match params.get(name) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(GenerateError::InvalidParam {
                key: name.to_string(),
                value: raw.clone(),
            }),
        },
    }
}

fn require_positive(name: &str, value: usize) -> Result<usize, GenerateError> {
    if value == 0 {
        return Err(GenerateError::InvalidParam {
            key: name.to_string(),
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// Create a generator by name, reading its options from `params`.
pub fn create_generator(
    name: &str,
    params: &ParamMap,
) -> Result<Box<dyn SignalGenerator>, GenerateError> {
    match name {
        "reversal" => {
            let window = require_positive("window", param_usize(params, "window", 5)?)?;
            Ok(Box::new(Reversal::new(window)))
        }
        "momentum" => {
            let window = require_positive("window", param_usize(params, "window", 20)?)?;
            let skip = param_usize(params, "skip", 0)?;
            if skip >= window {
                return Err(GenerateError::InvalidParam {
                    key: "skip".into(),
                    value: skip.to_string(),
                });
            }
            Ok(Box::new(Momentum::new(window, skip)))
        }
        "constant" => {
            let value = param_f64(params, "value", 1.0)?;
            Ok(Box::new(Constant::new(value)))
        }
        other => Err(GenerateError::UnknownGenerator(other.to_string())),
    }
}
