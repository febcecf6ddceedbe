//! Performance metrics — pure functions over an alpha's daily series.
//!
//! Returns are fractions of a fixed book, so the PnL curve is additive: the
//! cumulative return is the plain sum and drawdowns are measured on it.

use serde::{Deserialize, Serialize};

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Aggregate statistics for one alpha's simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfSummary {
    /// Dates with a recorded return.
    pub trading_days: usize,
    pub cumulative_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe: f64,
    pub mean_turnover: f64,
    /// Largest peak-to-trough fall of the cumulative return (≤ 0).
    pub max_drawdown: f64,
}

impl PerfSummary {
    /// Compute all metrics from the scored dates' returns and turnovers.
    /// Non-finite entries are ignored.
    pub fn compute(returns: &[f64], turnover: &[f64]) -> Self {
        let returns: Vec<f64> = returns.iter().copied().filter(|r| r.is_finite()).collect();
        let turnover: Vec<f64> = turnover.iter().copied().filter(|t| t.is_finite()).collect();
        Self {
            trading_days: returns.len(),
            cumulative_return: returns.iter().sum(),
            annualized_return: mean_f64(&returns) * TRADING_DAYS_PER_YEAR,
            annualized_volatility: std_dev(&returns) * TRADING_DAYS_PER_YEAR.sqrt(),
            sharpe: sharpe_ratio(&returns),
            mean_turnover: mean_f64(&turnover),
            max_drawdown: max_drawdown(&returns),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Annualized Sharpe ratio of daily returns (zero risk-free rate).
///
/// Returns 0.0 if variance is zero or there are fewer than 2 dates.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(returns) / std * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Maximum drawdown of the cumulative return curve, starting from zero.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut cumulative = 0.0;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for r in returns {
        cumulative += r;
        peak = peak.max(cumulative);
        max_dd = max_dd.min(cumulative - peak);
    }
    max_dd
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
