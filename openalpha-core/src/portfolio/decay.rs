//! Linear-decay smoothing over a trailing window of signal rows.

use crate::grid::SignalGrid;

/// Weighted average of `symbol`'s raw values over the `decay` dates ending at `date`.
///
/// Offset `j` back (0 = `date`) carries weight `decay - j`. Dates before the
/// start of history and NaN entries are skipped, and the sum is divided by the
/// weight actually accumulated, so gaps do not pull the result toward zero.
/// Returns NaN when every entry in the window is missing.
pub fn decayed_value(grid: &SignalGrid, date: usize, symbol: usize, decay: usize) -> f64 {
    let mut sum = 0.0;
    let mut weight = 0.0;
    for j in 0..decay.min(date + 1) {
        let v = grid.value(date - j, symbol);
        if v.is_nan() {
            continue;
        }
        let w = (decay - j) as f64;
        sum += v * w;
        weight += w;
    }
    if weight == 0.0 {
        f64::NAN
    } else {
        sum / weight
    }
}
