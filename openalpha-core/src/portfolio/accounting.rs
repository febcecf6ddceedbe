//! Book scaling and daily return/turnover accounting.

/// Scale neutralized weights so their absolute values sum to `book_size`,
/// rounding each position to whole currency units. NaN entries stay NaN.
pub fn scale_to_book(positions: &mut [f64], gross_exposure: f64, book_size: f64) {
    for v in positions.iter_mut().filter(|v| !v.is_nan()) {
        *v = (*v / gross_exposure * book_size).round();
    }
}

/// One-date return of `positions` held over the close-to-close move.
///
/// Only finite positions with a finite price ratio contribute. Without both
/// close rows the return is NaN and the date goes unscored.
pub fn daily_return(
    positions: &[f64],
    close: Option<&[f64]>,
    close_prev: Option<&[f64]>,
    book_size: f64,
) -> f64 {
    let (Some(close), Some(close_prev)) = (close, close_prev) else {
        return f64::NAN;
    };
    let pnl: f64 = positions
        .iter()
        .zip(close.iter().zip(close_prev))
        .filter(|(p, _)| p.is_finite())
        .filter_map(|(p, (c, c_prev))| {
            let move_ = c / c_prev - 1.0;
            move_.is_finite().then_some(p * move_)
        })
        .sum();
    pnl / book_size
}

/// One-sided turnover: half the traded notional as a fraction of book.
///
/// Missing positions on either side count as flat.
pub fn turnover(positions: &[f64], prev_positions: &[f64], book_size: f64) -> f64 {
    let flat = |v: f64| if v.is_nan() { 0.0 } else { v };
    let traded: f64 = positions
        .iter()
        .zip(prev_positions)
        .map(|(&a, &b)| (flat(a) - flat(b)).abs())
        .sum();
    traded / book_size / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaling_matches_worked_example() {
        let mut positions = vec![1.0 / 3.0, -5.0 / 3.0, 4.0 / 3.0];
        scale_to_book(&mut positions, 10.0 / 3.0, 1000.0);
        assert_eq!(positions, vec![100.0, -500.0, 400.0]);
    }

    #[test]
    fn scaling_leaves_nan() {
        let mut positions = vec![1.0, f64::NAN, -1.0];
        scale_to_book(&mut positions, 2.0, 10.0);
        assert_eq!(positions[0], 5.0);
        assert!(positions[1].is_nan());
        assert_eq!(positions[2], -5.0);
    }

    #[test]
    fn return_skips_missing_prices() {
        let positions = [100.0, -100.0, f64::NAN];
        let close = [11.0, f64::NAN, 5.0];
        let prev = [10.0, 20.0, 4.0];
        let r = daily_return(&positions, Some(&close), Some(&prev), 1000.0);
        assert!((r - 0.01).abs() < 1e-12);
    }

    #[test]
    fn return_without_prices_is_nan() {
        assert!(daily_return(&[100.0], None, Some(&[1.0]), 100.0).is_nan());
        assert!(daily_return(&[100.0], Some(&[1.0]), None, 100.0).is_nan());
    }

    #[test]
    fn flat_book_with_prices_returns_zero() {
        let r = daily_return(&[f64::NAN, f64::NAN], Some(&[2.0, 3.0]), Some(&[1.0, 1.0]), 10.0);
        assert_eq!(r, 0.0);
    }

    #[test]
    fn turnover_treats_nan_as_flat() {
        let now = [100.0, f64::NAN, -50.0];
        let prev = [f64::NAN, 40.0, -50.0];
        assert!((turnover(&now, &prev, 100.0) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn unchanged_book_has_zero_turnover() {
        let book = [10.0, -10.0];
        assert_eq!(turnover(&book, &book, 20.0), 0.0);
    }
}
