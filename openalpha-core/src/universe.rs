//! Tradable-universe selection by lagged liquidity rank.

/// Mark the `universe_size` most liquid symbols in `mask`.
///
/// Symbols with a missing (non-finite) liquidity value are never selected, so
/// fewer than `universe_size` symbols are marked when the data is sparse.
/// Ranking is a stable descending sort: equal liquidity keeps ascending symbol
/// order. Entries already true in `mask` are left untouched.
///
/// Returns the number of symbols marked.
pub fn select_universe(liquidity: &[f64], universe_size: usize, mask: &mut [bool]) -> usize {
    debug_assert_eq!(liquidity.len(), mask.len());

    let mut ranked: Vec<usize> = (0..liquidity.len())
        .filter(|&i| liquidity[i].is_finite())
        .collect();
    ranked.sort_by(|&a, &b| liquidity[b].total_cmp(&liquidity[a]));

    let selected = ranked.len().min(universe_size);
    for &i in &ranked[..selected] {
        mask[i] = true;
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_most_liquid() {
        let liquidity = [5.0, 1.0, 9.0, 3.0];
        let mut mask = [false; 4];
        assert_eq!(select_universe(&liquidity, 2, &mut mask), 2);
        assert_eq!(mask, [true, false, true, false]);
    }

    #[test]
    fn missing_values_are_never_selected() {
        let liquidity = [f64::NAN, 2.0, f64::NAN, 1.0];
        let mut mask = [false; 4];
        assert_eq!(select_universe(&liquidity, 10, &mut mask), 2);
        assert_eq!(mask, [false, true, false, true]);
    }

    #[test]
    fn ties_resolve_to_lower_symbol_index() {
        let liquidity = [1.0, 7.0, 7.0, 7.0];
        let mut mask = [false; 4];
        select_universe(&liquidity, 2, &mut mask);
        assert_eq!(mask, [false, true, true, false]);
    }

    #[test]
    fn zero_universe_selects_nothing() {
        let liquidity = [1.0, 2.0];
        let mut mask = [false; 2];
        assert_eq!(select_universe(&liquidity, 0, &mut mask), 0);
        assert_eq!(mask, [false, false]);
    }
}
