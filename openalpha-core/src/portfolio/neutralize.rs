//! Group neutralization with iterative single-name exposure capping.

use std::collections::BTreeMap;

/// Maximum number of clamp passes per date.
pub const MAX_CAP_PASSES: usize = 10;

/// A position breaches the cap only when it exceeds it by more than this factor.
pub const BREACH_TOLERANCE: f64 = 1.01;

/// Group id used for Market neutralization.
pub const MARKET_GROUP: i64 = 0;

/// Group id → member symbol indices.
pub type Groups = BTreeMap<i64, Vec<usize>>;

/// How symbols are bucketed on a given date.
#[derive(Debug, Clone, Copy)]
pub enum Grouping<'a> {
    /// Every eligible symbol in one group.
    Market,
    /// Per-symbol group ids. Missing or non-positive ids are unclassified.
    ById(&'a [Option<i64>]),
    /// Group ids were required but are not available for the date.
    Unavailable,
}

/// Outcome of neutralizing one date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neutralized {
    /// `Σ|position|` after the final demeaning pass.
    pub gross_exposure: f64,
    /// Number of clamp passes applied.
    pub clamp_passes: usize,
}

/// Bucket symbols with a finite value into groups.
///
/// Non-finite and unclassified symbols are set to NaN so they carry no
/// position for the date.
pub fn build_groups(positions: &mut [f64], grouping: Grouping<'_>) -> Groups {
    let mut groups = Groups::new();
    for (i, pos) in positions.iter_mut().enumerate() {
        if !pos.is_finite() {
            *pos = f64::NAN;
            continue;
        }
        let id = match grouping {
            Grouping::Market => Some(MARKET_GROUP),
            Grouping::ById(ids) => ids.get(i).copied().flatten().filter(|&g| g > 0),
            Grouping::Unavailable => None,
        };
        match id {
            Some(g) => groups.entry(g).or_default().push(i),
            None => *pos = f64::NAN,
        }
    }
    groups
}

/// Subtract each group's mean from its members. Returns gross exposure.
pub fn demean_groups(positions: &mut [f64], groups: &Groups) -> f64 {
    let mut gross = 0.0;
    for members in groups.values() {
        let mean = members.iter().map(|&i| positions[i]).sum::<f64>() / members.len() as f64;
        for &i in members {
            positions[i] -= mean;
            gross += positions[i].abs();
        }
    }
    gross
}

/// Clamp every finite position to `±cap` if any exceeds `cap * BREACH_TOLERANCE`.
///
/// Returns whether a breach was found (and clamping applied).
pub fn clamp_to_cap(positions: &mut [f64], cap: f64) -> bool {
    let threshold = cap * BREACH_TOLERANCE;
    let breach = positions
        .iter()
        .any(|v| !v.is_nan() && v.abs() > threshold);
    if !breach {
        return false;
    }
    for v in positions.iter_mut() {
        if !v.is_nan() && v.abs() > cap {
            *v = cap.copysign(*v);
        }
    }
    true
}

/// Demean within groups, then clamp and re-demean until no position breaches
/// `max_stock_weight × gross` or the pass budget runs out.
///
/// Singleton groups cannot be neutralized: their member is set to NaN and the
/// group dropped. Capping is skipped when `max_stock_weight <= 0`. A zero gross
/// exposure stops immediately.
pub fn neutralize(positions: &mut [f64], groups: &mut Groups, max_stock_weight: f64) -> Neutralized {
    groups.retain(|_, members| {
        if members.len() == 1 {
            positions[members[0]] = f64::NAN;
            false
        } else {
            true
        }
    });

    let mut gross = 0.0;
    let mut clamp_passes = 0;
    for pass in 0..=MAX_CAP_PASSES {
        gross = demean_groups(positions, groups);
        if gross == 0.0 || max_stock_weight <= 0.0 || pass == MAX_CAP_PASSES {
            break;
        }
        if !clamp_to_cap(positions, max_stock_weight * gross) {
            break;
        }
        clamp_passes += 1;
    }

    Neutralized {
        gross_exposure: gross,
        clamp_passes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_group_demeans_to_zero() {
        let mut positions = vec![1.0, -1.0, 2.0];
        let mut groups = build_groups(&mut positions, Grouping::Market);
        let out = neutralize(&mut positions, &mut groups, 0.0);

        let expected = [1.0 / 3.0, -5.0 / 3.0, 4.0 / 3.0];
        for (p, e) in positions.iter().zip(expected) {
            assert!((p - e).abs() < 1e-12);
        }
        assert!((out.gross_exposure - 10.0 / 3.0).abs() < 1e-12);
        assert_eq!(out.clamp_passes, 0);
    }

    #[test]
    fn singleton_group_becomes_nan() {
        let ids = [Some(1), Some(1), Some(2)];
        let mut positions = vec![3.0, 1.0, 5.0];
        let mut groups = build_groups(&mut positions, Grouping::ById(&ids));
        neutralize(&mut positions, &mut groups, 0.0);

        assert_eq!(positions[0], 1.0);
        assert_eq!(positions[1], -1.0);
        assert!(positions[2].is_nan());
    }

    #[test]
    fn unclassified_symbols_are_excluded() {
        let ids = [Some(4), None, Some(4), Some(0)];
        let mut positions = vec![2.0, 7.0, 0.0, 9.0];
        let groups = build_groups(&mut positions, Grouping::ById(&ids));

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[&4], vec![0, 2]);
        assert!(positions[1].is_nan());
        assert!(positions[3].is_nan());
    }

    #[test]
    fn unavailable_grouping_yields_zero_gross() {
        let mut positions = vec![1.0, 2.0];
        let mut groups = build_groups(&mut positions, Grouping::Unavailable);
        let out = neutralize(&mut positions, &mut groups, 0.1);
        assert_eq!(out.gross_exposure, 0.0);
        assert!(positions.iter().all(|p| p.is_nan()));
    }

    #[test]
    fn identical_values_have_zero_gross() {
        let mut positions = vec![2.0, 2.0, 2.0];
        let mut groups = build_groups(&mut positions, Grouping::Market);
        let out = neutralize(&mut positions, &mut groups, 0.5);
        assert_eq!(out.gross_exposure, 0.0);
        assert_eq!(out.clamp_passes, 0);
    }

    #[test]
    fn capping_bounds_single_names() {
        let mut positions = vec![10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -1.0];
        let mut groups = build_groups(&mut positions, Grouping::Market);
        let out = neutralize(&mut positions, &mut groups, 0.2);

        assert!(out.clamp_passes >= 1);
        if out.clamp_passes < MAX_CAP_PASSES {
            let limit = 0.2 * out.gross_exposure * BREACH_TOLERANCE;
            assert!(positions.iter().all(|p| p.abs() <= limit + 1e-12));
        }
        let sum: f64 = positions.iter().sum();
        assert!(sum.abs() < 1e-9);
    }

    #[test]
    fn clamp_preserves_sign() {
        let mut positions = vec![5.0, -5.0, 0.5, f64::NAN];
        assert!(clamp_to_cap(&mut positions, 1.0));
        assert_eq!(positions[0], 1.0);
        assert_eq!(positions[1], -1.0);
        assert_eq!(positions[2], 0.5);
        assert!(positions[3].is_nan());
    }

    #[test]
    fn clamp_ignores_marginal_excess() {
        let mut positions = vec![1.005, -1.0];
        assert!(!clamp_to_cap(&mut positions, 1.0));
        assert_eq!(positions[0], 1.005);
    }
}
