//! Stochastic edits of the coefficient matrix.

use crate::config::{CoefficientMatrix, CoefficientRanges, EvolveSettings, Param};
use rand::Rng;

/// Drifts every coefficient with probability `settings.chance / 100`.
///
/// A drifting coefficient moves by `uniform(-1, 1) * span * amount / 100`,
/// where `span` is the width of its declared range, and is then clamped
/// back into that range. Each coefficient draws independently.
///
/// ### Returns
/// The number of coefficients that drifted. Always `0` when
/// `settings.enabled` is `false`.
pub fn evolve(
    matrix: &mut CoefficientMatrix,
    ranges: &CoefficientRanges,
    settings: &EvolveSettings,
    rng: &mut impl Rng,
) -> usize {
    if !settings.enabled {
        return 0;
    }
    let chance = (settings.chance / 100.0).clamp(0.0, 1.0);
    let amount = settings.amount / 100.0;
    if chance == 0.0 || amount == 0.0 {
        return 0;
    }

    let mut drifted = 0;
    for coef in matrix.cells_mut() {
        for param in Param::ALL {
            if rng.random::<f32>() >= chance {
                continue;
            }
            let range = ranges.range(param);
            let value = coef.get_mut(param);
            *value = range.clamp(*value + rng.random_range(-1.0f32..=1.0) * range.span() * amount);
            drifted += 1;
        }
    }
    drifted
}

/// Draws strength, radius and viscosity of every pair uniformly from their
/// declared ranges.
///
/// Probability is left alone; it is a per-variant gate, not part of the
/// random pattern.
pub fn randomize(matrix: &mut CoefficientMatrix, ranges: &CoefficientRanges, rng: &mut impl Rng) {
    for coef in matrix.cells_mut() {
        for param in [Param::Strength, Param::Radius, Param::Viscosity] {
            *coef.get_mut(param) = ranges.range(param).sample(rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PairCoefficients;
    use rand::{SeedableRng, rngs::StdRng};

    fn enabled(chance: f32, amount: f32) -> EvolveSettings {
        EvolveSettings {
            enabled: true,
            chance,
            amount,
        }
    }

    #[test]
    fn disabled_or_zero_chance_changes_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        let ranges = CoefficientRanges::classic();
        let mut m = CoefficientMatrix::new(3);
        let before = m.clone();

        let off = EvolveSettings {
            enabled: false,
            ..enabled(100.0, 50.0)
        };
        assert_eq!(evolve(&mut m, &ranges, &off, &mut rng), 0);
        assert_eq!(evolve(&mut m, &ranges, &enabled(0.0, 50.0), &mut rng), 0);
        assert_eq!(m, before);
    }

    #[test]
    fn certain_chance_drifts_every_coefficient_within_bounds() {
        let mut rng = StdRng::seed_from_u64(2);
        let ranges = CoefficientRanges::classic();
        let mut m = CoefficientMatrix::new(4);
        // Park one cell on its limits so clamping has to kick in.
        m.set(1, 2, PairCoefficients::new(100.0, 0.0, 1.0, 100.0));

        for _ in 0..200 {
            assert_eq!(evolve(&mut m, &ranges, &enabled(100.0, 25.0), &mut rng), 4 * 4 * 4);
        }

        for coef in m.cells() {
            for param in Param::ALL {
                let r = ranges.range(param);
                let v = coef.get(param);
                assert!(v >= r.min && v <= r.max, "{} = {v} escaped {r:?}", param.name());
            }
        }
    }

    #[test]
    fn drift_is_bounded_by_amount() {
        let mut rng = StdRng::seed_from_u64(3);
        let ranges = CoefficientRanges::classic();
        let mut m = CoefficientMatrix::new(2);
        let before = m.clone();

        evolve(&mut m, &ranges, &enabled(100.0, 1.0), &mut rng);

        for (a, b) in before.cells().iter().zip(m.cells()) {
            // One percent of a 200 wide range.
            assert!((a.strength - b.strength).abs() <= 2.0 + 1e-4);
            assert!((a.viscosity - b.viscosity).abs() <= 0.01 + 1e-6);
        }
    }

    #[test]
    fn randomize_stays_in_range_and_keeps_probability() {
        let mut rng = StdRng::seed_from_u64(4);
        let ranges = CoefficientRanges::wide();
        let mut m = CoefficientMatrix::new(5);
        m.get_mut(0, 0).probability = 37.0;

        randomize(&mut m, &ranges, &mut rng);

        assert_eq!(m.get(0, 0).probability, 37.0);
        assert!(m.cells().iter().any(|c| c.strength.abs() > 100.0));
        for c in m.cells() {
            assert!((-200.0..=200.0).contains(&c.strength));
            assert!((0.0..=500.0).contains(&c.radius));
            assert!((0.0..=1.0).contains(&c.viscosity));
        }
    }
}
