//! Pairwise interaction engine.
//!
//! [`InteractionEngine`] applies the coefficients of one ordered
//! `(receiver, source)` pair to the receiver group. It keeps only scratch
//! buffers between calls; coefficients are re-read (and re-sanitized) on
//! every call, so they may change freely between ticks.

use crate::{
    config::{Config, PairCoefficients},
    force_buffer::ForceBuffer,
    particle::Group,
    phases,
    types::GroupId,
};
use rand::Rng;

/// What one pair application did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PairOutcome {
    /// Receiver particles that passed the probability gate.
    pub evaluated: usize,
    /// Source particles found inside the radius, summed over receivers.
    pub neighbour_hits: u64,
}

/// Applies pair coefficients to groups of particles.
///
/// ### Fields
/// - `acc` - Per-receiver force and neighbour count, reused across calls.
/// - `gate` - Per-receiver probability gate of the current call.
#[derive(Debug, Default)]
pub struct InteractionEngine {
    acc: ForceBuffer,
    gate: Vec<bool>,
}

impl InteractionEngine {
    /// Creates an engine with empty scratch buffers.
    ///
    /// Buffers grow to the largest receiver group seen and are kept.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the force `source` exerts on `receiver`.
    ///
    /// `source` is never written. Empty groups make this a no-op.
    pub fn apply(
        &mut self,
        receiver: &mut Group,
        source: &Group,
        coef: PairCoefficients,
        cfg: &Config,
        rng: &mut impl Rng,
    ) -> PairOutcome {
        if receiver.is_empty() || source.is_empty() {
            return PairOutcome::default();
        }
        let coef = sanitize(coef, &receiver.name, &source.name);

        let evaluated = self.accumulate(receiver, source, false, &coef, cfg, rng);
        self.integrate(receiver, evaluated, &coef, cfg)
    }

    /// Applies a group's force on itself.
    ///
    /// Every force is computed from the positions the group had when the
    /// call started, exactly as if `source` were a copy taken beforehand.
    pub fn apply_self(
        &mut self,
        group: &mut Group,
        coef: PairCoefficients,
        cfg: &Config,
        rng: &mut impl Rng,
    ) -> PairOutcome {
        if group.is_empty() {
            return PairOutcome::default();
        }
        let coef = sanitize(coef, &group.name, &group.name);

        let snapshot: &Group = group;
        let evaluated = self.accumulate(snapshot, snapshot, true, &coef, cfg, rng);
        self.integrate(group, evaluated, &coef, cfg)
    }

    /// Applies pair `(receiver, source)` within one slice of groups.
    ///
    /// Dispatches to [`InteractionEngine::apply_self`] when both ids are
    /// equal, otherwise borrows the two groups disjointly.
    ///
    /// ### Panics
    /// Panics if either id is out of range for `groups`.
    pub fn apply_pair(
        &mut self,
        groups: &mut [Group],
        receiver: GroupId,
        source: GroupId,
        coef: PairCoefficients,
        cfg: &Config,
        rng: &mut impl Rng,
    ) -> PairOutcome {
        if receiver == source {
            return self.apply_self(&mut groups[receiver], coef, cfg, rng);
        }

        let (r, s) = if receiver < source {
            let (head, tail) = groups.split_at_mut(source);
            (&mut head[receiver], &tail[0])
        } else {
            let (head, tail) = groups.split_at_mut(receiver);
            (&mut tail[0], &head[source])
        };
        self.apply(r, s, coef, cfg, rng)
    }

    fn accumulate(
        &mut self,
        receiver: &Group,
        source: &Group,
        self_pair: bool,
        coef: &PairCoefficients,
        cfg: &Config,
        rng: &mut impl Rng,
    ) -> usize {
        let evaluated = phases::draw_gate(&mut self.gate, receiver.len(), coef, rng);
        if evaluated > 0 {
            phases::force_phase(
                receiver,
                source,
                self_pair,
                coef,
                cfg.infinite_radius,
                &self.gate,
                &mut self.acc,
            );
        }
        evaluated
    }

    fn integrate(
        &self,
        receiver: &mut Group,
        evaluated: usize,
        coef: &PairCoefficients,
        cfg: &Config,
    ) -> PairOutcome {
        if evaluated == 0 {
            return PairOutcome::default();
        }
        phases::integration_phase(receiver, &self.acc, coef, cfg, &self.gate);

        PairOutcome {
            evaluated,
            neighbour_hits: self.acc.total_count(),
        }
    }
}

fn sanitize(coef: PairCoefficients, receiver: &str, source: &str) -> PairCoefficients {
    if coef.needs_sanitizing() {
        log::warn!("coefficients for ({receiver}, {source}) out of range, clamping: {coef:?}");
    }
    coef.sanitized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{particle::Particle, types::Rgb};
    use glam::Vec2;
    use rand::{SeedableRng, rngs::StdRng};

    fn group(name: &str, positions: Vec<Vec2>) -> Group {
        Group::from_positions(name, Rgb::new(200, 200, 200), positions)
    }

    fn quiet_config() -> Config {
        let mut cfg = Config::default();
        cfg.bounds.wall_repel = 0.0;
        cfg.bounds.gravity = 0.0;
        cfg
    }

    #[test]
    fn attraction_moves_receiver_towards_source() {
        let cfg = quiet_config();
        let mut rng = StdRng::seed_from_u64(0);
        let mut engine = InteractionEngine::new();
        let mut a = group("a", vec![Vec2::new(100.0, 100.0)]);
        let b = group("b", vec![Vec2::new(110.0, 100.0)]);

        let attract = PairCoefficients::new(100.0, 20.0, 0.0, 100.0);
        let out = engine.apply(&mut a, &b, attract, &cfg, &mut rng);

        assert_eq!(out, PairOutcome { evaluated: 1, neighbour_hits: 1 });
        let p = a.particles[0];
        assert!((p.vel - Vec2::new(1.0, 0.0)).length() < 1e-6, "vel = {:?}", p.vel);
        assert!(p.pos.x > 100.0 && p.pos.x < 110.0);
        assert_eq!(p.pos.y, 100.0);
        // The source group is never written.
        assert_eq!(b.particles[0], Particle::at(Vec2::new(110.0, 100.0)));
    }

    #[test]
    fn repulsion_moves_receiver_away_from_source() {
        let cfg = quiet_config();
        let mut rng = StdRng::seed_from_u64(0);
        let mut engine = InteractionEngine::new();
        let mut a = group("a", vec![Vec2::new(100.0, 100.0)]);
        let b = group("b", vec![Vec2::new(110.0, 100.0)]);

        let repel = PairCoefficients::new(-100.0, 20.0, 0.0, 100.0);
        engine.apply(&mut a, &b, repel, &cfg, &mut rng);

        let p = a.particles[0];
        assert!((p.vel - Vec2::new(-1.0, 0.0)).length() < 1e-6, "vel = {:?}", p.vel);
        assert!(p.pos.x < 100.0);
    }

    #[test]
    fn source_outside_radius_contributes_nothing() {
        let cfg = quiet_config();
        let mut rng = StdRng::seed_from_u64(0);
        let mut engine = InteractionEngine::new();
        let mut a = group("a", vec![Vec2::new(100.0, 100.0)]);
        let b = group("b", vec![Vec2::new(110.01, 100.0)]);

        let out = engine.apply(&mut a, &b, PairCoefficients::new(100.0, 10.0, 0.0, 100.0), &cfg, &mut rng);

        assert_eq!(out.neighbour_hits, 0);
        assert_eq!(a.particles[0].vel, Vec2::ZERO);

        let mut cfg = cfg;
        cfg.infinite_radius = true;
        let out = engine.apply(&mut a, &b, PairCoefficients::new(100.0, 10.0, 0.0, 100.0), &cfg, &mut rng);
        assert_eq!(out.neighbour_hits, 1);
        assert!(a.particles[0].vel.x > 0.0);
    }

    #[test]
    fn wall_repulsion_alone_pushes_particle_inward() {
        let mut cfg = quiet_config();
        cfg.bounds.wall_repel = 10.0;
        let mut rng = StdRng::seed_from_u64(0);
        let mut engine = InteractionEngine::new();
        let mut g = group("g", vec![Vec2::new(5.0, 400.0)]);

        engine.apply_self(&mut g, PairCoefficients::new(0.0, 80.0, 0.0, 100.0), &cfg, &mut rng);

        let p = g.particles[0];
        assert!((p.vel.x - 0.5).abs() < 1e-6, "vel = {:?}", p.vel);
        assert_eq!(p.vel.y, 0.0);
        assert!((p.pos.x - 5.5).abs() < 1e-6);
    }

    #[test]
    fn zero_probability_never_changes_receiver() {
        let mut cfg = Config::default();
        cfg.bounds.gravity = 1.0;
        cfg.bounds.wall_repel = 50.0;
        let mut rng = StdRng::seed_from_u64(3);
        let mut engine = InteractionEngine::new();
        let mut a = Group::random_in_bounds("a", Rgb::new(1, 1, 1), 50, 1000.0, 800.0, &mut rng);
        let b = Group::random_in_bounds("b", Rgb::new(2, 2, 2), 50, 1000.0, 800.0, &mut rng);
        let before = a.particles.clone();

        let gated = PairCoefficients::new(80.0, 500.0, 0.2, 0.0);
        for _ in 0..100 {
            let out = engine.apply(&mut a, &b, gated, &cfg, &mut rng);
            assert_eq!(out, PairOutcome::default());
            engine.apply_self(&mut a, gated, &cfg, &mut rng);
        }

        assert_eq!(a.particles, before);
    }

    #[test]
    fn self_pair_matches_application_against_a_snapshot() {
        let mut cfg = Config::default();
        cfg.bounds.gravity = 0.05;
        let mut rng = StdRng::seed_from_u64(11);
        let original = Group::random_in_bounds("g", Rgb::new(9, 9, 9), 300, 400.0, 300.0, &mut rng);
        let coef = PairCoefficients::new(37.0, 80.0, 0.3, 60.0);

        let mut in_place = original.clone();
        let mut engine = InteractionEngine::new();
        let mut rng = StdRng::seed_from_u64(99);
        engine.apply_self(&mut in_place, coef, &cfg, &mut rng);

        let snapshot = original.clone();
        let mut against_copy = original.clone();
        let mut engine = InteractionEngine::new();
        let mut rng = StdRng::seed_from_u64(99);
        engine.apply(&mut against_copy, &snapshot, coef, &cfg, &mut rng);

        assert_eq!(in_place.particles, against_copy.particles);
        assert_ne!(in_place.particles, original.particles);
    }

    #[test]
    fn empty_groups_are_a_noop() {
        let cfg = quiet_config();
        let mut rng = StdRng::seed_from_u64(0);
        let mut engine = InteractionEngine::new();
        let mut empty = group("empty", Vec::new());
        let mut one = group("one", vec![Vec2::new(1.0, 1.0)]);

        let coef = PairCoefficients::new(100.0, 100.0, 0.0, 100.0);
        assert_eq!(engine.apply(&mut empty, &one, coef, &cfg, &mut rng), PairOutcome::default());
        assert_eq!(engine.apply(&mut one, &empty, coef, &cfg, &mut rng), PairOutcome::default());
        assert_eq!(engine.apply_self(&mut empty, coef, &cfg, &mut rng), PairOutcome::default());
        assert_eq!(one.particles[0], Particle::at(Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn out_of_range_coefficients_are_sanitized() {
        let cfg = quiet_config();
        let mut rng = StdRng::seed_from_u64(0);
        let mut engine = InteractionEngine::new();
        let mut a = group("a", vec![Vec2::new(100.0, 100.0)]);
        a.particles[0].vel = Vec2::new(3.0, 0.0);
        let b = group("b", vec![Vec2::new(105.0, 100.0)]);

        // Viscosity above one is clamped to one, a negative radius to zero.
        let wild = PairCoefficients::new(100.0, -20.0, 4.0, 100.0);
        engine.apply(&mut a, &b, wild, &cfg, &mut rng);

        assert_eq!(a.particles[0].vel, Vec2::ZERO);
        assert_eq!(a.particles[0].pos, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn apply_pair_borrows_both_orders() {
        let cfg = quiet_config();
        let mut rng = StdRng::seed_from_u64(0);
        let mut engine = InteractionEngine::new();
        let mut groups = vec![
            group("a", vec![Vec2::new(100.0, 100.0)]),
            group("b", vec![Vec2::new(110.0, 100.0)]),
        ];
        let attract = PairCoefficients::new(100.0, 20.0, 0.0, 100.0);

        engine.apply_pair(&mut groups, 0, 1, attract, &cfg, &mut rng);
        engine.apply_pair(&mut groups, 1, 0, attract, &cfg, &mut rng);

        assert!(groups[0].particles[0].vel.x > 0.0);
        assert!(groups[1].particles[0].vel.x < 0.0);

        // A lone particle has no one else in its own group.
        let out = engine.apply_pair(&mut groups, 0, 0, attract, &cfg, &mut rng);
        assert_eq!(out.neighbour_hits, 0);
        assert_eq!(out.evaluated, 1);
    }
}
