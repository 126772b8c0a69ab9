//! The per-pair simulation phases.
//!
//! One pair interaction runs in three steps:
//! 1. [`draw_gate`] — decide, per receiver particle, whether the pair is
//!    evaluated this tick (the probability gate).
//! 2. [`force_phase`] — accumulate the inverse-distance force every source
//!    particle exerts on every gated-in receiver particle into a
//!    [`ForceBuffer`]. Both groups are only read.
//! 3. [`integration_phase`] — apply wall repulsion, integrate velocity and
//!    position, then handle the field boundary. Only the receiver is
//!    written.
//!
//! Because no receiver particle moves before step 2 has finished, a group
//! interacting with itself sees only pre-update positions (explicit Euler).
//! Steps 2 and 3 are data-parallel over receiver particles.

use crate::{
    config::{BoundaryMode, Config, PairCoefficients, SimulationBounds},
    force_buffer::ForceBuffer,
    particle::{Group, Particle},
};
use glam::Vec2;
use rand::Rng;
use rayon::prelude::*;

/// Fraction of the wall penetration depth added to velocity per step.
pub const WALL_REPEL_FACTOR: f32 = 0.1;

/// Below this many receiver particles per task rayon is not worth it.
const PAR_MIN_LEN: usize = 64;

/// Fills `gate` with one entry per receiver particle.
///
/// For each particle a uniform integer in `[0, 100)` is drawn and the
/// particle is gated in when the draw is below `coef.probability`. A
/// probability of `100` or more (or `0` or less) skips the draws entirely.
/// All draws happen here, sequentially, so a seeded `rng` gives the same
/// gate no matter how the later phases are scheduled.
///
/// ### Returns
/// The number of gated-in particles.
pub fn draw_gate(
    gate: &mut Vec<bool>,
    len: usize,
    coef: &PairCoefficients,
    rng: &mut impl Rng,
) -> usize {
    gate.clear();

    if coef.always_applies() {
        gate.resize(len, true);
        return len;
    }
    if coef.never_applies() {
        gate.resize(len, false);
        return 0;
    }

    gate.extend((0..len).map(|_| (rng.random_range(0..100u32) as f32) < coef.probability));
    gate.iter().filter(|&&on| on).count()
}

/// Force that a source particle at `p2` exerts on a receiver at `p1`.
///
/// Returns `None` when the particles coincide (`rsq == 0`) or when `p2`
/// lies at or beyond the radius (`rsq >= r2`, ignored if `infinite`).
/// Otherwise returns `(p1 - p2) / |p1 - p2|`, the unit vector pointing
/// away from the source; the strength sign is applied at integration.
#[inline]
pub fn pair_force(p1: Vec2, p2: Vec2, r2: f32, infinite: bool) -> Option<Vec2> {
    let d = p1 - p2;
    let rsq = d.length_squared();
    if rsq == 0.0 {
        return None;
    }
    if infinite || rsq < r2 {
        Some(d / rsq.sqrt())
    } else {
        None
    }
}

/// Accumulates the force `source` exerts on every gated-in particle of
/// `receiver`.
///
/// The buffer is resized (and cleared) to `receiver.len()` first. When
/// `self_pair` is set, `receiver` and `source` are the same group and a
/// particle never interacts with its own index.
///
/// ### Parameters
/// - `receiver` - Group whose particles receive force; only read.
/// - `source` - Group exerting force; only read. May be `receiver`.
/// - `self_pair` - Whether `receiver` and `source` are the same group.
/// - `coef` - Sanitized coefficients for this pair.
/// - `infinite_radius` - Ignore `coef.radius` and let every pair interact.
/// - `gate` - Output of [`draw_gate`] for this receiver.
/// - `acc` - Scratch buffer receiving per-particle force and neighbour count.
///
/// ### Panics
/// Panics if `gate.len() != receiver.len()`.
pub fn force_phase(
    receiver: &Group,
    source: &Group,
    self_pair: bool,
    coef: &PairCoefficients,
    infinite_radius: bool,
    gate: &[bool],
    acc: &mut ForceBuffer,
) {
    assert_eq!(gate.len(), receiver.len());
    acc.ensure_len(receiver.len());

    let r2 = coef.radius * coef.radius;
    let receivers = &receiver.particles;
    let sources = &source.particles;

    acc.force
        .par_iter_mut()
        .zip(acc.count.par_iter_mut())
        .enumerate()
        .with_min_len(PAR_MIN_LEN)
        .for_each(|(i, (force, count))| {
            if !gate[i] {
                return;
            }
            let p1 = receivers[i].pos;
            for (j, p2) in sources.iter().enumerate() {
                if self_pair && i == j {
                    continue;
                }
                if let Some(f) = pair_force(p1, p2.pos, r2, infinite_radius) {
                    *force += f;
                    *count += 1;
                }
            }
        });
}

/// Velocity pushing a particle back inside the field when it is within
/// `wall_repel` of an edge.
#[inline]
pub fn wall_push(pos: Vec2, bounds: &SimulationBounds) -> Vec2 {
    let w = bounds.wall_repel;
    let mut push = Vec2::ZERO;
    if w <= 0.0 {
        return push;
    }

    if pos.x < w {
        push.x += (w - pos.x) * WALL_REPEL_FACTOR;
    }
    if pos.x > bounds.width - w {
        push.x += (bounds.width - w - pos.x) * WALL_REPEL_FACTOR;
    }
    if pos.y < w {
        push.y += (w - pos.y) * WALL_REPEL_FACTOR;
    }
    if pos.y > bounds.height - w {
        push.y += (bounds.height - w - pos.y) * WALL_REPEL_FACTOR;
    }
    push
}

/// Keeps a particle inside `[0, width] x [0, height]`.
#[inline]
pub fn apply_boundary(p: &mut Particle, bounds: &SimulationBounds, mode: BoundaryMode) {
    let reflect = mode == BoundaryMode::Reflect;

    if p.pos.x < 0.0 {
        p.pos.x = 0.0;
        if reflect {
            p.vel.x = -p.vel.x;
        }
    } else if p.pos.x > bounds.width {
        p.pos.x = bounds.width;
        if reflect {
            p.vel.x = -p.vel.x;
        }
    }

    if p.pos.y < 0.0 {
        p.pos.y = 0.0;
        if reflect {
            p.vel.y = -p.vel.y;
        }
    } else if p.pos.y > bounds.height {
        p.pos.y = bounds.height;
        if reflect {
            p.vel.y = -p.vel.y;
        }
    }
}

/// Advances one particle given the net force of one source group.
///
/// `vel = (vel + wall + force * g) * (1 - viscosity)`, then gravity is
/// added to `vel.y`, `pos += vel`, and the boundary is applied if enabled.
#[inline]
pub fn integrate_particle(p: &mut Particle, force: Vec2, coef: &PairCoefficients, cfg: &Config) {
    let bounds = &cfg.bounds;

    p.vel += wall_push(p.pos, bounds);
    p.vel = (p.vel + force * coef.force_scale()) * (1.0 - coef.viscosity);
    p.vel.y += bounds.gravity;
    p.pos += p.vel;

    if cfg.bounds_enabled {
        apply_boundary(p, bounds, cfg.boundary_mode);
    }
}

/// Integrates every gated-in particle of `receiver` using the forces
/// accumulated by [`force_phase`].
///
/// Gated-out particles are left untouched.
///
/// ### Panics
/// Panics if `acc` or `gate` do not match `receiver.len()`.
pub fn integration_phase(
    receiver: &mut Group,
    acc: &ForceBuffer,
    coef: &PairCoefficients,
    cfg: &Config,
    gate: &[bool],
) {
    assert_eq!(acc.len(), receiver.len());
    assert_eq!(gate.len(), receiver.len());

    receiver
        .particles
        .par_iter_mut()
        .zip(acc.force.par_iter())
        .zip(gate.par_iter())
        .with_min_len(PAR_MIN_LEN)
        .for_each(|((p, &force), &on)| {
            if on {
                integrate_particle(p, force, coef, cfg);
            }
        });
}
