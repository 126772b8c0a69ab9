//! Particles and the groups that own them.

use crate::types::Rgb;
use glam::Vec2;
use rand::Rng;

/// A single point mass in field coordinates.
///
/// Color is a property of the owning [`Group`], not of the particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Particle {
    /// Creates a particle at rest at `pos`.
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
        }
    }
}

/// A homogeneous, single-colored collection of particles.
///
/// A particle's identity is its index in `particles`. The buffer is only
/// ever replaced wholesale; see [`crate::store::ParticleStore::populate`].
#[derive(Clone, Debug)]
pub struct Group {
    pub name: String,
    pub color: Rgb,
    pub particles: Vec<Particle>,
}

impl Group {
    /// Builds a group of resting particles at the given positions.
    pub fn from_positions(name: impl Into<String>, color: Rgb, positions: Vec<Vec2>) -> Self {
        let particles = positions.into_iter().map(Particle::at).collect();

        Self {
            name: name.into(),
            color,
            particles,
        }
    }

    /// Creates `count` resting particles uniformly placed in
    /// `[0, width) x [0, height)`.
    pub fn random_in_bounds(
        name: impl Into<String>,
        color: Rgb,
        count: usize,
        width: f32,
        height: f32,
        rng: &mut impl Rng,
    ) -> Self {
        let positions = (0..count)
            .map(|_| Vec2::new(sample_axis(width, rng), sample_axis(height, rng)))
            .collect();

        Self::from_positions(name, color, positions)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Current positions, in particle order.
    pub fn positions(&self) -> impl ExactSizeIterator<Item = Vec2> + '_ {
        self.particles.iter().map(|p| p.pos)
    }
}

fn sample_axis(extent: f32, rng: &mut impl Rng) -> f32 {
    if extent > 0.0 {
        rng.random_range(0.0..extent)
    } else {
        0.0
    }
}
