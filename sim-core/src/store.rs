//! Ownership and lifecycle of every particle buffer.
//!
//! Groups are never grown or shrunk in place: a count change, restart or
//! randomize discards the buffer and regenerates it from scratch.

use crate::{
    config::SimulationBounds,
    error::ConfigError,
    particle::Group,
    types::{GroupId, Rgb},
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Largest particle count a single group may request.
pub const MAX_GROUP_COUNT: usize = 10_000;

/// Requested layout of one group, as supplied by the configuration layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    pub color: Rgb,
    pub count: usize,
}

impl GroupSpec {
    pub fn new(name: impl Into<String>, color: Rgb, count: usize) -> Self {
        Self {
            name: name.into(),
            color,
            count,
        }
    }

    /// Checks that `count` does not exceed [`MAX_GROUP_COUNT`].
    ///
    /// ### Parameters
    /// - `id` - Index of this spec, reported in the error.
    pub fn validate(&self, id: GroupId) -> Result<(), ConfigError> {
        check_count(id, self.count)
    }
}

/// Rejects particle counts above [`MAX_GROUP_COUNT`].
pub fn check_count(id: GroupId, count: usize) -> Result<(), ConfigError> {
    if count > MAX_GROUP_COUNT {
        return Err(ConfigError::GroupTooLarge {
            id,
            count,
            max: MAX_GROUP_COUNT,
        });
    }
    Ok(())
}

/// Owns one particle buffer per group.
///
/// Group ids index into the store in the same order as the specs it was
/// built from. Buffers are only ever replaced wholesale.
#[derive(Debug, Default)]
pub struct ParticleStore {
    groups: Vec<Group>,
}

impl ParticleStore {
    /// Creates a store with one populated group per spec.
    pub fn from_specs(specs: &[GroupSpec], bounds: &SimulationBounds, rng: &mut impl Rng) -> Self {
        let groups = specs
            .iter()
            .map(|s| Group::random_in_bounds(&s.name, s.color, s.count, bounds.width, bounds.height, rng))
            .collect();

        Self { groups }
    }

    /// Replaces group `id` with `count` fresh particles of `color`.
    ///
    /// Positions are uniform in `[0, width) x [0, height)`, velocities are
    /// zero. The previous buffer for that group is discarded.
    pub fn populate(
        &mut self,
        id: GroupId,
        count: usize,
        color: Rgb,
        bounds: &SimulationBounds,
        rng: &mut impl Rng,
    ) -> Result<&Group, ConfigError> {
        let groups = self.groups.len();
        let slot = self
            .groups
            .get_mut(id)
            .ok_or(ConfigError::UnknownGroup { id, groups })?;
        check_count(id, count)?;

        let name = std::mem::take(&mut slot.name);
        *slot = Group::random_in_bounds(name, color, count, bounds.width, bounds.height, rng);
        log::debug!("populated group {id} ({}) with {count} particles", slot.name);

        Ok(slot)
    }

    /// Regenerates every group whose buffer no longer matches its spec.
    ///
    /// A group is regenerated when its particle count or color differs
    /// from the spec; renames are applied in place. If the number of specs
    /// differs from the number of groups the whole store is rebuilt.
    ///
    /// ### Returns
    /// The number of groups that were regenerated.
    pub fn sync(
        &mut self,
        specs: &[GroupSpec],
        bounds: &SimulationBounds,
        rng: &mut impl Rng,
    ) -> usize {
        if specs.len() != self.groups.len() {
            *self = Self::from_specs(specs, bounds, rng);
            return specs.len();
        }

        let mut regenerated = 0;
        for (id, spec) in specs.iter().enumerate() {
            let group = &mut self.groups[id];
            group.name.clone_from(&spec.name);
            if group.len() == spec.count && group.color == spec.color {
                continue;
            }
            match self.populate(id, spec.count, spec.color, bounds, rng) {
                Ok(_) => regenerated += 1,
                Err(e) => log::warn!("group {id} ({}) kept as is: {e}", spec.name),
            }
        }
        regenerated
    }

    /// Regenerates every group with its current count and color.
    pub fn restart(&mut self, bounds: &SimulationBounds, rng: &mut impl Rng) {
        for group in &mut self.groups {
            let name = std::mem::take(&mut group.name);
            *group = Group::random_in_bounds(
                name,
                group.color,
                group.len(),
                bounds.width,
                bounds.height,
                rng,
            );
        }
    }

    #[inline]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    #[inline]
    pub fn groups_mut(&mut self) -> &mut [Group] {
        &mut self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn total_particles(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }
}
