//! The simulation driver: owns all state and runs whole ticks.
//!
//! A tick is:
//! 1. optional coefficient drift ([`crate::evolve::evolve`]);
//! 2. regeneration of any group whose requested count or color changed;
//! 3. one [`InteractionEngine::apply_pair`] per ordered `(receiver, source)`
//!    pair, in row-major order, skipping pairs with an empty group.
//!
//! Pairs run sequentially, so a pair sees the results of earlier pairs in
//! the same tick. Coefficients and config cannot change mid-tick because
//! [`Simulation::tick`] holds `&mut self`.

use crate::{
    config::{CoefficientMatrix, Config, Param},
    engine::InteractionEngine,
    error::ConfigError,
    evolve,
    particle::Group,
    preset::Preset,
    store::{GroupSpec, ParticleStore, check_count},
    types::{GroupId, Rgb},
};
use rand::{SeedableRng, rngs::StdRng};

/// Summary of one [`Simulation::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub pairs_applied: usize,
    /// Pairs skipped because the receiver or source group was empty.
    pub pairs_skipped: usize,
    /// Receiver particles that passed the probability gate, over all pairs.
    pub particles_evaluated: usize,
    pub neighbour_hits: u64,
    /// Groups regenerated at the start of the tick.
    pub groups_regenerated: usize,
    /// Coefficients that drifted at the start of the tick.
    pub coefficients_evolved: usize,
}

pub struct Simulation {
    specs: Vec<GroupSpec>,
    store: ParticleStore,
    matrix: CoefficientMatrix,
    config: Config,
    engine: InteractionEngine,
    rng: StdRng,
    ticks: u64,
}

impl Simulation {
    /// Creates a simulation and populates every group.
    ///
    /// ### Errors
    /// Returns an error if `config` or `matrix` are invalid or the matrix
    /// is not sized for `specs.len()` groups.
    pub fn new(
        specs: Vec<GroupSpec>,
        matrix: CoefficientMatrix,
        config: Config,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        let preset = Preset {
            groups: specs,
            matrix,
            config,
        };
        preset.validate()?;
        warn_out_of_range(&preset.matrix, &preset.config);

        let mut rng = StdRng::seed_from_u64(seed);
        let store = ParticleStore::from_specs(&preset.groups, &preset.config.bounds, &mut rng);
        log::info!(
            "simulation created: {} groups, {} particles",
            store.len(),
            store.total_particles()
        );

        Ok(Self {
            specs: preset.groups,
            store,
            matrix: preset.matrix,
            config: preset.config,
            engine: InteractionEngine::new(),
            rng,
            ticks: 0,
        })
    }

    /// Creates a simulation whose coefficients are drawn at random.
    pub fn with_random_matrix(
        specs: Vec<GroupSpec>,
        config: Config,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        let mut sim = Self::new(
            specs.clone(),
            CoefficientMatrix::new(specs.len()),
            config,
            seed,
        )?;
        sim.randomize();
        Ok(sim)
    }

    /// Advances the simulation by one tick.
    pub fn tick(&mut self) -> TickStats {
        let mut stats = TickStats {
            coefficients_evolved: evolve::evolve(
                &mut self.matrix,
                &self.config.ranges,
                &self.config.evolve,
                &mut self.rng,
            ),
            groups_regenerated: self.store.sync(&self.specs, &self.config.bounds, &mut self.rng),
            ..TickStats::default()
        };

        let n = self.store.len();
        for receiver in 0..n {
            for source in 0..n {
                let groups = self.store.groups_mut();
                if groups[receiver].is_empty() || groups[source].is_empty() {
                    stats.pairs_skipped += 1;
                    continue;
                }

                let out = self.engine.apply_pair(
                    groups,
                    receiver,
                    source,
                    self.matrix.get(receiver, source),
                    &self.config,
                    &mut self.rng,
                );
                stats.pairs_applied += 1;
                stats.particles_evaluated += out.evaluated;
                stats.neighbour_hits += out.neighbour_hits;
            }
        }

        self.ticks += 1;
        log::debug!("tick {}: {:?}", self.ticks, stats);
        stats
    }

    /// Regenerates every group at fresh random positions.
    pub fn restart(&mut self) {
        self.store.sync(&self.specs, &self.config.bounds, &mut self.rng);
        self.store.restart(&self.config.bounds, &mut self.rng);
        self.ticks = 0;
        log::info!("restarted with {} particles", self.store.total_particles());
    }

    /// Draws new coefficients for every pair from the configured ranges.
    pub fn randomize(&mut self) {
        evolve::randomize(&mut self.matrix, &self.config.ranges, &mut self.rng);
        log::info!("randomized {} pair coefficients", self.matrix.cells().len());
    }

    /// Requests a new particle count for a group.
    ///
    /// The group is regenerated at the start of the next tick.
    ///
    /// ### Errors
    /// Returns an error for an unknown `id` or a `count` above
    /// [`MAX_GROUP_COUNT`](crate::store::MAX_GROUP_COUNT).
    pub fn set_group_count(&mut self, id: GroupId, count: usize) -> Result<(), ConfigError> {
        let spec = self.spec_mut(id)?;
        check_count(id, count)?;
        spec.count = count;
        Ok(())
    }

    /// Requests a new color for a group.
    ///
    /// Like a count change, this regenerates the group on the next tick.
    pub fn set_group_color(&mut self, id: GroupId, color: Rgb) -> Result<(), ConfigError> {
        self.spec_mut(id)?.color = color;
        Ok(())
    }

    fn spec_mut(&mut self, id: GroupId) -> Result<&mut GroupSpec, ConfigError> {
        let groups = self.specs.len();
        self.specs
            .get_mut(id)
            .ok_or(ConfigError::UnknownGroup { id, groups })
    }

    /// Replaces the config after validating it.
    pub fn set_config(&mut self, config: Config) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Snapshot of the full setup, suitable for saving.
    pub fn preset(&self) -> Preset {
        Preset {
            groups: self.specs.clone(),
            matrix: self.matrix.clone(),
            config: self.config,
        }
    }

    /// Switches to a new setup and regenerates the groups it changes.
    pub fn load_preset(&mut self, preset: Preset) -> Result<(), ConfigError> {
        preset.validate()?;
        warn_out_of_range(&preset.matrix, &preset.config);

        self.specs = preset.groups;
        self.matrix = preset.matrix;
        self.config = preset.config;
        let regenerated = self.store.sync(&self.specs, &self.config.bounds, &mut self.rng);
        log::info!("preset applied, {regenerated} groups regenerated");
        Ok(())
    }

    /// Current particle groups, for drawing.
    pub fn groups(&self) -> &[Group] {
        self.store.groups()
    }

    pub fn specs(&self) -> &[GroupSpec] {
        &self.specs
    }

    pub fn matrix(&self) -> &CoefficientMatrix {
        &self.matrix
    }

    pub fn matrix_mut(&mut self) -> &mut CoefficientMatrix {
        &mut self.matrix
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn total_particles(&self) -> usize {
        self.store.total_particles()
    }
}

fn warn_out_of_range(matrix: &CoefficientMatrix, config: &Config) {
    let outside = matrix
        .cells()
        .iter()
        .flat_map(|c| Param::ALL.map(|p| (p, c.get(p))))
        .filter(|&(p, v)| config.ranges.range(p).clamp(v) != v)
        .count();
    if outside > 0 {
        log::warn!("{outside} coefficients lie outside their declared ranges");
    }
}
