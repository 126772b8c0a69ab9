//! Simulation configuration: per-pair coefficients and global settings.
//!
//! Every tunable the control panel exposes lives here. The per-pair table
//! is a single [`CoefficientMatrix`] indexed by `(receiver, source)` group
//! ids, so the number of groups is a runtime value.

use crate::{error::ConfigError, types::GroupId};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One of the four scalar parameters of a [`PairCoefficients`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Param {
    Strength,
    Radius,
    Viscosity,
    Probability,
}

impl Param {
    /// All parameters, in persisted order.
    pub const ALL: [Param; 4] = [
        Param::Strength,
        Param::Radius,
        Param::Viscosity,
        Param::Probability,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Param::Strength => "strength",
            Param::Radius => "radius",
            Param::Viscosity => "viscosity",
            Param::Probability => "probability",
        }
    }
}

/// Coefficients governing how a receiver group reacts to a source group.
///
/// `strength` is on a human scale where positive values attract and
/// negative values repel. `viscosity` is the fraction of velocity removed
/// each tick. `probability` is the percent chance per receiver particle per
/// tick that the pair is evaluated at all.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairCoefficients {
    pub strength: f32,
    pub radius: f32,
    pub viscosity: f32,
    pub probability: f32,
}

impl Default for PairCoefficients {
    fn default() -> Self {
        Self {
            strength: 0.0,
            radius: 80.0,
            viscosity: 0.5,
            probability: 100.0,
        }
    }
}

impl PairCoefficients {
    /// Creates coefficients from raw values, without clamping.
    ///
    /// ### Parameters
    /// - `strength` - Human-scale force, positive attracts.
    /// - `radius` - Interaction cutoff distance.
    /// - `viscosity` - Fraction of velocity removed per step.
    /// - `probability` - Percent chance per particle that the pair runs.
    pub fn new(strength: f32, radius: f32, viscosity: f32, probability: f32) -> Self {
        Self {
            strength,
            radius,
            viscosity,
            probability,
        }
    }

    /// Reads one parameter by name.
    #[inline]
    pub fn get(&self, param: Param) -> f32 {
        match param {
            Param::Strength => self.strength,
            Param::Radius => self.radius,
            Param::Viscosity => self.viscosity,
            Param::Probability => self.probability,
        }
    }

    /// Mutable access to one parameter, for sliders and drift.
    #[inline]
    pub fn get_mut(&mut self, param: Param) -> &mut f32 {
        match param {
            Param::Strength => &mut self.strength,
            Param::Radius => &mut self.radius,
            Param::Viscosity => &mut self.viscosity,
            Param::Probability => &mut self.probability,
        }
    }

    /// Returns a copy that is safe to feed into the force law.
    ///
    /// Radius is clamped to `>= 0`, viscosity to `[0, 1]` and probability
    /// to `[0, 100]`. Strength is left untouched.
    pub fn sanitized(self) -> Self {
        Self {
            strength: self.strength,
            radius: self.radius.max(0.0),
            viscosity: self.viscosity.clamp(0.0, 1.0),
            probability: self.probability.clamp(0.0, 100.0),
        }
    }

    /// `true` when [`PairCoefficients::sanitized`] would change a value.
    ///
    /// NaN radius, viscosity or probability also count as out of range.
    pub fn needs_sanitizing(&self) -> bool {
        !(self.radius >= 0.0
            && (0.0..=1.0).contains(&self.viscosity)
            && (0.0..=100.0).contains(&self.probability))
    }

    /// Force multiplier derived from `strength`.
    ///
    /// Dividing by `-100` turns the human scale into a factor where
    /// positive strength pulls the receiver towards the source.
    #[inline]
    pub fn force_scale(&self) -> f32 {
        self.strength / -100.0
    }

    /// `true` when every receiver particle is evaluated without a draw.
    #[inline]
    pub fn always_applies(&self) -> bool {
        self.probability >= 100.0
    }

    /// `true` when no receiver particle can ever pass the gate.
    #[inline]
    pub fn never_applies(&self) -> bool {
        self.probability <= 0.0
    }
}

/// Inclusive `[min, max]` range of a single parameter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        if self.span() > 0.0 {
            rng.random_range(self.min..=self.max)
        } else {
            self.min
        }
    }
}

/// Declared ranges for every parameter; used for randomize, evolve and UI.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoefficientRanges {
    pub strength: ParamRange,
    pub radius: ParamRange,
    pub viscosity: ParamRange,
    pub probability: ParamRange,
}

impl CoefficientRanges {
    /// Strength on `[-100, 100]`.
    pub const fn classic() -> Self {
        Self {
            strength: ParamRange::new(-100.0, 100.0),
            radius: ParamRange::new(0.0, 500.0),
            viscosity: ParamRange::new(0.0, 1.0),
            probability: ParamRange::new(0.0, 100.0),
        }
    }

    /// Strength on `[-200, 200]`.
    pub const fn wide() -> Self {
        Self {
            strength: ParamRange::new(-200.0, 200.0),
            ..Self::classic()
        }
    }

    pub fn range(&self, param: Param) -> ParamRange {
        match param {
            Param::Strength => self.strength,
            Param::Radius => self.radius,
            Param::Viscosity => self.viscosity,
            Param::Probability => self.probability,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for param in Param::ALL {
            let r = self.range(param);
            if !r.min.is_finite() || !r.max.is_finite() || r.min > r.max {
                return Err(ConfigError::InvertedRange {
                    name: param.name(),
                    min: r.min,
                    max: r.max,
                });
            }
        }
        Ok(())
    }
}

impl Default for CoefficientRanges {
    fn default() -> Self {
        Self::classic()
    }
}

/// Full `G x G` table of [`PairCoefficients`], stored row-major.
///
/// Row is the receiver group, column the source group. The table is not
/// symmetric: `get(a, b)` and `get(b, a)` are independent cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoefficientMatrix {
    groups: usize,
    cells: Vec<PairCoefficients>,
}

impl CoefficientMatrix {
    /// Creates a matrix for `groups` groups with default coefficients.
    pub fn new(groups: usize) -> Self {
        Self {
            groups,
            cells: vec![PairCoefficients::default(); groups * groups],
        }
    }

    /// Builds a matrix from row-major cells.
    pub fn from_cells(groups: usize, cells: Vec<PairCoefficients>) -> Result<Self, ConfigError> {
        if cells.len() != groups * groups {
            return Err(ConfigError::MatrixShape {
                groups,
                cells: cells.len(),
            });
        }
        Ok(Self { groups, cells })
    }

    #[inline]
    pub fn groups(&self) -> usize {
        self.groups
    }

    #[inline]
    fn index(&self, receiver: GroupId, source: GroupId) -> usize {
        assert!(
            receiver < self.groups && source < self.groups,
            "pair ({receiver}, {source}) out of range for {} groups",
            self.groups
        );
        receiver * self.groups + source
    }

    /// Returns the coefficients applied to `receiver` by `source`.
    ///
    /// ### Panics
    /// Panics if either id is out of range.
    #[inline]
    pub fn get(&self, receiver: GroupId, source: GroupId) -> PairCoefficients {
        self.cells[self.index(receiver, source)]
    }

    #[inline]
    pub fn get_mut(&mut self, receiver: GroupId, source: GroupId) -> &mut PairCoefficients {
        let i = self.index(receiver, source);
        &mut self.cells[i]
    }

    pub fn set(&mut self, receiver: GroupId, source: GroupId, coef: PairCoefficients) {
        *self.get_mut(receiver, source) = coef;
    }

    /// Row-major view of every cell.
    pub fn cells(&self) -> &[PairCoefficients] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [PairCoefficients] {
        &mut self.cells
    }

    /// Checks shape and that every coefficient is finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cells.len() != self.groups * self.groups {
            return Err(ConfigError::MatrixShape {
                groups: self.groups,
                cells: self.cells.len(),
            });
        }
        for (i, coef) in self.cells.iter().enumerate() {
            for param in Param::ALL {
                if !coef.get(param).is_finite() {
                    return Err(ConfigError::NonFiniteCoefficient {
                        row: i / self.groups,
                        col: i % self.groups,
                        name: param.name(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Size of the simulated field and the global forces acting inside it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationBounds {
    pub width: f32,
    pub height: f32,
    /// Distance from each edge inside which particles are pushed back in.
    pub wall_repel: f32,
    /// Constant added to `vy` every integration step.
    pub gravity: f32,
}

impl Default for SimulationBounds {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 800.0,
            wall_repel: 10.0,
            gravity: 0.0,
        }
    }
}

impl SimulationBounds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let size_ok = |v: f32| v.is_finite() && v > 0.0;
        if !size_ok(self.width) || !size_ok(self.height) {
            return Err(ConfigError::InvalidBounds {
                width: self.width,
                height: self.height,
            });
        }
        if !self.wall_repel.is_finite() || self.wall_repel < 0.0 {
            return Err(ConfigError::NegativeScalar {
                name: "wall_repel",
                value: self.wall_repel,
            });
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::NonFinite {
                name: "gravity",
                value: self.gravity,
            });
        }
        Ok(())
    }
}

/// What happens to a particle that leaves `[0, width] x [0, height]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryMode {
    /// Pin to the edge and negate the offending velocity component.
    #[default]
    Reflect,
    /// Pin to the edge and keep the velocity.
    Clamp,
}

/// Stochastic per-tick drift of the coefficient matrix.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvolveSettings {
    pub enabled: bool,
    /// Percent chance, per coefficient per tick, that it drifts.
    pub chance: f32,
    /// Maximum drift as a percent of the parameter's range span.
    pub amount: f32,
}

impl Default for EvolveSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            chance: 10.0,
            amount: 1.0,
        }
    }
}

/// Global configuration read by the engine every tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub bounds: SimulationBounds,
    pub bounds_enabled: bool,
    pub boundary_mode: BoundaryMode,
    /// Ignore every pair's radius and let all particles interact.
    pub infinite_radius: bool,
    pub evolve: EvolveSettings,
    pub ranges: CoefficientRanges,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bounds: SimulationBounds::default(),
            bounds_enabled: true,
            boundary_mode: BoundaryMode::Reflect,
            infinite_radius: false,
            evolve: EvolveSettings::default(),
            ranges: CoefficientRanges::classic(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bounds.validate()?;
        self.ranges.validate()?;
        for (name, value) in [
            ("evolve.chance", self.evolve.chance),
            ("evolve.amount", self.evolve.amount),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NegativeScalar { name, value });
            }
        }
        Ok(())
    }
}
