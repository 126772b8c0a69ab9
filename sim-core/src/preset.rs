//! Saving and loading complete simulation setups.
//!
//! The native format is JSON (see [`Preset::save`] / [`Preset::load`]).
//! For compatibility with whitespace separated float dumps, a preset can
//! also be flattened into an ordered list of finite floats:
//!
//! 1. every matrix cell in row-major `(receiver, source)` order, four
//!    values each: strength, radius, viscosity, probability;
//! 2. one particle count per group;
//! 3. the scalars listed in [`FLAT_SCALARS`].
//!
//! Group names and colors, the boundary mode and parameter ranges are not
//! part of the flat list; they come from a template preset on load.

use crate::{
    config::{CoefficientMatrix, Config, PairCoefficients, Param},
    error::{ConfigError, PresetError},
    store::{GroupSpec, MAX_GROUP_COUNT},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Names of the trailing scalars of a flat preset, in order.
pub const FLAT_SCALARS: [&str; 9] = [
    "width",
    "height",
    "wall_repel",
    "gravity",
    "bounds_enabled",
    "infinite_radius",
    "evolve_enabled",
    "evolve_chance",
    "evolve_amount",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub groups: Vec<GroupSpec>,
    pub matrix: CoefficientMatrix,
    pub config: Config,
}

impl Preset {
    /// Checks that config and matrix are valid and agree on the group
    /// count, and that no group requests more than [`MAX_GROUP_COUNT`]
    /// particles.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate()?;
        self.matrix.validate()?;
        for (id, spec) in self.groups.iter().enumerate() {
            spec.validate(id)?;
        }
        if self.matrix.groups() != self.groups.len() {
            return Err(ConfigError::GroupCountMismatch {
                matrix: self.matrix.groups(),
                groups: self.groups.len(),
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, PresetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a JSON preset.
    pub fn from_json(json: &str) -> Result<Self, PresetError> {
        let preset: Self = serde_json::from_str(json)?;
        preset.validate()?;
        Ok(preset)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PresetError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        log::info!("saved preset with {} groups to {}", self.groups.len(), path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PresetError> {
        let path = path.as_ref();
        let preset = Self::from_json(&fs::read_to_string(path)?)?;
        log::info!("loaded preset with {} groups from {}", preset.groups.len(), path.display());
        Ok(preset)
    }

    /// Length of the flat list for `groups` groups.
    pub fn flat_len(groups: usize) -> usize {
        groups * groups * Param::ALL.len() + groups + FLAT_SCALARS.len()
    }

    /// Flattens every coefficient, count and scalar into an ordered list.
    pub fn to_flat(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(Self::flat_len(self.groups.len()));

        for coef in self.matrix.cells() {
            out.extend(Param::ALL.iter().map(|&p| coef.get(p)));
        }
        out.extend(self.groups.iter().map(|g| g.count as f32));

        let cfg = &self.config;
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        out.extend([
            cfg.bounds.width,
            cfg.bounds.height,
            cfg.bounds.wall_repel,
            cfg.bounds.gravity,
            flag(cfg.bounds_enabled),
            flag(cfg.infinite_radius),
            flag(cfg.evolve.enabled),
            cfg.evolve.chance,
            cfg.evolve.amount,
        ]);
        out
    }

    /// Rebuilds a preset from a flat list.
    ///
    /// The number of groups, their names and colors, and every setting not
    /// stored in the flat list are taken from `template`.
    pub fn from_flat(values: &[f32], template: &Preset) -> Result<Self, PresetError> {
        let groups = template.groups.len();
        let expected = Self::flat_len(groups);
        if values.len() != expected {
            return Err(PresetError::FlatLength {
                expected,
                found: values.len(),
            });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(PresetError::FlatNonFinite { index });
        }

        let (cells, rest) = values.split_at(groups * groups * Param::ALL.len());
        let (counts, scalars) = rest.split_at(groups);

        let cells = cells
            .chunks_exact(Param::ALL.len())
            .map(|c| PairCoefficients::new(c[0], c[1], c[2], c[3]))
            .collect();
        let matrix = CoefficientMatrix::from_cells(groups, cells)?;

        let mut specs = template.groups.clone();
        for (id, (spec, &count)) in specs.iter_mut().zip(counts).enumerate() {
            if count < 0.0 || count.fract() != 0.0 || count > MAX_GROUP_COUNT as f32 {
                return Err(ConfigError::InvalidCount { id, value: count }.into());
            }
            spec.count = count as usize;
        }

        let mut config = template.config;
        config.bounds.width = scalars[0];
        config.bounds.height = scalars[1];
        config.bounds.wall_repel = scalars[2];
        config.bounds.gravity = scalars[3];
        config.bounds_enabled = scalars[4] != 0.0;
        config.infinite_radius = scalars[5] != 0.0;
        config.evolve.enabled = scalars[6] != 0.0;
        config.evolve.chance = scalars[7];
        config.evolve.amount = scalars[8];

        let preset = Self {
            groups: specs,
            matrix,
            config,
        };
        preset.validate()?;
        Ok(preset)
    }

    /// Formats the flat list as whitespace separated text.
    pub fn format_flat(&self) -> String {
        self.to_flat()
            .iter()
            .map(f32::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Parses whitespace separated text produced by [`Preset::format_flat`].
    pub fn parse_flat(text: &str, template: &Preset) -> Result<Self, PresetError> {
        let values = text
            .split_whitespace()
            .enumerate()
            .map(|(index, token)| {
                token.parse::<f32>().map_err(|_| PresetError::FlatToken {
                    index,
                    token: token.to_owned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_flat(&values, template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::BoundaryMode, types::Rgb};

    fn sample() -> Preset {
        let groups = vec![
            GroupSpec::new("yellow", Rgb::new(255, 255, 0), 300),
            GroupSpec::new("red", Rgb::new(255, 0, 0), 150),
        ];
        let mut matrix = CoefficientMatrix::new(2);
        matrix.set(0, 1, PairCoefficients::new(-32.5, 120.0, 0.25, 80.0));
        matrix.set(1, 1, PairCoefficients::new(15.0, 60.0, 0.75, 100.0));

        let mut config = Config::default();
        config.boundary_mode = BoundaryMode::Clamp;
        config.bounds.gravity = 0.1;
        config.evolve.enabled = true;

        Preset {
            groups,
            matrix,
            config,
        }
    }

    #[test]
    fn flat_layout_puts_matrix_then_counts_then_scalars() {
        let preset = sample();
        let flat = preset.to_flat();

        assert_eq!(flat.len(), Preset::flat_len(2));
        assert_eq!(flat.len(), 2 * 2 * 4 + 2 + 9);
        // Cell (0, 1) is the second cell.
        assert_eq!(&flat[4..8], &[-32.5, 120.0, 0.25, 80.0]);
        assert_eq!(&flat[16..18], &[300.0, 150.0]);
        assert_eq!(flat[18], preset.config.bounds.width);
        assert_eq!(flat[21], 0.1);
        assert_eq!(flat[24], 1.0);
    }

    #[test]
    fn parse_flat_restores_everything_it_stores() {
        let preset = sample();
        let mut template = sample();
        template.matrix = CoefficientMatrix::new(2);
        template.groups[0].count = 1;
        template.config.bounds.gravity = 0.0;

        let restored = Preset::parse_flat(&preset.format_flat(), &template).unwrap();

        assert_eq!(restored, preset);
        // Settings outside the flat list come from the template.
        assert_eq!(restored.config.boundary_mode, BoundaryMode::Clamp);
    }

    #[test]
    fn from_flat_rejects_wrong_length_and_bad_values() {
        let preset = sample();
        let mut flat = preset.to_flat();

        assert!(matches!(
            Preset::from_flat(&flat[1..], &preset),
            Err(PresetError::FlatLength { expected: 27, found: 26 })
        ));

        flat[3] = f32::INFINITY;
        assert!(matches!(
            Preset::from_flat(&flat, &preset),
            Err(PresetError::FlatNonFinite { index: 3 })
        ));

        flat[3] = 100.0;
        flat[16] = -4.0;
        assert!(matches!(
            Preset::from_flat(&flat, &preset),
            Err(PresetError::Config(ConfigError::InvalidCount { id: 0, .. }))
        ));
    }

    #[test]
    fn from_flat_rejects_fractional_and_huge_counts() {
        let preset = sample();
        let mut flat = preset.to_flat();

        for bad in [2.5, 1.0e30, (MAX_GROUP_COUNT + 1) as f32] {
            flat[17] = bad;
            let err = Preset::from_flat(&flat, &preset).unwrap_err();
            assert!(
                matches!(err, PresetError::Config(ConfigError::InvalidCount { id: 1, .. })),
                "{bad}: {err}"
            );
        }

        flat[17] = MAX_GROUP_COUNT as f32;
        let restored = Preset::from_flat(&flat, &preset).unwrap();
        assert_eq!(restored.groups[1].count, MAX_GROUP_COUNT);
    }

    #[test]
    fn from_json_rejects_oversized_group() {
        let mut preset = sample();
        preset.groups[0].count = MAX_GROUP_COUNT + 1;
        let json = serde_json::to_string(&preset).unwrap();

        let err = Preset::from_json(&json).unwrap_err();
        assert!(matches!(
            err,
            PresetError::Config(ConfigError::GroupTooLarge { id: 0, .. })
        ));
    }

    #[test]
    fn parse_flat_reports_bad_token() {
        let err = Preset::parse_flat("1 2 nope", &sample()).unwrap_err();
        assert!(matches!(err, PresetError::FlatToken { index: 2, .. }), "{err}");
    }

    #[test]
    fn json_preserves_preset() {
        let preset = sample();
        let json = preset.to_json().unwrap();

        assert!(json.contains("\"yellow\""));
        assert_eq!(Preset::from_json(&json).unwrap(), preset);
    }

    #[test]
    fn from_json_validates_group_count() {
        let mut preset = sample();
        preset.groups.pop();
        let json = serde_json::to_string(&preset).unwrap();

        let err = Preset::from_json(&json).unwrap_err();
        assert!(matches!(
            err,
            PresetError::Config(ConfigError::GroupCountMismatch { matrix: 2, groups: 1 })
        ));
    }

    #[test]
    fn save_and_load_through_a_file() {
        let preset = sample();
        let path = std::env::temp_dir().join(format!("particle-life-preset-{}.json", std::process::id()));

        preset.save(&path).unwrap();
        let loaded = Preset::load(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, preset);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = Preset::load("/definitely/not/here/preset.json").unwrap_err();
        assert!(matches!(err, PresetError::Io(_)));
    }
}
