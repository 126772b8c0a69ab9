use serde::{Deserialize, Serialize};

/// Identifier for a color group in a [`crate::store::ParticleStore`].
///
/// This is an index into `ParticleStore::groups` and into both axes of a
/// [`crate::config::CoefficientMatrix`]. It is only meaningful for the
/// group layout it was taken from.
pub type GroupId = usize;

/// An 8-bit sRGB color shared by every particle of a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}
