//! Core particle-life simulation library.
//!
//! Colored groups of 2D particles push and pull each other according to a
//! per-pair coefficient matrix.
//!
//! Main components:
//! - [`types`] — shared ids and colors.
//! - [`particle`] — particles and groups.
//! - [`store`] — ownership and regeneration of group buffers.
//! - [`config`] — pair coefficients, ranges, bounds and global toggles.
//! - [`force_buffer`] — scratch storage for accumulated forces.
//! - [`phases`] — the force law and integration step of one pair.
//! - [`engine`] — pairwise interaction entry points.
//! - [`evolve`] — random drift and randomization of coefficients.
//! - [`preset`] — JSON and flat-list persistence.
//! - [`world`] — the tick driver.
//! - [`error`] — configuration and preset errors.

pub mod config;
pub mod engine;
pub mod error;
pub mod evolve;
pub mod force_buffer;
pub mod particle;
pub mod phases;
pub mod preset;
pub mod store;
pub mod types;
pub mod world;
