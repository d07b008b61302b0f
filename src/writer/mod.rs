//! # Particle-Set Writer
//!
//! Serializes a particle set into the two linked tables read by Relion 3.1+
//! and cryoDRGN: `particles`, one row per image, and `optics`, one row per
//! acquisition group.
//!
//! ## Layout
//!
//! The column set is taken from the first particle's row after all hooks ran.
//! Field groups appear in a fixed order: image id, picking coordinate, image
//! name, random subset, CTF, alignment, extra labels, optics group. Later rows
//! are laid out on those columns; a value a particle lacks is written as `None`.
//!
//! ## Binaries
//!
//! With `output_dir` set, referenced stacks are linked or converted first (see
//! [`crate::materialize`]) and image names point at the materialized files.
//! With `output_stack` set, every image is copied into one new stack instead.

mod align;
mod config;
mod error;
mod optics;
mod row;
mod stats;
mod writer_impl;


pub use align::{align_2d, align_projection, InPlaneAlignment, ProjectionAlignment};
pub use config::WriterConfig;
pub use error::WriterError;
pub use optics::{OpticsGroup, OpticsTable, DEFAULT_OPTICS_GROUP};
pub use row::StarRow;
pub use stats::WriteSummary;
pub use writer_impl::{write_particle_set, ParticleSetWriter, RowHook};
