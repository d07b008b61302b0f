//! # cryodrgn-io - Particle Sets for Relion and cryoDRGN
//!
//! `cryodrgn_io` turns an in-memory cryo-EM particle set into the files the
//! Relion 3.1+ toolchain and cryoDRGN consume, and drives the cryoDRGN
//! command-line programs that read them.
//!
//! ## Key Features
//!
//! - **STAR export**: a `particles` table with one row per image and an `optics`
//!   table with one row per acquisition group, with CTF and 2D or projection
//!   alignment converted to Relion conventions.
//!
//! - **Binary materialization**: stacks referenced by the set are linked or
//!   converted into an output directory, and image paths are rewritten to match.
//!
//! - **Row hooks**: callers add or override columns per particle without
//!   replacing the writer.
//!
//! - **cryoDRGN plumbing**: release gating, argument builders for every
//!   sub-program and the paths of their outputs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cryodrgn_io::particles::{CtfModel, ImageLocation, Particle, ParticleSet};
//! use cryodrgn_io::writer::{write_particle_set, WriterConfig};
//!
//! let mut set = ParticleSet::default();
//! set.particles.push(
//!     Particle::new(1, ImageLocation::new(1, "stacks/run1.mrcs"), 1.35, 256)
//!         .with_ctf(CtfModel::new(15000.0, 14500.0, 35.0)),
//! );
//!
//! let summary = write_particle_set(&set, "particles.star", WriterConfig::default())?;
//! println!("{}", summary);
//! # Ok::<(), cryodrgn_io::writer::WriterError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`particles`]: the particle data model
//! - [`geometry`]: alignment matrix helpers
//! - [`star`]: STAR table reading and writing
//! - [`writer`]: particle set to STAR conversion
//! - [`materialize`]: linking and converting referenced stacks
//! - [`mrc`]: MRC header and frame I/O
//! - `hdf`: EMAN2 HDF stack reading (`hdf` feature)
//! - [`drgn`]: cryoDRGN versions, jobs and outputs

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![allow(clippy::too_many_arguments)]

pub mod drgn;
pub mod geometry;
#[cfg(feature = "hdf")]
pub mod hdf;
pub mod materialize;
pub mod mrc;
pub mod particles;
pub mod star;
pub mod writer;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::drgn::{DrgnError, DrgnVersion, Job, Launcher, TrainingOutput};
    pub use crate::materialize::{
        materialize, FileMapping, FormatConverter, MaterializeError, StackConverter,
    };
    pub use crate::mrc::{MrcConverter, MrcError, MrcHeader};
    pub use crate::particles::{
        Acquisition, AlignType, Coordinate, CtfModel, ImageLocation, Particle, ParticleSet,
        Transform,
    };
    pub use crate::star::{StarDocument, StarError, StarTable, StarValue, StarWriter};
    pub use crate::writer::{
        write_particle_set, ParticleSetWriter, StarRow, WriteSummary, WriterConfig, WriterError,
    };
}
