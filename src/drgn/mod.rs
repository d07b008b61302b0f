//! cryoDRGN program plumbing.
//!
//! Builds command lines for the cryoDRGN sub-programs, gates them on the
//! installed release and locates the files they leave behind:
//!
//! - [`DrgnVersion`]: lenient release parsing and feature gates
//! - [`Launcher`]: conda activation, GPU selection and process spawning
//! - [`Job`] implementations: one per sub-program, with pre-launch checks
//! - [`TrainingOutput`]: epoch, weight, config and volume paths
//!
//! ```no_run
//! use cryodrgn_io::drgn::{prepare, Downsample, Launcher};
//! use std::path::Path;
//!
//! let launcher = Launcher::default();
//! let job = Downsample::new("particles.star", Path::new("out"), 256, 128);
//! let version = launcher.active_version()?;
//! let args = prepare(&job, &version)?;
//! println!("{}", launcher.shell_line("downsample", &args));
//! # Ok::<(), cryodrgn_io::drgn::DrgnError>(())
//! ```

mod error;
mod jobs;
mod outputs;
mod program;
mod version;

pub use error::DrgnError;
pub use jobs::{
    tilt_pixel_size, AbInitio, AbInitioKind, Analyze, AnalyzeLandscape, Architecture,
    BackprojectVoxel, Downsample, EvalVol, GraphTraversal, Job, LandscapeMask, ParseStar,
    StarParse, TrainVae, MIN_MASK_THRESHOLD,
};
pub use outputs::{
    read_fsc, read_indices, read_z_values, FscCurve, TrainingOutput, SINGLE_LATENT_VOLUMES,
};
pub use program::{prepare, shell_quote, Launcher};
pub use version::{DrgnVersion, DEFAULT_VERSION, ENV_PREFIX, VERSIONS};
