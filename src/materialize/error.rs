use std::path::PathBuf;

use crate::mrc::MrcError;

/// Errors that can occur while linking or converting binary stacks
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the MRC reader or writer
    #[error("MRC error: {0}")]
    Mrc(#[from] MrcError),

    /// Error from the HDF5 library while reading an EMAN2 stack
    #[cfg(feature = "hdf")]
    #[error("HDF5 error: {0}")]
    Hdf(#[from] hdf5::Error),

    /// The referenced stacks do not share one extension
    #[error("Mixed binary file extensions ({found:?}); expected all stacks to share one format")]
    MixedExtensions {
        /// Distinct extensions seen, in first-seen order
        found: Vec<String>,
    },

    /// The converter cannot read this source
    #[error("Cannot convert {path}: {message}")]
    Unsupported {
        /// Source file
        path: PathBuf,
        /// Reason given by the converter
        message: String,
    },
}
