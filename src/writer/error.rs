use crate::materialize::MaterializeError;
use crate::star::StarError;

/// Errors that can occur while writing a particle set
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the STAR table writer
    #[error("STAR error: {0}")]
    StarError(#[from] StarError),

    /// Error while linking or converting binaries
    #[error("Binary conversion error: {0}")]
    MaterializeError(#[from] MaterializeError),

    /// Nothing to write
    #[error("Particle set is empty")]
    EmptyParticleSet,

    /// 3D rigid-body alignment has no particle-table representation
    #[error(
        "3D alignment conversion for Relion not implemented. It seems the particles were \
         generated with an incorrect alignment type. You may either re-launch the protocol \
         that generates the particles with angles or set 'Consider previous alignment?' to No"
    )]
    Unsupported3dAlignment,

    /// A projection transform cannot be inverted
    #[error("Alignment matrix of particle {particle_id} is singular")]
    SingularTransform {
        /// Offending particle
        particle_id: u64,
    },

    /// Configuration value outside the accepted range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
