use std::path::PathBuf;

/// Errors raised while preparing, launching or reading cryoDRGN jobs
#[derive(Debug, thiserror::Error)]
pub enum DrgnError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error reading a STAR input
    #[error("STAR error: {0}")]
    StarError(#[from] crate::star::StarError),

    /// Version string that cannot be understood
    #[error("Invalid cryoDRGN version '{0}'")]
    InvalidVersion(String),

    /// Program not available in the active release
    #[error("{program} requires cryoDRGN {required} or later (active: {active})")]
    UnsupportedVersion {
        /// cryoDRGN sub-program
        program: String,
        /// First release providing it
        required: String,
        /// Active release
        active: String,
    },

    /// Job parameters rejected before launch
    #[error("Invalid {program} parameters: {}", .errors.join("; "))]
    Validation {
        /// cryoDRGN sub-program
        program: String,
        /// One message per problem
        errors: Vec<String>,
    },

    /// The external program exited unsuccessfully
    #[error("cryodrgn {program} failed with {status}")]
    ProgramFailed {
        /// cryoDRGN sub-program
        program: String,
        /// Exit status as reported by the OS
        status: std::process::ExitStatus,
    },

    /// An expected output file is missing
    #[error("{} does not exist. Please select a valid epoch number.", .path.display())]
    ArtifactNotFound {
        /// Missing file
        path: PathBuf,
    },

    /// An output file could not be parsed
    #[error("Invalid content in {} at line {line}: {message}", .path.display())]
    InvalidArtifact {
        /// Offending file
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },
}
