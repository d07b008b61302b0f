use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::materialize::DEFAULT_EXTENSION;
use crate::particles::AlignType;

/// Configuration for the particle-set writer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Image paths are written relative to this directory when set
    pub root_dir: Option<PathBuf>,

    /// Destination for linked or converted binaries.
    /// When unset, image paths are written as they are.
    pub output_dir: Option<PathBuf>,

    /// Accepted binary formats; the first entry is the materialization target
    pub extensions: Vec<String>,

    /// Consolidate every particle into this single new stack
    pub output_stack: Option<PathBuf>,

    /// Write CTF columns when the first particle carries a CTF
    pub write_ctf: bool,

    /// Write `rlnRandomSubset` when the first particle carries one
    pub fill_random_subset: bool,

    /// Alignment convention; defaults to the particle set's own
    pub align_type: Option<AlignType>,

    /// Extra particle labels copied verbatim when present
    pub extra_labels: Vec<String>,

    /// Convert binaries even when a link would do
    pub force_convert: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            root_dir: None,
            output_dir: None,
            extensions: vec![DEFAULT_EXTENSION.to_string()],
            output_stack: None,
            write_ctf: true,
            fill_random_subset: false,
            align_type: None,
            extra_labels: Vec::new(),
            force_convert: false,
        }
    }
}

impl WriterConfig {
    /// Config that materializes binaries under `output_dir`
    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: Some(output_dir.into()),
            ..Default::default()
        }
    }

    /// Target extension for materialized binaries
    pub fn target_extension(&self) -> &str {
        self.extensions
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_EXTENSION)
    }
}
