use std::fmt;

use crate::materialize::FileMapping;

/// Summary of a completed particle-set write
#[derive(Debug, Clone)]
pub struct WriteSummary {
    /// Rows written to the particles table
    pub particles_written: usize,
    /// Rows written to the optics table
    pub optics_groups: usize,
    /// Original stack path to materialized path; empty when nothing was linked or converted
    pub file_mapping: FileMapping,
}

impl fmt::Display for WriteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} particles in {} optics group(s), {} binary file(s) materialized",
            self.particles_written,
            self.optics_groups,
            self.file_mapping.len()
        )
    }
}
