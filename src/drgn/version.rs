use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use semver::{Prerelease, Version};

use super::error::DrgnError;

/// Supported cryoDRGN releases, oldest first
pub const VERSIONS: &[&str] = &[
    "0.2.1b", "0.3.0b", "0.3.1", "0.3.2", "0.3.3b", "0.3.4", "1.0.0", "1.1.0", "2.0.0", "2.1.0",
    "2.2.0", "2.3.0", "3.0.0", "3.3.3", "3.4.0",
];

/// Release installed when nothing else is configured
pub const DEFAULT_VERSION: &str = "3.4.0";

/// Prefix of the conda environment of each release
pub const ENV_PREFIX: &str = "cryodrgn-";

/// Release that stopped needing `--relion31`
pub const V1_0_0: &str = "1.0.0";
/// First release with ab initio reconstruction
pub const V2_0_0: &str = "2.0.0";
/// First release writing `config.yaml`
pub const V2_3_0: &str = "2.3.0";
/// First release with tilt-series back-projection
pub const V3_4_0: &str = "3.4.0";

/// A cryoDRGN release as named upstream (`0.3.0b`, `3.4.0`, ...)
///
/// Equality and ordering follow the parsed version, not the spelling.
#[derive(Debug, Clone)]
pub struct DrgnVersion {
    raw: String,
    version: Version,
}

impl DrgnVersion {
    /// Parse a release name, accepting a trailing pre-release letter and missing patch
    pub fn parse(s: &str) -> Result<Self, DrgnError> {
        let raw = s.trim();
        if let Ok(version) = Version::parse(raw) {
            return Ok(Self {
                raw: raw.to_string(),
                version,
            });
        }

        let core = raw.trim_end_matches(|c: char| c.is_ascii_alphabetic());
        let suffix = &raw[core.len()..];
        let parts = core
            .split('.')
            .map(|p| p.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| DrgnError::InvalidVersion(raw.to_string()))?;
        if parts.is_empty() || parts.len() > 3 {
            return Err(DrgnError::InvalidVersion(raw.to_string()));
        }

        let part = |i: usize| parts.get(i).copied().unwrap_or(0);
        let mut version = Version::new(part(0), part(1), part(2));
        if !suffix.is_empty() {
            version.pre = Prerelease::new(suffix).map_err(|_| DrgnError::InvalidVersion(raw.to_string()))?;
        }

        Ok(Self {
            raw: raw.to_string(),
            version,
        })
    }

    /// Release named by the last token of an activation command
    /// (`conda activate cryodrgn-3.4.0`, or an environment path ending in it)
    pub fn from_activation(activation: &str) -> Result<Self, DrgnError> {
        let env = activation
            .split_whitespace()
            .last()
            .ok_or_else(|| DrgnError::InvalidVersion(activation.to_string()))?;
        let env = env.rsplit('/').next().unwrap_or(env);
        Self::parse(env.strip_prefix(ENV_PREFIX).unwrap_or(env))
    }

    /// The default release
    pub fn default_release() -> Self {
        Self {
            raw: DEFAULT_VERSION.to_string(),
            version: Version::new(3, 4, 0),
        }
    }

    /// Name as given
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Conda environment name
    pub fn env_name(&self) -> String {
        format!("{}{}", ENV_PREFIX, self.raw)
    }

    /// Whether this release is `other` or newer
    pub fn is_at_least(&self, other: &str) -> bool {
        Self::parse(other).map(|o| *self >= o).unwrap_or(false)
    }

    /// Whether this release is one of [`VERSIONS`]
    pub fn is_supported(&self) -> bool {
        VERSIONS.iter().any(|v| Self::parse(v).is_ok_and(|v| v == *self))
    }

    /// Training needs `--relion31` to read Relion 3.1 STAR files
    pub fn needs_relion31_flag(&self) -> bool {
        !self.is_at_least(V1_0_0)
    }

    /// `abinit_homo` and `abinit_het` are available
    pub fn has_abinit(&self) -> bool {
        self.is_at_least(V2_0_0)
    }

    /// `backproject_voxel --tilt` is available
    pub fn has_tilt_backproject(&self) -> bool {
        self.is_at_least(V3_4_0)
    }

    /// Model config written next to the training outputs
    pub fn config_file_name(&self) -> &'static str {
        if self.is_at_least(V2_3_0) {
            "config.yaml"
        } else {
            "config.pkl"
        }
    }
}

impl Default for DrgnVersion {
    fn default() -> Self {
        Self::default_release()
    }
}

impl PartialEq for DrgnVersion {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
    }
}

impl Eq for DrgnVersion {}

impl PartialOrd for DrgnVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DrgnVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version.cmp(&other.version)
    }
}

impl FromStr for DrgnVersion {
    type Err = DrgnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DrgnVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
