//! TOML configuration file support.
//!
//! Settings that would otherwise be repeated on every invocation can live in a
//! config file; command-line flags override it:
//!
//! ```toml
//! # cryodrgn-io.toml
//! [writer]
//! root_dir = "/data/project"
//! extra_labels = ["rlnParticleSelectZScore"]
//! fill_random_subset = true
//!
//! [materialize]
//! extension = "mrcs"
//! force = false
//!
//! [launcher]
//! env_activation = "conda activate cryodrgn-3.4.0"
//! gpus = [0, 1]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use cryodrgn_io::drgn::Launcher;
use cryodrgn_io::writer::WriterConfig;

/// Root configuration structure for cryodrgn-io.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// STAR writer settings.
    #[serde(default)]
    pub writer: WriterConfig,

    /// Binary materialization overrides.
    #[serde(default)]
    pub materialize: MaterializeConfig,

    /// cryoDRGN launcher settings.
    #[serde(default)]
    pub launcher: Launcher,
}

/// Overrides applied to the writer's materialization settings.
#[derive(Debug, Default, Deserialize)]
pub struct MaterializeConfig {
    /// Target binary extension.
    pub extension: Option<String>,

    /// Convert even when a link would do.
    pub force: Option<bool>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Load from `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Writer settings with the `[materialize]` overrides applied.
    pub fn writer_config(&self) -> WriterConfig {
        let mut writer = self.writer.clone();
        if let Some(ext) = &self.materialize.extension {
            writer.extensions.retain(|e| e != ext);
            writer.extensions.insert(0, ext.clone());
        }
        if let Some(force) = self.materialize.force {
            writer.force_convert = force;
        }
        writer
    }
}
