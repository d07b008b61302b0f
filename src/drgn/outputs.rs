//! Files produced by cryoDRGN training, analysis and back-projection.

use std::fs;
use std::path::{Path, PathBuf};

use super::error::DrgnError;
use super::version::DrgnVersion;

/// Volumes written by `analyze` when the latent space is one-dimensional
pub const SINGLE_LATENT_VOLUMES: u32 = 10;

/// Layout of a training output directory
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOutput {
    /// Directory passed as `-o` to training
    pub dir: PathBuf,
    /// Latent dimension of the model
    pub zdim: u32,
    /// Release that produced the directory
    pub version: DrgnVersion,
}

impl TrainingOutput {
    /// Describe `dir`
    pub fn new(dir: impl Into<PathBuf>, zdim: u32, version: DrgnVersion) -> Self {
        Self {
            dir: dir.into(),
            zdim,
            version,
        }
    }

    /// `z.<epoch>.pkl`
    pub fn z_file(&self, epoch: u32) -> PathBuf {
        self.dir.join(format!("z.{}.pkl", epoch))
    }

    /// `weights.<epoch>.pkl`
    pub fn weights_file(&self, epoch: u32) -> PathBuf {
        self.dir.join(format!("weights.{}.pkl", epoch))
    }

    /// Model config, `config.pkl` or `config.yaml` by release
    pub fn config_file(&self) -> PathBuf {
        self.dir.join(self.version.config_file_name())
    }

    /// `analyze.<epoch>/`
    pub fn analyze_dir(&self, epoch: u32) -> PathBuf {
        self.dir.join(format!("analyze.{}", epoch))
    }

    /// `landscape.<epoch>/`
    pub fn landscape_dir(&self, epoch: u32) -> PathBuf {
        self.dir.join(format!("landscape.{}", epoch))
    }

    fn is_multi_latent(&self) -> bool {
        self.zdim > 1
    }

    fn sample_dir(&self, epoch: u32, ksamples: u32) -> PathBuf {
        let dir = self.analyze_dir(epoch);
        if self.is_multi_latent() {
            dir.join(format!("kmeans{}", ksamples))
        } else {
            dir
        }
    }

    /// Volume `id` of the analysis (`vol_000.mrc`, under `kmeans<K>/` when zdim > 1)
    pub fn volume_file(&self, epoch: u32, ksamples: u32, id: u32) -> PathBuf {
        self.sample_dir(epoch, ksamples).join(format!("vol_{:03}.mrc", id))
    }

    /// Latent values of the sampled volumes
    pub fn z_values_file(&self, epoch: u32, ksamples: u32) -> PathBuf {
        self.sample_dir(epoch, ksamples).join("z_values.txt")
    }

    /// Particle indices closest to the k-means centers
    pub fn kmeans_centers_file(&self, epoch: u32, ksamples: u32) -> PathBuf {
        self.analyze_dir(epoch)
            .join(format!("kmeans{}", ksamples))
            .join("centers_ind.txt")
    }

    /// `graph_traversal/` inside the analysis directory
    pub fn graph_dir(&self, epoch: u32) -> PathBuf {
        self.analyze_dir(epoch).join("graph_traversal")
    }

    /// Particle indices along the traversal
    pub fn graph_path_file(&self, epoch: u32) -> PathBuf {
        self.graph_dir(epoch).join("path.txt")
    }

    /// Latent values along the traversal
    pub fn graph_z_file(&self, epoch: u32) -> PathBuf {
        self.graph_dir(epoch).join("z.path.txt")
    }

    /// Highest epoch with a `z.<n>.pkl`, compared numerically
    pub fn last_epoch(&self) -> Result<Option<u32>, DrgnError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut last = None;
        for entry in entries {
            let name = entry?.file_name();
            let epoch = name
                .to_str()
                .and_then(|n| n.strip_prefix("z."))
                .and_then(|n| n.strip_suffix(".pkl"))
                .and_then(|n| n.parse::<u32>().ok());
            if let Some(epoch) = epoch {
                last = last.max(Some(epoch));
            }
        }
        Ok(last)
    }

    /// Volumes of one analysis, all of which must exist
    ///
    /// Ten volumes for a one-dimensional latent space, `ksamples` otherwise.
    pub fn volumes(&self, epoch: u32, ksamples: u32) -> Result<Vec<PathBuf>, DrgnError> {
        let count = if self.is_multi_latent() {
            ksamples
        } else {
            SINGLE_LATENT_VOLUMES
        };

        (0..count)
            .map(|id| {
                let path = self.volume_file(epoch, ksamples, id);
                if path.exists() {
                    Ok(path)
                } else {
                    Err(DrgnError::ArtifactNotFound { path })
                }
            })
            .collect()
    }
}

fn parse_floats(path: &Path, line_no: usize, line: &str) -> Result<Vec<f64>, DrgnError> {
    line.split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| DrgnError::InvalidArtifact {
                path: path.to_path_buf(),
                line: line_no,
                message: format!("'{}' is not a number", token),
            })
        })
        .collect()
}

/// Whitespace-separated float rows, e.g. `z_values.txt`
pub fn read_z_values<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<f64>>, DrgnError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DrgnError::ArtifactNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    let mut rows = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        rows.push(parse_floats(path, i + 1, line)?);
    }
    Ok(rows)
}

/// Integer per line, e.g. anchor or k-means center indices
pub fn read_indices<P: AsRef<Path>>(path: P) -> Result<Vec<usize>, DrgnError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let mut indices = Vec::new();
    for (i, line) in content.lines().enumerate() {
        for token in line.split_whitespace() {
            let index = token.parse::<usize>().map_err(|_| DrgnError::InvalidArtifact {
                path: path.to_path_buf(),
                line: i + 1,
                message: format!("'{}' is not an index", token),
            })?;
            indices.push(index);
        }
    }
    Ok(indices)
}

/// One curve of a back-projection FSC file
#[derive(Debug, Clone, PartialEq)]
pub struct FscCurve {
    /// Column name from the header
    pub name: String,
    /// Spatial frequency (1/Å)
    pub resolution: Vec<f64>,
    /// Correlation per frequency
    pub values: Vec<f64>,
}

/// Parse an FSC table written by `backproject_voxel`
///
/// The first line names the columns. The first column is in pixel units and
/// is divided by `pixel_size`; each further column becomes one curve.
pub fn read_fsc<P: AsRef<Path>>(path: P, pixel_size: f64) -> Result<Vec<FscCurve>, DrgnError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DrgnError::ArtifactNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    let mut lines = content.lines().enumerate();
    let header: Vec<&str> = lines
        .next()
        .map(|(_, l)| l.split_whitespace().collect())
        .unwrap_or_default();

    let mut rows = Vec::new();
    for (i, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let row = parse_floats(path, i + 1, line)?;
        if row.len() < 2 || rows.first().is_some_and(|r: &Vec<f64>| r.len() != row.len()) {
            return Err(DrgnError::InvalidArtifact {
                path: path.to_path_buf(),
                line: i + 1,
                message: format!("unexpected column count {}", row.len()),
            });
        }
        rows.push(row);
    }

    let Some(width) = rows.first().map(Vec::len) else {
        return Ok(Vec::new());
    };
    let resolution: Vec<f64> = rows.iter().map(|r| r[0] / pixel_size).collect();

    Ok((1..width)
        .map(|col| FscCurve {
            name: header
                .get(col)
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("fsc{}", col)),
            resolution: resolution.clone(),
            values: rows.iter().map(|r| r[col]).collect(),
        })
        .collect())
}
