//! # Particle Data Model
//!
//! In-memory representation of a cryo-EM particle set as handed over by the
//! workflow engine: one record per extracted 2D image, with optional CTF,
//! alignment and picking coordinate. Records are read-only to the writer.
//!
//! All types deserialize from JSON so a particle list exported by an upstream
//! step can be fed to the `write-star` command directly.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Raw index value meaning "this image is a whole file, not a stack frame".
///
/// Real stack indices are 1-based, so `0` never collides with one.
pub const NO_INDEX: u32 = 0;

/// Location of one image: an optional 1-based frame index inside a stack file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageLocation {
    /// Frame index inside the stack (`None` for single-image files)
    #[serde(default)]
    pub index: Option<u32>,
    /// Path of the binary file
    pub path: PathBuf,
}

impl ImageLocation {
    /// Location of a frame inside a stack
    pub fn new(index: u32, path: impl Into<PathBuf>) -> Self {
        Self::from_raw(index, path)
    }

    /// Location of a whole file
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            index: None,
            path: path.into(),
        }
    }

    /// Build a location from a raw index where [`NO_INDEX`] means "no frame"
    pub fn from_raw(index: u32, path: impl Into<PathBuf>) -> Self {
        Self {
            index: (index != NO_INDEX).then_some(index),
            path: path.into(),
        }
    }

    /// Raw index, [`NO_INDEX`] when the location is a whole file
    pub fn raw_index(&self) -> u32 {
        self.index.unwrap_or(NO_INDEX)
    }

    /// Render as a Relion image name: `000012@path/stack.mrcs` or `path/image.mrc`
    pub fn to_star(&self) -> String {
        to_star_name(self.index, &self.path)
    }

    /// Parse a Relion image name back into a location
    pub fn parse_star(name: &str) -> Self {
        if let Some((index, path)) = name.split_once('@') {
            if let Ok(index) = index.trim().parse::<u32>() {
                return Self::from_raw(index, path);
            }
        }
        Self::file(name)
    }
}

/// Format an optional index and a path the way Relion expects
pub fn to_star_name(index: Option<u32>, path: &Path) -> String {
    match index {
        Some(index) if index != NO_INDEX => format!("{:06}@{}", index, path.display()),
        _ => path.display().to_string(),
    }
}

impl fmt::Display for ImageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_star())
    }
}

/// Contrast transfer function estimate of the micrograph a particle came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtfModel {
    /// Defocus along the major axis (Å)
    pub defocus_u: f64,
    /// Defocus along the minor axis (Å)
    pub defocus_v: f64,
    /// Astigmatism angle (degrees)
    pub defocus_angle: f64,
    /// Phase shift from a phase plate (degrees)
    #[serde(default)]
    pub phase_shift: Option<f64>,
    /// Fit quality score reported by the estimation program
    #[serde(default)]
    pub fit_quality: Option<f64>,
    /// Maximum resolution of the fit (Å)
    #[serde(default)]
    pub resolution: Option<f64>,
    /// Diagnostic power spectrum image
    #[serde(default)]
    pub psd_file: Option<String>,
}

impl CtfModel {
    /// CTF with the three defocus parameters only
    pub fn new(defocus_u: f64, defocus_v: f64, defocus_angle: f64) -> Self {
        Self {
            defocus_u,
            defocus_v,
            defocus_angle,
            phase_shift: None,
            fit_quality: None,
            resolution: None,
            psd_file: None,
        }
    }
}

/// Homogeneous 4x4 transform, stored row-major
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Row-major matrix
    pub matrix: [[f64; 4]; 4],
}

impl Transform {
    /// The identity transform
    pub fn identity() -> Self {
        let mut matrix = [[0.0; 4]; 4];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self { matrix }
    }

    /// Transform from a row-major matrix
    pub fn from_rows(matrix: [[f64; 4]; 4]) -> Self {
        Self { matrix }
    }

    /// Pure translation in pixels
    pub fn from_shifts(x: f64, y: f64, z: f64) -> Self {
        let mut t = Self::identity();
        t.matrix[0][3] = x;
        t.matrix[1][3] = y;
        t.matrix[2][3] = z;
        t
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Picking coordinate of a particle inside its micrograph
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    /// X position (px)
    pub x: i64,
    /// Y position (px)
    pub y: i64,
    /// Name of the parent micrograph
    #[serde(default)]
    pub mic_name: Option<String>,
    /// Id of the parent micrograph, used when the name is unknown
    #[serde(default)]
    pub mic_id: Option<u64>,
    /// 2D class assigned during picking
    #[serde(default)]
    pub class_number: Option<i64>,
    /// Autopicking score
    #[serde(default)]
    pub autopick_fom: Option<f64>,
    /// In-plane angle estimated by the picker (degrees)
    #[serde(default)]
    pub angle_psi: Option<f64>,
}

impl Coordinate {
    /// Coordinate with only a position
    pub fn new(x: i64, y: i64) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }
}

/// Acquisition settings shared by all images of an optics group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acquisition {
    /// Optics group name, `DefaultOpticsGroup` when absent
    #[serde(default)]
    pub optics_group_name: Option<String>,
    /// Acceleration voltage (kV)
    pub voltage: f64,
    /// Spherical aberration (mm)
    pub spherical_aberration: f64,
    /// Amplitude contrast fraction
    pub amplitude_contrast: f64,
    /// Beam tilt along X (mrad)
    #[serde(default)]
    pub beam_tilt_x: Option<f64>,
    /// Beam tilt along Y (mrad)
    #[serde(default)]
    pub beam_tilt_y: Option<f64>,
    /// Detector MTF file
    #[serde(default)]
    pub mtf_file: Option<String>,
}

impl Default for Acquisition {
    fn default() -> Self {
        Self {
            optics_group_name: None,
            voltage: 300.0,
            spherical_aberration: 2.7,
            amplitude_contrast: 0.1,
            beam_tilt_x: None,
            beam_tilt_y: None,
            mtf_file: None,
        }
    }
}

/// Value of an extra label copied verbatim to the STAR file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelValue {
    /// Integer label
    Int(i64),
    /// Floating-point label
    Float(f64),
    /// Text label
    Text(String),
}

/// One extracted particle image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Object id in the source set
    pub id: u64,
    /// Where the pixels live
    pub location: ImageLocation,
    /// Pixel size (Å/px)
    pub sampling_rate: f64,
    /// Box size (px)
    pub box_size: u32,
    /// Acquisition settings
    #[serde(default)]
    pub acquisition: Acquisition,
    /// CTF estimate
    #[serde(default)]
    pub ctf: Option<CtfModel>,
    /// 2D or projection alignment
    #[serde(default)]
    pub transform: Option<Transform>,
    /// Picking coordinate
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
    /// Half-set assignment from a previous refinement
    #[serde(default)]
    pub random_subset: Option<i64>,
    /// Additional labels, keyed by their Relion name
    #[serde(default)]
    pub labels: BTreeMap<String, LabelValue>,
}

impl Particle {
    /// Particle with only location and geometry set
    pub fn new(id: u64, location: ImageLocation, sampling_rate: f64, box_size: u32) -> Self {
        Self {
            id,
            location,
            sampling_rate,
            box_size,
            acquisition: Acquisition::default(),
            ctf: None,
            transform: None,
            coordinate: None,
            random_subset: None,
            labels: BTreeMap::new(),
        }
    }

    /// Set the CTF
    pub fn with_ctf(mut self, ctf: CtfModel) -> Self {
        self.ctf = Some(ctf);
        self
    }

    /// Set the alignment transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Set the picking coordinate
    pub fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    /// Set the acquisition settings
    pub fn with_acquisition(mut self, acquisition: Acquisition) -> Self {
        self.acquisition = acquisition;
        self
    }

    /// Whether the particle carries a CTF estimate
    pub fn has_ctf(&self) -> bool {
        self.ctf.is_some()
    }
}

/// Kind of alignment stored in the particle transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlignType {
    /// No alignment
    #[default]
    #[serde(rename = "none")]
    None,
    /// In-plane 2D alignment
    #[serde(rename = "2D")]
    TwoD,
    /// Projection alignment against a 3D reference
    #[serde(rename = "projection")]
    Projection,
    /// Full 3D rigid-body alignment (subtomograms)
    #[serde(rename = "3D")]
    ThreeD,
}

impl FromStr for AlignType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "2d" => Ok(Self::TwoD),
            "projection" | "proj" => Ok(Self::Projection),
            "3d" => Ok(Self::ThreeD),
            other => Err(format!("Invalid value for alignType: {}", other)),
        }
    }
}

impl fmt::Display for AlignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::TwoD => "2D",
            Self::Projection => "projection",
            Self::ThreeD => "3D",
        };
        f.write_str(s)
    }
}

/// Ordered particle collection plus the alignment kind of the set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticleSet {
    /// Alignment stored in the transforms
    #[serde(default)]
    pub alignment: AlignType,
    /// Particles in set order
    pub particles: Vec<Particle>,
}

impl ParticleSet {
    /// Set from particles and an alignment kind
    pub fn new(alignment: AlignType, particles: Vec<Particle>) -> Self {
        Self {
            alignment,
            particles,
        }
    }

    /// Number of particles
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// First particle, which fixes the per-run constants
    pub fn first(&self) -> Option<&Particle> {
        self.particles.first()
    }

    /// Distinct binary files referenced by the set, in first-seen order
    pub fn stack_files(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.particles
            .iter()
            .map(|p| &p.location.path)
            .filter(|path| seen.insert(*path))
            .cloned()
            .collect()
    }

    /// Iterate the particles
    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }
}

impl<'a> IntoIterator for &'a ParticleSet {
    type Item = &'a Particle;
    type IntoIter = std::slice::Iter<'a, Particle>;

    fn into_iter(self) -> Self::IntoIter {
        self.particles.iter()
    }
}
